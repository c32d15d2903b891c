/// Unit tests for core vulnpair models
/// Tests parsing, display and serialization of the shared types
use vulnpair::models::{Action, Category, Resource, Role, Sensitivity, Subject, VariantKind};
use vulnpair::Error;

#[test]
fn test_role_round_trip_through_text() {
    assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("user".parse::<Role>().unwrap(), Role::User);
    assert_eq!(Role::Admin.to_string().parse::<Role>().unwrap(), Role::Admin);
    assert!(matches!("root".parse::<Role>(), Err(Error::InvalidInput(_))));
}

#[test]
fn test_action_accepts_snake_and_kebab() {
    assert_eq!("role_change".parse::<Action>().unwrap(), Action::RoleChange);
    assert_eq!("system-log-read".parse::<Action>().unwrap(), Action::SystemLogRead);
    assert_eq!(Action::RoleChange.to_string(), "role_change");
    assert!("launch".parse::<Action>().is_err());
}

#[test]
fn test_restricted_action_set() {
    assert!(Action::RoleChange.is_restricted());
    assert!(Action::SystemLogRead.is_restricted());
    assert!(!Action::View.is_restricted());
    assert!(!Action::Update.is_restricted());
    assert!(!Action::Delete.is_restricted());
}

#[test]
fn test_category_parsing_and_listing() {
    assert_eq!("idor".parse::<Category>().unwrap(), Category::AccessControl);
    assert_eq!("SSRF".parse::<Category>().unwrap(), Category::Ssrf);
    assert_eq!(Category::ALL.len(), 6);
    for category in Category::ALL {
        assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
    }
}

#[test]
fn test_variant_kind_aliases() {
    assert_eq!("vulnerable".parse::<VariantKind>().unwrap(), VariantKind::Unsafe);
    assert_eq!("hardened".parse::<VariantKind>().unwrap(), VariantKind::Safe);
}

#[test]
fn test_subject_defaults_to_valid_session() {
    let subject = Subject::new(5, Role::User);
    assert!(subject.session_valid);
    assert!(!subject.with_invalid_session().session_valid);
}

#[test]
fn test_resource_serialization() {
    let resource = Resource::new("order:1001", 2, Sensitivity::Private);
    let json = serde_json::to_string(&resource).unwrap();
    let back: Resource = serde_json::from_str(&json).unwrap();
    assert_eq!(back, resource);
}
