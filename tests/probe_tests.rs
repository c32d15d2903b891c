/// IDOR probe tests: both variants replayed over candidate identifiers
use std::sync::Arc;
use vulnpair::hashing::HashPolicy;
use vulnpair::models::{Role, Subject};
use vulnpair::probe::probe_idor;
use vulnpair::scenario::build_registry;
use vulnpair::verdict::Verdict;

fn registry() -> Arc<vulnpair::ScenarioRegistry> {
    Arc::new(build_registry(&HashPolicy::default()).unwrap())
}

fn verdict_for<'a>(findings: &'a [vulnpair::Finding], candidate: &str) -> &'a vulnpair::Finding {
    findings
        .iter()
        .find(|f| f.candidate == candidate)
        .unwrap_or_else(|| panic!("no finding for {}", candidate))
}

#[tokio::test]
async fn test_profile_probe_flags_only_the_unsafe_variant() {
    let findings = probe_idor(registry(), "idor/user-profile", Subject::new(2, Role::User), "1", "{id}")
        .await
        .unwrap();

    let candidates: Vec<&str> = findings.iter().map(|f| f.candidate.as_str()).collect();
    assert_eq!(candidates, vec!["0", "1", "2", "3"]);

    let admin_profile = verdict_for(&findings, "1");
    assert_eq!(admin_profile.unsafe_result.verdict, Verdict::Vulnerable.to_string());
    assert_eq!(admin_profile.safe_result.verdict, Verdict::Secure.to_string());
    assert!(admin_profile.safe_result.detail.starts_with("ERROR:"));

    let own_profile = verdict_for(&findings, "2");
    assert_eq!(own_profile.safe_result.verdict, Verdict::Secure.to_string());
    assert!(own_profile.safe_result.detail.contains("139****9000"));

    assert!(findings.iter().all(|f| !f.safe_variant_leaks()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_probe_with_template() {
    let findings = probe_idor(registry(), "idor/order-detail", Subject::new(2, Role::User), "1002", "{id}")
        .await
        .unwrap();

    assert_eq!(verdict_for(&findings, "1002").unsafe_result.verdict, "VULNERABLE");
    assert_eq!(verdict_for(&findings, "1003").unsafe_result.verdict, "VULNERABLE");
    // Order 1001 belongs to the attacker.
    assert_eq!(verdict_for(&findings, "1001").unsafe_result.verdict, "SECURE");
    assert!(findings.iter().all(|f| !f.safe_variant_leaks()));
}

#[tokio::test]
async fn test_role_change_probe() {
    let findings = probe_idor(
        registry(),
        "idor/update-role",
        Subject::new(2, Role::User),
        "3",
        "{id}:ADMIN",
    )
    .await
    .unwrap();

    let carol = verdict_for(&findings, "3");
    assert_eq!(carol.input, "3:ADMIN");
    assert_eq!(carol.unsafe_result.verdict, "VULNERABLE");
    assert_eq!(carol.safe_result.verdict, "SECURE");
}
