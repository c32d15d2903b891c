// Access-control (IDOR) scenarios
//
// The unsafe variants trust whatever identifier arrives in the input and never
// look at the session. The safe variants take the caller from the session,
// build the target Resource and ask the decision engine before touching data.

use super::{Invocation, Outcome, Scenario};
use crate::access::{AccessDecisionEngine, AuditEntry};
use crate::error::{Error, Result};
use crate::models::{Action, Category, Resource, Role, Sensitivity, Subject};
use chrono::NaiveDate;
use serde_json::json;

/// Owner id of system-held resources (role table, system logs)
pub const SYSTEM_OWNER_ID: u64 = 0;

struct UserRecord {
    id: u64,
    username: &'static str,
    email: &'static str,
    phone: &'static str,
}

/// Fields that must never leave the service unmasked
struct SensitiveRecord {
    user_id: u64,
    password: &'static str,
    id_card: &'static str,
    credit_card: &'static str,
    bank_account: &'static str,
    salary: u64,
    address: &'static str,
    security_answer: &'static str,
}

struct OrderRecord {
    id: &'static str,
    owner_id: u64,
    amount: u64,
}

const USERS: &[UserRecord] = &[
    UserRecord {
        id: 1,
        username: "admin",
        email: "admin@example.com",
        phone: "13800138000",
    },
    UserRecord {
        id: 2,
        username: "test",
        email: "test@example.com",
        phone: "13900139000",
    },
    UserRecord {
        id: 3,
        username: "carol",
        email: "carol@example.com",
        phone: "13700137000",
    },
];

const SENSITIVE: &[SensitiveRecord] = &[
    SensitiveRecord {
        user_id: 1,
        password: "admin123",
        id_card: "330106199001011234",
        credit_card: "6222021234567890123",
        bank_account: "6217001234567890123",
        salary: 50_000,
        address: "1 West Lake Road, Hangzhou",
        security_answer: "born 1990-01-01",
    },
    SensitiveRecord {
        user_id: 2,
        password: "test123",
        id_card: "110101199203035678",
        credit_card: "6222029876543210987",
        bank_account: "6217009876543210987",
        salary: 12_000,
        address: "8 Chang'an Avenue, Beijing",
        security_answer: "first pet: mochi",
    },
    SensitiveRecord {
        user_id: 3,
        password: "carol!2024",
        id_card: "440301198812127890",
        credit_card: "6222025555666677778",
        bank_account: "6217005555666677778",
        salary: 30_000,
        address: "3 Shennan Road, Shenzhen",
        security_answer: "mother's city: xiamen",
    },
];

const ORDERS: &[OrderRecord] = &[
    OrderRecord {
        id: "1001",
        owner_id: 2,
        amount: 100,
    },
    OrderRecord {
        id: "1002",
        owner_id: 1,
        amount: 250,
    },
    OrderRecord {
        id: "1003",
        owner_id: 3,
        amount: 75,
    },
];

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "idor/user-profile",
            Category::AccessControl,
            "View a user profile by id",
            unsafe_user_profile,
            safe_user_profile,
        )
        .with_sample_input("1"),
        Scenario::new(
            "idor/user-sensitive-info",
            Category::AccessControl,
            "Fetch a user's account record including personal data",
            unsafe_sensitive_info,
            safe_sensitive_info,
        )
        .with_sample_input("1"),
        Scenario::new(
            "idor/order-detail",
            Category::AccessControl,
            "View an order by order number",
            unsafe_order_detail,
            safe_order_detail,
        )
        .with_sample_input("1002"),
        Scenario::new(
            "idor/update-role",
            Category::AccessControl,
            "Change a user's role, input is <userId>:<ROLE>",
            unsafe_update_role,
            safe_update_role,
        )
        .with_sample_input("3:ADMIN"),
        Scenario::new(
            "idor/system-logs",
            Category::AccessControl,
            "Read system logs for a date",
            unsafe_system_logs,
            safe_system_logs,
        )
        .with_sample_input("2023-10-01"),
    ]
}

fn parse_user_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("'{}' is not a user id", raw)))
}

fn find_user(id: u64) -> Option<&'static UserRecord> {
    USERS.iter().find(|u| u.id == id)
}

fn find_order(id: &str) -> Option<&'static OrderRecord> {
    ORDERS.iter().find(|o| o.id == id)
}

fn session_subject<'a>(inv: &Invocation<'a>) -> Result<&'a Subject> {
    inv.session.ok_or(Error::Unauthenticated)
}

/// Authorize through the engine and describe any audit entry produced
fn authorize(subject: &Subject, resource: &Resource, action: Action) -> Result<String> {
    let audit = AccessDecisionEngine::new().authorize(subject, resource, action)?;
    Ok(describe_audit(audit.as_ref()))
}

fn describe_audit(audit: Option<&AuditEntry>) -> String {
    match audit {
        Some(entry) => entry.summary(),
        None => "owner access, no audit".to_string(),
    }
}

/// Keep the first three and last four digits
fn mask_phone(phone: &str) -> String {
    if phone.len() <= 7 {
        return "*".repeat(phone.len());
    }
    format!("{}****{}", &phone[..3], &phone[phone.len() - 4..])
}

/// Star out everything but `head` leading and `tail` trailing characters
fn mask_middle(value: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return "*".repeat(chars.len());
    }
    let mut masked: String = chars[..head].iter().collect();
    masked.push_str(&"*".repeat(chars.len() - head - tail));
    masked.extend(&chars[chars.len() - tail..]);
    masked
}

fn find_sensitive(id: u64) -> Option<&'static SensitiveRecord> {
    SENSITIVE.iter().find(|r| r.user_id == id)
}

fn not_found(what: &str) -> String {
    json!({ "error": format!("{} not found", what) }).to_string()
}

fn unsafe_user_profile(inv: &Invocation<'_>) -> Result<Outcome> {
    let id = parse_user_id(inv.raw)?;
    let output = match find_user(id) {
        Some(user) => json!({
            "userId": user.id,
            "username": user.username,
            "email": user.email,
            "phone": user.phone,
        })
        .to_string(),
        None => not_found("user"),
    };
    Ok(Outcome::new(
        output,
        format!("returned profile {} without checking who asked", id),
    ))
}

fn safe_user_profile(inv: &Invocation<'_>) -> Result<Outcome> {
    let subject = session_subject(inv)?;
    let id = parse_user_id(inv.raw)?;
    // A profile is owned by the user it describes.
    let resource = Resource::new(format!("user:{}", id), id, Sensitivity::Private);
    let side_effect = authorize(subject, &resource, Action::View)?;
    let output = match find_user(id) {
        Some(user) => json!({
            "userId": user.id,
            "username": user.username,
            "email": user.email,
            "phone": mask_phone(user.phone),
        })
        .to_string(),
        None => not_found("user"),
    };
    Ok(Outcome::new(output, side_effect))
}

fn unsafe_sensitive_info(inv: &Invocation<'_>) -> Result<Outcome> {
    let id = parse_user_id(inv.raw)?;
    let output = match (find_user(id), find_sensitive(id)) {
        (Some(user), Some(secret)) => json!({
            "userId": user.id,
            "username": user.username,
            "password": secret.password,
            "idCard": secret.id_card,
            "creditCard": secret.credit_card,
            "phoneNumber": user.phone,
            "email": user.email,
            "salary": secret.salary,
            "bankAccount": secret.bank_account,
            "address": secret.address,
            "securityAnswer": secret.security_answer,
        })
        .to_string(),
        _ => not_found("user"),
    };
    Ok(Outcome::new(
        output,
        format!("returned the full record of user {} with the plaintext password", id),
    ))
}

fn safe_sensitive_info(inv: &Invocation<'_>) -> Result<Outcome> {
    let subject = session_subject(inv)?;
    let id = parse_user_id(inv.raw)?;
    let resource = Resource::new(format!("user:{}", id), id, Sensitivity::Private);
    let side_effect = authorize(subject, &resource, Action::View)?;
    // Only what a profile page needs, masked; password and money fields stay home.
    let output = match (find_user(id), find_sensitive(id)) {
        (Some(user), Some(secret)) => json!({
            "userId": user.id,
            "username": user.username,
            "idCard": mask_middle(secret.id_card, 4, 4),
            "creditCard": mask_middle(secret.credit_card, 0, 4),
            "phoneNumber": mask_phone(user.phone),
        })
        .to_string(),
        _ => not_found("user"),
    };
    Ok(Outcome::new(output, side_effect))
}

fn unsafe_order_detail(inv: &Invocation<'_>) -> Result<Outcome> {
    let order_id = inv.raw.trim();
    let output = match find_order(order_id) {
        Some(order) => json!({
            "orderId": order.id,
            "userId": order.owner_id,
            "amount": order.amount,
        })
        .to_string(),
        None => not_found("order"),
    };
    Ok(Outcome::new(
        output,
        format!("queried order {} without an owner condition", order_id),
    ))
}

fn safe_order_detail(inv: &Invocation<'_>) -> Result<Outcome> {
    let subject = session_subject(inv)?;
    let order_id = inv.raw.trim();
    let order = find_order(order_id)
        .ok_or_else(|| Error::InvalidInput(format!("order '{}' not found", order_id)))?;
    let resource = Resource::new(format!("order:{}", order.id), order.owner_id, Sensitivity::Private);
    let side_effect = authorize(subject, &resource, Action::View)?;
    Ok(Outcome::new(
        json!({
            "orderId": order.id,
            "userId": order.owner_id,
            "amount": order.amount,
        })
        .to_string(),
        side_effect,
    ))
}

fn parse_role_change(raw: &str) -> Result<(u64, Role)> {
    let (user, role) = raw
        .split_once(':')
        .ok_or_else(|| Error::InvalidInput(format!("expected <userId>:<ROLE>, got '{}'", raw)))?;
    Ok((parse_user_id(user)?, role.trim().parse()?))
}

fn unsafe_update_role(inv: &Invocation<'_>) -> Result<Outcome> {
    let (user, role) = inv
        .raw
        .split_once(':')
        .ok_or_else(|| Error::InvalidInput(format!("expected <userId>:<ROLE>, got '{}'", inv.raw)))?;
    Ok(Outcome::new(
        format!("Updated role to {} for user: {}", role.trim(), user.trim()),
        "role written without checking the caller's privileges",
    ))
}

fn safe_update_role(inv: &Invocation<'_>) -> Result<Outcome> {
    let subject = session_subject(inv)?;
    let (user, role) = parse_role_change(inv.raw)?;
    // Role assignments belong to the system, never to the user being changed.
    let resource = Resource::new(format!("role:{}", user), SYSTEM_OWNER_ID, Sensitivity::Restricted);
    let side_effect = authorize(subject, &resource, Action::RoleChange)?;
    Ok(Outcome::new(
        format!("Updated role to {} for user: {}", role, user),
        side_effect,
    ))
}

fn unsafe_system_logs(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::new(
        format!("System logs for date: {}", inv.raw),
        "system logs returned to an unverified caller",
    ))
}

fn safe_system_logs(inv: &Invocation<'_>) -> Result<Outcome> {
    let subject = session_subject(inv)?;
    let date = NaiveDate::parse_from_str(inv.raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("'{}' is not a YYYY-MM-DD date", inv.raw)))?;
    let resource = Resource::new("system-logs", SYSTEM_OWNER_ID, Sensitivity::Restricted);
    let side_effect = authorize(subject, &resource, Action::SystemLogRead)?;
    Ok(Outcome::new(format!("System logs for date: {}", date), side_effect))
}
