// Verdict engine for vulnpair
// Decides whether one variant's result reproduces the flaw, blocks it, or is unclear

use crate::error::{Error, Result};
use crate::hashing::{Algorithm, HashResult, BCRYPT_MAX_INPUT};
use crate::models::Category;
use crate::scenario::ssrf::check_outbound_url;
use crate::scenario::Outcome;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Vulnerable,
    Secure,
    Uncertain,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Vulnerable => write!(f, "VULNERABLE"),
            Verdict::Secure => write!(f, "SECURE"),
            Verdict::Uncertain => write!(f, "UNCERTAIN"),
        }
    }
}

/// Decide a verdict from a variant's result.
///
/// 1. An access denial or a rejected input = SECURE
/// 2. AccessControl data owned by someone other than the attacker = VULNERABLE
/// 3. AccessControl data owned only by the attacker = SECURE
/// 4. Injection output echoing dangerous input verbatim = VULNERABLE
/// 5. Crypto digest computed below the algorithm's work-factor floor, or a
///    bcrypt digest over more than 72 bytes = VULNERABLE
/// 6. SSRF fetch accepted for a target the egress checks refuse = VULNERABLE
/// 7. Anything else = UNCERTAIN
pub fn decide_verdict(
    category: Category,
    input: &str,
    result: &Result<Outcome>,
    attacker_id: Option<&str>,
    victim_id: Option<&str>,
) -> Verdict {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_access_denial() => return Verdict::Secure,
        Err(Error::InvalidInput(_)) | Err(Error::InputTooLong { .. }) => return Verdict::Secure,
        Err(_) => return Verdict::Uncertain,
    };

    match category {
        Category::AccessControl => match (attacker_id, victim_id) {
            (Some(attacker), Some(victim)) => {
                analyze_response_ownership(&outcome.output, attacker, victim)
            }
            _ => Verdict::Uncertain,
        },
        Category::Injection => {
            if is_dangerous(input) && outcome.output.contains(input) {
                Verdict::Vulnerable
            } else {
                Verdict::Secure
            }
        }
        Category::Crypto => analyze_hash_output(&outcome.output),
        Category::Ssrf => match check_outbound_url(input.trim()) {
            Ok(_) => Verdict::Secure,
            Err(_) => Verdict::Vulnerable,
        },
        _ => Verdict::Uncertain,
    }
}

/// A hash record is weak when its work factor is under the floor or when bcrypt
/// was fed more bytes than it reads.
fn analyze_hash_output(output: &str) -> Verdict {
    let value: Value = match serde_json::from_str(output) {
        Ok(v) => v,
        Err(_) => return Verdict::Uncertain,
    };
    let hashed_bytes = value.get("hashed_bytes").and_then(Value::as_u64);
    let record: HashResult = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(_) => return Verdict::Uncertain,
    };

    let truncated = record.algorithm == Algorithm::Bcrypt
        && hashed_bytes.is_some_and(|n| n > BCRYPT_MAX_INPUT as u64);
    if record.work_factor < record.algorithm.safe_floor() || truncated {
        Verdict::Vulnerable
    } else {
        Verdict::Secure
    }
}

/// Characters that change meaning in a shell, a path or markup
fn is_dangerous(input: &str) -> bool {
    input.contains("..")
        || input
            .chars()
            .any(|c| matches!(c, ';' | '|' | '&' | '$' | '`' | '<' | '>' | '(' | ')' | '\'' | '"' | '\n'))
}

/// Analyze an output to determine whose data it contains.
fn analyze_response_ownership(body: &str, attacker_id: &str, victim_id: &str) -> Verdict {
    let json: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return analyze_text_ownership(body, attacker_id, victim_id),
    };

    let mut owners = Vec::new();
    collect_identity_values(&json, &mut owners);

    if owners.iter().any(|o| o != attacker_id) {
        // Someone else's identity in an ownership field
        Verdict::Vulnerable
    } else if !owners.is_empty() {
        Verdict::Secure
    } else if is_error_response(&json) {
        Verdict::Secure
    } else {
        Verdict::Uncertain
    }
}

/// Collect values of identity-specific fields, strings and integers alike.
/// User-editable fields are skipped so free text cannot fake ownership.
fn collect_identity_values(value: &Value, owners: &mut Vec<String>) {
    const IDENTITY_FIELDS: &[&str] = &[
        "id", "userId", "user_id", "uid", "owner_id", "ownerId",
        "created_by", "createdBy", "author_id", "authorId", "account_id", "accountId",
    ];

    match value {
        Value::Object(obj) => {
            for field_name in IDENTITY_FIELDS {
                match obj.get(*field_name) {
                    Some(Value::String(s)) => owners.push(s.clone()),
                    Some(Value::Number(n)) => owners.push(n.to_string()),
                    _ => {}
                }
            }

            for (key, val) in obj {
                let is_editable_field = matches!(
                    key.as_str(),
                    "name" | "username" | "email" | "phone" | "bio" | "description" | "notes"
                        | "content" | "message" | "text" | "title"
                );
                if !is_editable_field && matches!(val, Value::Object(_) | Value::Array(_)) {
                    collect_identity_values(val, owners);
                }
            }
        }
        Value::Array(arr) => {
            for v in arr {
                collect_identity_values(v, owners);
            }
        }
        _ => {}
    }
}

fn is_error_response(value: &Value) -> bool {
    if let Value::Object(obj) = value {
        if let Some(success) = obj.get("success") {
            if success == &Value::Bool(false) {
                return true;
            }
        }
        if obj.contains_key("error") {
            return true;
        }
    }
    false
}

/// Fallback for plain-text outputs: whole-token id matches only
fn analyze_text_ownership(body: &str, attacker_id: &str, victim_id: &str) -> Verdict {
    let has_victim = contains_token(body, victim_id);
    let has_attacker = contains_token(body, attacker_id);

    if has_victim && victim_id != attacker_id {
        Verdict::Vulnerable
    } else if has_attacker {
        Verdict::Secure
    } else {
        Verdict::Uncertain
    }
}

fn contains_token(body: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    body.match_indices(token).any(|(start, _)| {
        let before = body[..start].chars().next_back();
        let after = body[start + token.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
