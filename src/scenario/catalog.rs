// Built-in scenario catalog

use super::{access, crypto, deserialization, headers, injection, ssrf, ScenarioRegistry};
use crate::error::Result;
use crate::hashing::HashPolicy;
use lazy_static::lazy_static;

lazy_static! {
    // The catalog ids are fixed at compile time, so building it cannot collide.
    static ref DEFAULT_REGISTRY: ScenarioRegistry =
        build_registry(&HashPolicy::default()).expect("built-in scenario ids are unique");
}

/// Registry built from the default hash policy, populated on first use
pub fn default_registry() -> &'static ScenarioRegistry {
    &DEFAULT_REGISTRY
}

/// Build a registry holding every built-in scenario, hashing under `policy`.
pub fn build_registry(policy: &HashPolicy) -> Result<ScenarioRegistry> {
    policy.validate()?;

    let mut registry = ScenarioRegistry::new();
    let families = [
        injection::scenarios(),
        access::scenarios(),
        crypto::scenarios(policy),
        deserialization::scenarios(),
        headers::scenarios(),
        ssrf::scenarios(),
    ];
    for scenario in families.into_iter().flatten() {
        registry.register(scenario)?;
    }
    Ok(registry)
}
