// Scenario registry
// Pure lookup table: populated at startup, never mutated afterwards, so shared
// references can be read from any number of threads without locking.

use super::{Invocation, Outcome, Scenario};
use crate::error::{Error, Result};
use crate::models::{Category, VariantKind};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<Scenario>,
    index: HashMap<String, usize>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scenario. Ids are unique; variant behaviour is not inspected.
    pub fn register(&mut self, scenario: Scenario) -> Result<()> {
        if self.index.contains_key(&scenario.id) {
            return Err(Error::DuplicateScenario(scenario.id));
        }
        debug!(id = %scenario.id, category = %scenario.category, "registered scenario");
        self.index.insert(scenario.id.clone(), self.scenarios.len());
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Result<&Scenario> {
        self.index
            .get(id)
            .map(|&i| &self.scenarios[i])
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Scenarios of one category, in registration order
    pub fn list_by_category(&self, category: Category) -> Vec<&Scenario> {
        self.scenarios
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }

    /// Resolve and run one variant
    pub fn invoke(&self, id: &str, kind: VariantKind, invocation: &Invocation<'_>) -> Result<Outcome> {
        self.lookup(id)?.invoke(kind, invocation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(id: &str, category: Category) -> Scenario {
        Scenario::new(
            id,
            category,
            "echo",
            |inv: &Invocation<'_>| Ok(Outcome::new(inv.raw, "unsafe echo")),
            |inv: &Invocation<'_>| Ok(Outcome::new(inv.raw.to_uppercase(), "safe echo")),
        )
    }

    #[test]
    fn lookup_unknown_id_is_not_found() {
        let registry = ScenarioRegistry::new();
        match registry.lookup("nope") {
            Err(Error::NotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut registry = ScenarioRegistry::new();
        registry.register(echo("a", Category::Header)).unwrap();
        let err = registry.register(echo("a", Category::Crypto)).unwrap_err();
        assert!(matches!(err, Error::DuplicateScenario(id) if id == "a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("a").unwrap().category, Category::Header);
    }

    #[test]
    fn list_by_category_keeps_registration_order() {
        let mut registry = ScenarioRegistry::new();
        registry.register(echo("h2", Category::Header)).unwrap();
        registry.register(echo("c1", Category::Crypto)).unwrap();
        registry.register(echo("h1", Category::Header)).unwrap();

        let headers: Vec<_> = registry
            .list_by_category(Category::Header)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(headers, vec!["h2", "h1"]);
        assert!(registry.list_by_category(Category::Ssrf).is_empty());
    }

    #[test]
    fn invoke_selects_variant() {
        let mut registry = ScenarioRegistry::new();
        registry.register(echo("e", Category::Injection)).unwrap();
        let inv = Invocation::new("hi");
        assert_eq!(registry.invoke("e", VariantKind::Unsafe, &inv).unwrap().output, "hi");
        assert_eq!(registry.invoke("e", VariantKind::Safe, &inv).unwrap().output, "HI");
        assert!(matches!(
            registry.invoke("missing", VariantKind::Safe, &inv),
            Err(Error::NotFound(_))
        ));
    }
}
