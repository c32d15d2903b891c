// Concurrent IDOR probe
// Replays an access-control scenario for every candidate identifier under both
// variants and classifies each result.

use crate::error::{Error, Result};
use crate::models::{Category, Subject, VariantKind};
use crate::mutator::candidate_ids;
use crate::scenario::{Invocation, Outcome, ScenarioRegistry};
use crate::verdict::{decide_verdict, Verdict};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Placeholder replaced by each candidate id when building the input
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Serialize)]
pub struct VariantFinding {
    pub verdict: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub candidate: String,
    pub input: String,
    #[serde(rename = "unsafe")]
    pub unsafe_result: VariantFinding,
    #[serde(rename = "safe")]
    pub safe_result: VariantFinding,
}

impl Finding {
    /// The hardened variant leaked something the attacker should not see.
    pub fn safe_variant_leaks(&self) -> bool {
        self.safe_result.verdict == Verdict::Vulnerable.to_string()
    }
}

/// Probe one AccessControl scenario as `subject` around `victim`.
///
/// `template` is the scenario input with `{id}` where the identifier goes,
/// e.g. `"{id}"` for a profile lookup or `"{id}:ADMIN"` for a role change.
pub async fn probe_idor(
    registry: Arc<ScenarioRegistry>,
    scenario_id: &str,
    subject: Subject,
    victim: &str,
    template: &str,
) -> Result<Vec<Finding>> {
    let scenario = registry.lookup(scenario_id)?;
    if scenario.category != Category::AccessControl {
        return Err(Error::InvalidInput(format!(
            "{} is a {} scenario, probing needs access-control",
            scenario_id, scenario.category
        )));
    }
    if !template.contains(ID_PLACEHOLDER) {
        return Err(Error::InvalidInput(format!(
            "input template must contain {}",
            ID_PLACEHOLDER
        )));
    }

    let candidates = candidate_ids(victim);
    debug!(scenario = scenario_id, candidates = candidates.len(), "starting IDOR probe");

    let subject = Arc::new(subject);
    let mut handles = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let registry = Arc::clone(&registry);
        let subject = Arc::clone(&subject);
        let scenario_id = scenario_id.to_string();
        let input = template.replace(ID_PLACEHOLDER, &candidate);
        handles.push(tokio::task::spawn_blocking(move || {
            probe_candidate(&registry, &scenario_id, &subject, candidate, input)
        }));
    }

    let mut findings = Vec::with_capacity(handles.len());
    for handle in handles {
        findings.push(handle.await??);
    }
    findings.sort_by(|a, b| a.candidate.cmp(&b.candidate));
    Ok(findings)
}

fn probe_candidate(
    registry: &ScenarioRegistry,
    scenario_id: &str,
    subject: &Subject,
    candidate: String,
    input: String,
) -> Result<Finding> {
    let invocation = Invocation::new(&input).with_session(subject);
    let attacker = subject.id.to_string();

    let classify = |kind: VariantKind| {
        let result = registry.invoke(scenario_id, kind, &invocation);
        let verdict = decide_verdict(
            Category::AccessControl,
            &input,
            &result,
            Some(attacker.as_str()),
            Some(candidate.as_str()),
        );
        VariantFinding {
            verdict: verdict.to_string(),
            detail: describe(&result),
        }
    };

    let unsafe_result = classify(VariantKind::Unsafe);
    let safe_result = classify(VariantKind::Safe);
    Ok(Finding {
        candidate,
        input,
        unsafe_result,
        safe_result,
    })
}

/// One-line description of a variant result for reports
pub fn describe(result: &Result<Outcome>) -> String {
    match result {
        Ok(outcome) => outcome.output.clone(),
        Err(e) => format!("ERROR: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashPolicy;
    use crate::models::Role;
    use crate::scenario::build_registry;

    fn registry() -> Arc<ScenarioRegistry> {
        Arc::new(build_registry(&HashPolicy::default()).unwrap())
    }

    #[tokio::test]
    async fn rejects_non_access_scenarios() {
        let err = probe_idor(registry(), "headers/cors", Subject::new(2, Role::User), "1", "{id}")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_scenario_is_not_found() {
        let err = probe_idor(registry(), "idor/nope", Subject::new(2, Role::User), "1", "{id}")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn template_needs_placeholder() {
        let err = probe_idor(registry(), "idor/user-profile", Subject::new(2, Role::User), "1", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
