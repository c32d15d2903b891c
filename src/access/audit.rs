// Audit trail for privileged ownership crossings

use crate::error::Result;
use crate::models::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One admin action on a resource the admin does not own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub acting_subject: u64,
    pub target_resource: String,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        acting_subject: u64,
        target_resource: impl Into<String>,
        action: Action,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            acting_subject,
            target_resource: target_resource.into(),
            action,
            timestamp,
        }
    }

    /// Single-line form used in scenario side-effect descriptions
    pub fn summary(&self) -> String {
        format!(
            "audit: admin {} performed {} on {} at {}",
            self.acting_subject,
            self.action,
            self.target_resource,
            self.timestamp.to_rfc3339()
        )
    }
}

/// Append-only audit log. Entries are never edited or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: AuditEntry) {
        debug!(
            subject = entry.acting_subject,
            resource = %entry.target_resource,
            action = %entry.action,
            "audit entry appended"
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries made by one subject, oldest first
    pub fn entries_for_subject(&self, subject: u64) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.acting_subject == subject)
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_append_only_and_filterable() {
        let now = Utc::now();
        let mut log = AuditLog::new();
        assert!(log.is_empty());

        log.record(AuditEntry::new(1, "user:2", Action::View, now));
        log.record(AuditEntry::new(7, "order:1001", Action::Update, now));
        log.record(AuditEntry::new(1, "user:3", Action::Delete, now));

        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].target_resource, "user:2");

        let admin_one = log.entries_for_subject(1);
        assert_eq!(admin_one.len(), 2);
        assert_eq!(admin_one[1].action, Action::Delete);
    }

    #[test]
    fn log_serializes_entries() {
        let mut log = AuditLog::new();
        log.record(AuditEntry::new(1, "user:2", Action::View, Utc::now()));
        let json = log.to_json().unwrap();
        assert!(json.contains("\"target_resource\": \"user:2\""));
        assert!(json.contains("\"action\": \"view\""));
    }

    #[test]
    fn summary_names_subject_action_and_target() {
        let entry = AuditEntry::new(1, "user:2", Action::RoleChange, Utc::now());
        let line = entry.summary();
        assert!(line.starts_with("audit: admin 1 performed role_change on user:2"));
    }
}
