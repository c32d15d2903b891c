// Access decision engine
// Decides whether a subject may act on a resource (the IDOR defense)

use super::audit::AuditEntry;
use crate::error::{Error, Result};
use crate::models::{Action, Resource, Role, Sensitivity, Subject};
use chrono::{DateTime, Utc};

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    OwnershipMismatch,
    InsufficientPrivilege,
}

/// Outcome of one decision.
///
/// `Allow` carries an audit entry exactly when access was granted through the
/// admin override. Same-owner access never produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow { audit: Option<AuditEntry> },
    Deny { reason: DenyReason },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow { .. })
    }

    pub fn audit(&self) -> Option<&AuditEntry> {
        match self {
            AccessDecision::Allow { audit } => audit.as_ref(),
            AccessDecision::Deny { .. } => None,
        }
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            AccessDecision::Allow { .. } => None,
            AccessDecision::Deny { reason } => Some(*reason),
        }
    }

    /// Map a denial onto the error taxonomy.
    pub fn into_result(
        self,
        subject: &Subject,
        resource: &Resource,
        action: Action,
    ) -> Result<Option<AuditEntry>> {
        match self {
            AccessDecision::Allow { audit } => Ok(audit),
            AccessDecision::Deny { reason } => Err(match reason {
                DenyReason::Unauthenticated => Error::Unauthenticated,
                DenyReason::OwnershipMismatch => Error::OwnershipMismatch {
                    subject: subject.id,
                    owner: resource.owner_id,
                },
                DenyReason::InsufficientPrivilege => Error::InsufficientPrivilege { action },
            }),
        }
    }
}

/// Stateless decision engine. Holds no data; every call is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessDecisionEngine;

impl AccessDecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide, stamping any audit entry with the current time.
    pub fn decide(&self, subject: &Subject, resource: &Resource, action: Action) -> AccessDecision {
        self.decide_at(subject, resource, action, Utc::now())
    }

    /// The decision itself. Order matters:
    /// 1. an invalid session is denied before anything else
    /// 2. owners always pass, without audit, whatever the sensitivity
    /// 3. admins pass with an audit entry, except restricted actions on
    ///    restricted resources, which need a separate approval flow
    /// 4. everyone else is denied
    pub fn decide_at(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: Action,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        if !subject.session_valid {
            return AccessDecision::Deny {
                reason: DenyReason::Unauthenticated,
            };
        }

        if subject.id == resource.owner_id {
            return AccessDecision::Allow { audit: None };
        }

        if subject.role == Role::Admin {
            if action.is_restricted() && resource.sensitivity == Sensitivity::Restricted {
                return AccessDecision::Deny {
                    reason: DenyReason::InsufficientPrivilege,
                };
            }
            return AccessDecision::Allow {
                audit: Some(AuditEntry::new(subject.id, resource.id.clone(), action, now)),
            };
        }

        AccessDecision::Deny {
            reason: DenyReason::OwnershipMismatch,
        }
    }

    /// Decide and convert to a `Result`, for callers that only need the error.
    pub fn authorize(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: Action,
    ) -> Result<Option<AuditEntry>> {
        self.decide(subject, resource, action)
            .into_result(subject, resource, action)
    }
}

/// Shorthand for `AccessDecisionEngine::new().decide(..)`
pub fn decide(subject: &Subject, resource: &Resource, action: Action) -> AccessDecision {
    AccessDecisionEngine::new().decide(subject, resource, action)
}
