// Error taxonomy for vulnpair

use crate::models::Action;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("input is {length} bytes, ceiling is {max}")]
    InputTooLong { length: usize, max: usize },

    #[error("unsupported algorithm configuration: {0}")]
    UnsupportedAlgorithm(String),

    #[error("session is not authenticated")]
    Unauthenticated,

    #[error("subject {subject} does not own a resource owned by {owner}")]
    OwnershipMismatch { subject: u64, owner: u64 },

    #[error("action {action} on a restricted resource needs elevated approval")]
    InsufficientPrivilege { action: Action },

    #[error("scenario not found: {0}")]
    NotFound(String),

    #[error("scenario already registered: {0}")]
    DuplicateScenario(String),

    #[error("input rejected: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// True for the three denials the access engine can produce.
    pub fn is_access_denial(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated | Error::OwnershipMismatch { .. } | Error::InsufficientPrivilege { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
