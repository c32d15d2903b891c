pub mod error;
pub mod models;
pub mod config;
pub mod hashing;
pub mod access;
pub mod scenario;
pub mod verdict;
pub mod mutator;
pub mod probe;
pub mod race;
pub mod reporting;

// Re-export commonly used items
pub use error::{Error, Result};
pub use models::*;
pub use config::*;
pub use hashing::*;
pub use access::*;
pub use scenario::{build_registry, default_registry, Invocation, Outcome, Scenario, ScenarioRegistry};
pub use verdict::*;
pub use mutator::*;
pub use probe::*;
pub use race::*;
pub use reporting::*;
