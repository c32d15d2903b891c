// Access Control
//
// - engine: the pure decision function (subject, resource, action) -> decision
// - audit: entries emitted by admin ownership crossings and an append-only log

pub mod audit;
pub mod engine;

pub use audit::*;
pub use engine::*;
