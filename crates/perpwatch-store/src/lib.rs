//! Alert rule store.
//!
//! In-memory source of truth for alert rules, settings and the bounded
//! check log, with a JSON snapshot for restarts and an optional JSON Lines
//! audit mirror of every check-log entry.

pub mod audit;
pub mod error;
pub mod memory;

pub use audit::CheckLogWriter;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
