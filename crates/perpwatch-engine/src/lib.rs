//! Alert evaluation engine.
//!
//! One scheduler pass: fetch the ticker snapshot, then for each enabled
//! alert run the universe filter, the cooldown filter and the kind-specific
//! trigger test (candle-based kinds fan out through the bounded-concurrency
//! mapper), dispatch batched notifications, stamp cooldowns and append a
//! check-log entry. Every failure path ends in a check-log entry and a
//! quiet return to idle; nothing here panics or escalates.

pub mod cooldown;
pub mod dispatcher;
pub mod evaluator;
pub mod map_limit;
pub mod scheduler;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use evaluator::{AlertEvaluator, Evaluation};
pub use map_limit::map_limit;
pub use scheduler::AlertScheduler;
