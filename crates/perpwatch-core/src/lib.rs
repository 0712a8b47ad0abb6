//! Core domain types for the perpwatch alert bot.
//!
//! This crate provides the types shared across the system:
//! - `TickerSnapshot`: one symbol's ticker with derived 24h metrics
//! - `Candle`, `Interval`, `TimePeriod`: kline data and period mapping
//! - `AlertRule`, `AlertKind`: the five smart-alert kinds as a closed enum
//! - `CheckLogEntry`, `AlertSettings`: audit trail and global settings
//! - Collaborator traits (`TickerSource`, `CandleSource`, `Notifier`,
//!   `AlertStore`) injected into the engine

pub mod alert;
pub mod candle;
pub mod check_log;
pub mod error;
pub mod ticker;
pub mod traits;

pub use alert::{AlertKind, AlertRule, AlertSettings, TimePeriod};
pub use candle::{Candle, Interval};
pub use check_log::CheckLogEntry;
pub use error::{DeliveryError, UpstreamError};
pub use ticker::TickerSnapshot;
pub use traits::{AlertStore, CandleSource, Notifier, TickerSource};

/// Per-symbol re-notification cooldown: 24 hours.
pub const SYMBOL_COOLDOWN_MS: i64 = 24 * 60 * 60 * 1000;

/// Cap on symbols that get per-symbol kline lookups within one alert.
pub const MAX_KLINE_COINS_PER_ALERT: usize = 200;

/// Concurrent kline fetches within one alert evaluation.
pub const KLINE_CONCURRENCY: usize = 10;

/// Symbols per Telegram message batch.
pub const NOTIFY_BATCH_SIZE: usize = 100;

/// Check-log ring buffer capacity.
pub const CHECK_LOG_CAP: usize = 50;
