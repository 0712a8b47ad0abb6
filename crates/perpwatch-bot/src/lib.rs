//! Perpetual futures smart-alert bot.
//!
//! Main application that wires the components together:
//! - REST market data client (tickers and klines)
//! - Alert rule store with snapshot persistence and audit log
//! - Telegram notification channel
//! - Periodic check scheduler

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
