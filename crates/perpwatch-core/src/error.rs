//! Error taxonomy shared across crates.
//!
//! `UpstreamError` covers the ticker/kline source, `DeliveryError` the
//! notification channel. Nothing in the engine escalates either past a
//! check-log entry; see the scheduler for the propagation policy.

use thiserror::Error;

/// Ticker or kline source failure.
///
/// Snapshot-level: aborts the whole pass. Candle-level: swallowed at the
/// per-symbol check and the symbol is treated as non-triggering.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error {ret_code}: {ret_msg}")]
    Envelope { ret_code: i64, ret_msg: String },

    #[error("Malformed response body: {0}")]
    Malformed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// Notification channel failure for one batch.
///
/// Logged by the dispatcher; never rolls back cooldown marking and never
/// stops remaining batches.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Telegram API error {status}: {body}")]
    Api { status: u16, body: String },
}
