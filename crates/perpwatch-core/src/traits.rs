//! Collaborator contracts injected into the engine.
//!
//! The engine never reaches into ambient global state: the market source,
//! the notification channel and the rule store are passed in at
//! construction and exercised only through these traits.

#![allow(async_fn_in_trait)]

use crate::alert::{AlertRule, AlertSettings};
use crate::candle::{Candle, Interval};
use crate::check_log::CheckLogEntry;
use crate::error::{DeliveryError, UpstreamError};
use crate::ticker::TickerSnapshot;
use std::collections::HashMap;
use uuid::Uuid;

/// Full-universe ticker snapshot source: one network round trip per pass.
pub trait TickerSource {
    async fn fetch_tickers(&self) -> Result<HashMap<String, TickerSnapshot>, UpstreamError>;
}

/// Per-symbol kline source.
///
/// Returned candles are chronological ascending. Retry and timeout policy
/// belong to the implementation; the evaluator treats any error as "symbol
/// did not trigger".
pub trait CandleSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, UpstreamError>;
}

/// Notification channel. One call per message batch; failures must be
/// returned, never panicked, so the dispatcher can continue with the rest.
pub trait Notifier {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}

impl<T: Notifier> Notifier for &T {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        (**self).send(text).await
    }
}

impl<T: Notifier> Notifier for std::sync::Arc<T> {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        (**self).send(text).await
    }
}

/// Alert-rule and settings store owned by an external collaborator.
///
/// The engine reads a snapshot of rules and settings at each pass start and
/// writes back only cooldown stamps and check-log entries.
pub trait AlertStore {
    /// Current rules, in creation order.
    fn alerts(&self) -> Vec<AlertRule>;

    /// Global settings, read-only for the engine.
    fn settings(&self) -> AlertSettings;

    /// Stamp every symbol in `symbols` as sent now and update
    /// `last_triggered`. Optimistic: called regardless of delivery outcome.
    fn mark_sent(&self, id: Uuid, symbols: &[String], now_ms: i64);

    /// Clear the cooldown map and `last_triggered` for one alert,
    /// re-arming all symbols immediately.
    fn reset_cooldown(&self, id: Uuid);

    /// Append to the bounded check log (newest first, oldest evicted).
    fn append_check_log(&self, entry: CheckLogEntry);
}

impl<T: AlertStore> AlertStore for std::sync::Arc<T> {
    fn alerts(&self) -> Vec<AlertRule> {
        (**self).alerts()
    }

    fn settings(&self) -> AlertSettings {
        (**self).settings()
    }

    fn mark_sent(&self, id: Uuid, symbols: &[String], now_ms: i64) {
        (**self).mark_sent(id, symbols, now_ms)
    }

    fn reset_cooldown(&self, id: Uuid) {
        (**self).reset_cooldown(id)
    }

    fn append_check_log(&self, entry: CheckLogEntry) {
        (**self).append_check_log(entry)
    }
}
