//! Check-log audit entries.

use serde::{Deserialize, Serialize};

/// Number of symbols recorded per entry.
pub const SENT_SYMBOLS_CAP: usize = 20;

/// One alert-evaluation audit record.
///
/// The store keeps these in a bounded newest-first ring; system-level
/// conditions (no target, no alerts, snapshot failure, skipped tick) are
/// recorded under the name "System".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckLogEntry {
    /// When the check started, ms since epoch.
    pub time_ms: i64,
    pub alert_name: String,
    /// Symbols that survived the universe filter (pre-cooldown).
    pub checked_coins: usize,
    /// Symbols that satisfied the trigger condition.
    pub matched_coins: usize,
    /// First 20 symbols actually notified this run.
    pub sent_symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckLogEntry {
    /// Entry for one evaluated alert.
    pub fn for_alert(
        time_ms: i64,
        alert_name: impl Into<String>,
        checked_coins: usize,
        matched_coins: usize,
        sent_symbols: &[String],
    ) -> Self {
        Self {
            time_ms,
            alert_name: alert_name.into(),
            checked_coins,
            matched_coins,
            sent_symbols: sent_symbols.iter().take(SENT_SYMBOLS_CAP).cloned().collect(),
            error: None,
        }
    }

    /// System-level entry carrying an error message.
    pub fn system(time_ms: i64, error: impl Into<String>) -> Self {
        Self {
            time_ms,
            alert_name: "System".to_string(),
            checked_coins: 0,
            matched_coins: 0,
            sent_symbols: Vec::new(),
            error: Some(error.into()),
        }
    }
}
