//! Per-symbol cooldown filtering.

use perpwatch_core::{AlertRule, TickerSnapshot};

/// Drop coins still inside the rule's 24h cooldown window, keeping order.
///
/// A symbol marked exactly 24h ago is eligible again.
pub fn filter_armed<'a>(
    rule: &AlertRule,
    coins: Vec<&'a TickerSnapshot>,
    now_ms: i64,
) -> Vec<&'a TickerSnapshot> {
    coins
        .into_iter()
        .filter(|c| !rule.on_cooldown(&c.symbol, now_ms))
        .collect()
}
