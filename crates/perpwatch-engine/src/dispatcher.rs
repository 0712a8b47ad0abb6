//! Batched notification dispatch.

use perpwatch_core::{AlertRule, Notifier, NOTIFY_BATCH_SIZE};
use tracing::warn;

/// Outcome of dispatching one alert's notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub batches_total: usize,
    pub batches_sent: usize,
}

/// Splits triggered symbols into batches of at most 100 and sends one
/// message per batch. A failed batch is logged and skipped; the remaining
/// batches are still sent.
pub struct NotificationDispatcher<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> NotificationDispatcher<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub async fn dispatch(&self, rule: &AlertRule, symbols: &[String]) -> DispatchReport {
        let batches: Vec<&[String]> = symbols.chunks(NOTIFY_BATCH_SIZE).collect();
        let total = batches.len();
        let mut sent = 0;

        for (i, batch) in batches.iter().enumerate() {
            let text = render_message(rule, batch, i + 1, total);
            match self.notifier.send(&text).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    warn!(
                        alert = %rule.name,
                        batch = i + 1,
                        total,
                        error = %err,
                        "notification batch failed, continuing with the rest"
                    );
                }
            }
        }

        DispatchReport {
            batches_total: total,
            batches_sent: sent,
        }
    }
}

/// Render one batch message:
/// `{icon} {name}[ (часть i/n)]\nМонеты: ...\nУсловие: ...\nПериод: ...`.
///
/// The part suffix appears only when the symbols span multiple batches.
fn render_message(rule: &AlertRule, batch: &[String], index: usize, total: usize) -> String {
    let part = if total > 1 {
        format!(" (часть {index}/{total})")
    } else {
        String::new()
    };
    format!(
        "{} {}{}\nМонеты: {}\nУсловие: {}\nПериод: {}",
        rule.kind.icon(),
        rule.name,
        part,
        batch.join(", "),
        rule.kind.condition_label(),
        rule.kind.period_label(),
    )
}
