//! Periodic alert check scheduler.
//!
//! Runs one pass immediately and then on every interval tick. A pass that
//! is still running when the next tick fires makes the tick a no-op (with a
//! System check-log entry), so passes never overlap.

use crate::dispatcher::NotificationDispatcher;
use crate::evaluator::AlertEvaluator;
use chrono::Utc;
use perpwatch_core::{
    AlertRule, AlertStore, CandleSource, CheckLogEntry, Notifier, TickerSnapshot, TickerSource,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Clears the checking flag when a pass ends, normally or by early return.
struct CheckingGuard<'a>(&'a AtomicBool);

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the check loop: market source, optional dispatcher and rule store.
///
/// The dispatcher is `None` when no notification target is configured; the
/// scheduler then records a System entry per tick instead of evaluating.
pub struct AlertScheduler<M, N, S>
where
    M: TickerSource + CandleSource,
    N: Notifier,
    S: AlertStore,
{
    market: M,
    dispatcher: Option<NotificationDispatcher<N>>,
    store: S,
    checking: AtomicBool,
}

impl<M, N, S> AlertScheduler<M, N, S>
where
    M: TickerSource + CandleSource,
    N: Notifier,
    S: AlertStore,
{
    pub fn new(market: M, dispatcher: Option<NotificationDispatcher<N>>, store: S) -> Self {
        Self {
            market,
            dispatcher,
            store,
            checking: AtomicBool::new(false),
        }
    }

    /// Run until `shutdown` flips to true. The first pass starts right away.
    ///
    /// The tick interval is read from settings once at startup; changing it
    /// requires a restart.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_millis(self.store.settings().check_interval_ms.max(1_000));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = period.as_millis() as u64, "alert scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_pass().await,
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("alert scheduler stopping");
                        break;
                    }
                }
            }
        }
    }

    /// One guarded check pass. Public so a caller can force a pass outside
    /// the regular schedule.
    pub async fn run_pass(&self) {
        if self.checking.swap(true, Ordering::SeqCst) {
            warn!("previous check still running, skipping tick");
            self.store.append_check_log(CheckLogEntry::system(
                now_ms(),
                "previous check still running, tick skipped",
            ));
            return;
        }
        let _guard = CheckingGuard(&self.checking);
        self.check_all().await;
    }

    async fn check_all(&self) {
        let started = now_ms();
        let settings = self.store.settings();
        let alerts = self.store.alerts();

        let dispatcher = match &self.dispatcher {
            Some(d) => d,
            None => {
                self.store.append_check_log(CheckLogEntry::system(
                    started,
                    "no notification target configured",
                ));
                return;
            }
        };
        if alerts.is_empty() {
            self.store
                .append_check_log(CheckLogEntry::system(started, "no alerts configured"));
            return;
        }

        let tickers = match self.market.fetch_tickers().await {
            Ok(t) => t,
            Err(err) => {
                warn!(error = %err, "ticker snapshot fetch failed, aborting pass");
                self.store.append_check_log(CheckLogEntry::system(
                    started,
                    format!("ticker snapshot fetch failed: {err}"),
                ));
                return;
            }
        };
        let mut universe: Vec<TickerSnapshot> = tickers.into_values().collect();
        universe.sort_by(|a, b| b.turnover_24h.cmp(&a.turnover_24h));

        let to_check: Vec<AlertRule> = alerts
            .into_iter()
            .take(settings.max_alerts.max(1))
            .collect();
        let evaluator = AlertEvaluator::new(&self.market);

        for rule in &to_check {
            if !rule.enabled {
                continue;
            }
            let alert_started = now_ms();
            let eval = evaluator
                .evaluate(rule, &universe, settings.auto_filter, alert_started)
                .await;

            let mut sent_symbols: Vec<String> = Vec::new();
            if !eval.triggered.is_empty() {
                let report = dispatcher.dispatch(rule, &eval.triggered).await;
                info!(
                    alert = %rule.name,
                    matched = eval.triggered.len(),
                    batches_sent = report.batches_sent,
                    batches_total = report.batches_total,
                    "alert triggered"
                );
                // Cooldown is stamped regardless of delivery outcome, so a
                // flaky channel cannot cause re-notification storms.
                self.store.mark_sent(rule.id, &eval.triggered, now_ms());
                sent_symbols = eval.triggered;
            }

            self.store.append_check_log(CheckLogEntry::for_alert(
                alert_started,
                &rule.name,
                eval.checked_coins,
                sent_symbols.len(),
                &sent_symbols,
            ));
        }
    }
}
