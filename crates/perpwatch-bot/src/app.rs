//! Application wiring and lifecycle.

use crate::config::AppConfig;
use crate::error::AppResult;
use perpwatch_core::AlertStore;
use perpwatch_engine::{AlertScheduler, NotificationDispatcher};
use perpwatch_market::MarketClient;
use perpwatch_notify::TelegramNotifier;
use perpwatch_store::{CheckLogWriter, MemoryStore};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Owns the store and runs the scheduler until shutdown.
pub struct Application {
    config: AppConfig,
    store: Arc<MemoryStore>,
}

impl Application {
    /// Load the snapshot (or start empty), then seed config alerts into an
    /// empty store. A non-empty snapshot wins over config seeds, so restarts
    /// never duplicate rules or lose cooldown state.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let snapshot_path = Path::new(&config.store.snapshot_path);
        let mut store = MemoryStore::load_snapshot(snapshot_path, config.settings)?;

        if let Some(audit_dir) = &config.store.audit_dir {
            store = store.with_audit(CheckLogWriter::new(audit_dir));
        }

        if store.alerts().is_empty() && !config.alerts.is_empty() {
            info!(count = config.alerts.len(), "Seeding alerts from config");
            for seed in config.alerts.iter().cloned() {
                store.add_alert(seed.into_rule());
            }
        }

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Run the check loop until Ctrl-C, then save the snapshot.
    pub async fn run(&self) -> AppResult<()> {
        let market = MarketClient::new(&self.config.rest_url)?;

        let dispatcher = match (
            self.config.telegram.chat_id.as_deref(),
            self.config.telegram.token(),
        ) {
            (Some(chat_id), Some(token)) => {
                info!(chat_id = %chat_id, "Telegram delivery enabled");
                Some(NotificationDispatcher::new(TelegramNotifier::new(
                    token, chat_id,
                )))
            }
            (Some(_), None) => {
                warn!("TELEGRAM_BOT_TOKEN not set, notifications disabled");
                None
            }
            _ => {
                warn!("No Telegram chat id configured, notifications disabled");
                None
            }
        };

        let scheduler = AlertScheduler::new(market, dispatcher, self.store.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
        });

        scheduler.run(shutdown_rx).await;

        self.store
            .save_snapshot(Path::new(&self.config.store.snapshot_path))?;
        info!("Shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertSeed;
    use perpwatch_core::{AlertKind, TimePeriod};
    use rust_decimal_macros::dec;

    fn seed(name: &str) -> AlertSeed {
        AlertSeed {
            name: name.to_string(),
            kind: AlertKind::PriceIncrease {
                period: TimePeriod::H24,
                threshold_pct: dec!(10),
            },
            min_volume_usd: dec!(0),
            max_volume_usd: dec!(0),
            blacklist: Vec::new(),
            enabled: true,
        }
    }

    #[test]
    fn test_seeds_apply_only_to_empty_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let snapshot = dir.path().join("alerts.json");

        let mut config = AppConfig::default();
        config.store.snapshot_path = snapshot.to_string_lossy().into_owned();
        config.alerts = vec![seed("from config")];

        let app = Application::new(config.clone()).unwrap();
        assert_eq!(app.store.alerts().len(), 1);
        app.store.save_snapshot(&snapshot).unwrap();

        // Second boot: snapshot exists, seeds must not duplicate
        let app = Application::new(config).unwrap();
        assert_eq!(app.store.alerts().len(), 1);
    }
}
