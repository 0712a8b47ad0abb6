//! Application configuration.

use crate::error::{AppError, AppResult};
use chrono::Utc;
use perpwatch_core::{AlertKind, AlertRule, AlertSettings};
use perpwatch_market::DEFAULT_BASE_URL;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Telegram delivery configuration.
///
/// The bot token is deliberately not part of the config file; it is read
/// from the `TELEGRAM_BOT_TOKEN` environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Target chat id. Delivery is disabled when absent.
    #[serde(default)]
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    pub fn token(&self) -> Option<String> {
        std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
    }
}

/// Persistence paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot of rules and settings, loaded at startup and saved on
    /// shutdown.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Directory for JSON Lines check-log audit files; disabled when absent.
    #[serde(default)]
    pub audit_dir: Option<String>,
}

fn default_snapshot_path() -> String {
    "data/alerts.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            audit_dir: None,
        }
    }
}

/// One alert rule seeded from the config file.
///
/// Seeds only apply when no snapshot exists yet; afterwards the snapshot is
/// the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSeed {
    pub name: String,
    #[serde(flatten)]
    pub kind: AlertKind,
    #[serde(default)]
    pub min_volume_usd: Decimal,
    #[serde(default)]
    pub max_volume_usd: Decimal,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AlertSeed {
    pub fn into_rule(self) -> AlertRule {
        let mut rule = AlertRule::new(self.name, self.kind, Utc::now().timestamp_millis());
        rule.min_volume_usd = self.min_volume_usd;
        rule.max_volume_usd = self.max_volume_usd;
        rule.blacklist = self.blacklist.into_iter().collect();
        rule.enabled = self.enabled;
        rule
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange REST base URL.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub settings: AlertSettings,
    #[serde(default)]
    pub store: StoreConfig,
    /// Rules to seed an empty store with.
    #[serde(default)]
    pub alerts: Vec<AlertSeed>,
}

fn default_rest_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            telegram: TelegramConfig::default(),
            settings: AlertSettings::default(),
            store: StoreConfig::default(),
            alerts: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perpwatch_core::TimePeriod;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            rest_url = "https://api.bybit.com/v5"

            [telegram]
            chat_id = "123456"

            [settings]
            check_interval_ms = 15000
            max_alerts = 10
            auto_filter = false

            [store]
            snapshot_path = "data/alerts.json"
            audit_dir = "data/checks"

            [[alerts]]
            name = "fast pumps"
            type = "price_increase"
            period = "1h"
            threshold_pct = "5"
            min_volume_usd = "1000000"
            blacklist = ["USDCUSDT"]

            [[alerts]]
            name = "densities"
            type = "density_appearance"
            max_range_pct = "1.5"
            enabled = false
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telegram.chat_id.as_deref(), Some("123456"));
        assert_eq!(config.settings.check_interval_ms, 15_000);
        assert!(!config.settings.auto_filter);
        assert_eq!(config.store.audit_dir.as_deref(), Some("data/checks"));
        assert_eq!(config.alerts.len(), 2);

        let rule = config.alerts[0].clone().into_rule();
        assert_eq!(rule.name, "fast pumps");
        assert_eq!(
            rule.kind,
            AlertKind::PriceIncrease {
                period: TimePeriod::H1,
                threshold_pct: dec!(5),
            }
        );
        assert_eq!(rule.min_volume_usd, dec!(1000000));
        assert!(rule.blacklist.contains("USDCUSDT"));
        assert!(rule.enabled);

        assert!(!config.alerts[1].clone().into_rule().enabled);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.rest_url, DEFAULT_BASE_URL);
        assert!(config.telegram.chat_id.is_none());
        assert_eq!(config.settings.check_interval_ms, 10_000);
        assert_eq!(config.settings.max_alerts, 50);
        assert!(config.settings.auto_filter);
        assert!(config.alerts.is_empty());
    }
}
