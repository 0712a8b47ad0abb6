//! Smart-alert rules, kinds and global settings.

use crate::candle::Interval;
use crate::SYMBOL_COOLDOWN_MS;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Look-back window for an alert check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "3h")]
    H3,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "10h")]
    H10,
    #[serde(rename = "16h")]
    H16,
    #[serde(rename = "24h")]
    H24,
}

impl TimePeriod {
    /// Window length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        const HOUR: i64 = 60 * 60 * 1000;
        match self {
            Self::H1 => HOUR,
            Self::H2 => 2 * HOUR,
            Self::H3 => 3 * HOUR,
            Self::H6 => 6 * HOUR,
            Self::H10 => 10 * HOUR,
            Self::H16 => 16 * HOUR,
            Self::H24 => 24 * HOUR,
        }
    }

    /// Kline interval used to cover this window.
    pub fn kline_interval(&self) -> Interval {
        match self {
            Self::H1 => Interval::Min1,
            Self::H2 => Interval::Min3,
            Self::H3 => Interval::Min5,
            Self::H6 => Interval::Min15,
            Self::H10 => Interval::Min30,
            Self::H16 | Self::H24 => Interval::Min60,
        }
    }

    /// Candle count for this window: `min(ceil(period / 1m), 100)`.
    pub fn kline_limit(&self) -> usize {
        let minutes = (self.duration_ms() + 59_999) / 60_000;
        (minutes as usize).min(100)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H3 => "3h",
            Self::H6 => "6h",
            Self::H10 => "10h",
            Self::H16 => "16h",
            Self::H24 => "24h",
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The five alert kinds, each carrying only the fields it needs.
///
/// Adding a kind is a compile-time-checked extension: the evaluator and the
/// dispatcher match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Price rose by at least `threshold_pct` over `period`.
    PriceIncrease {
        period: TimePeriod,
        threshold_pct: Decimal,
    },
    /// Price fell by at least `threshold_pct` over `period`.
    PriceDecrease {
        period: TimePeriod,
        threshold_pct: Decimal,
    },
    /// 24h volatility `(high-low)/prev` reached `threshold_pct`.
    Volatility { threshold_pct: Decimal },
    /// Last candle's volume exceeds the window average by `threshold_pct`.
    VolumeSpike {
        period: TimePeriod,
        threshold_pct: Decimal,
    },
    /// Last 20 one-minute closes stayed within `max_range_pct` — a tight
    /// trading range signalling a density zone.
    DensityAppearance { max_range_pct: Decimal },
}

impl AlertKind {
    /// Telegram message icon.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::PriceIncrease { .. } => "📈",
            Self::PriceDecrease { .. } => "📉",
            Self::Volatility { .. } => "📊",
            Self::VolumeSpike { .. } => "📈",
            Self::DensityAppearance { .. } => "🎯",
        }
    }

    /// Human condition label for the notification text.
    pub fn condition_label(&self) -> String {
        match self {
            Self::PriceIncrease { threshold_pct, .. } => {
                format!("Рост цены ≥ {threshold_pct}%")
            }
            Self::PriceDecrease { threshold_pct, .. } => {
                format!("Падение цены ≥ {threshold_pct}%")
            }
            Self::Volatility { threshold_pct } => {
                format!("Волатильность ≥ {threshold_pct}%")
            }
            Self::VolumeSpike { threshold_pct, .. } => {
                format!("Всплеск объёма ≥ {threshold_pct}%")
            }
            Self::DensityAppearance { max_range_pct } => {
                format!("Плотность (диапазон) ≤ {max_range_pct}%")
            }
        }
    }

    /// Look-back period label for the notification text.
    ///
    /// Volatility is inherently a 24h snapshot metric; density is computed
    /// over the last 20 one-minute closes.
    pub fn period_label(&self) -> &'static str {
        match self {
            Self::PriceIncrease { period, .. }
            | Self::PriceDecrease { period, .. }
            | Self::VolumeSpike { period, .. } => period.label(),
            Self::Volatility { .. } => "24h",
            Self::DensityAppearance { .. } => "20m",
        }
    }
}

/// One user-defined smart alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique id, generated at creation.
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub kind: AlertKind,
    /// Minimum 24h USD volume; zero = unbounded.
    #[serde(default)]
    pub min_volume_usd: Decimal,
    /// Maximum 24h USD volume; zero = unbounded.
    #[serde(default)]
    pub max_volume_usd: Decimal,
    /// Symbols excluded from this alert entirely.
    #[serde(default)]
    pub blacklist: HashSet<String>,
    pub enabled: bool,
    pub created_at_ms: i64,
    /// Last time any symbol was marked sent for this alert.
    #[serde(default)]
    pub last_triggered_ms: Option<i64>,
    /// Per-symbol last-sent timestamps. Entries older than the cooldown
    /// window remain present but no longer suppress.
    #[serde(default)]
    pub sent_by_symbol: HashMap<String, i64>,
}

impl AlertRule {
    /// Create an enabled rule with a fresh id and empty cooldown state.
    pub fn new(name: impl Into<String>, kind: AlertKind, created_at_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            min_volume_usd: Decimal::ZERO,
            max_volume_usd: Decimal::ZERO,
            blacklist: HashSet::new(),
            enabled: true,
            created_at_ms,
            last_triggered_ms: None,
            sent_by_symbol: HashMap::new(),
        }
    }

    /// Whether `symbol` is still inside the 24h cooldown window.
    ///
    /// Exactly at the boundary the symbol is eligible again (elapsed >= 24h).
    pub fn on_cooldown(&self, symbol: &str, now_ms: i64) -> bool {
        match self.sent_by_symbol.get(symbol) {
            Some(last) => now_ms - last < SYMBOL_COOLDOWN_MS,
            None => false,
        }
    }

    /// Whether `volume` passes the optional min/max USD bounds.
    pub fn volume_in_bounds(&self, volume: Decimal) -> bool {
        if !self.min_volume_usd.is_zero() && volume < self.min_volume_usd {
            return false;
        }
        if !self.max_volume_usd.is_zero() && volume > self.max_volume_usd {
            return false;
        }
        true
    }
}

/// Global smart-alert settings, consumed but never mutated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Scheduler tick interval.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Maximum alerts evaluated per pass.
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
    /// Whether the 24h per-symbol cooldown filter is applied.
    #[serde(default = "default_auto_filter")]
    pub auto_filter: bool,
}

fn default_check_interval_ms() -> u64 {
    10_000
}

fn default_max_alerts() -> usize {
    50
}

fn default_auto_filter() -> bool {
    true
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            max_alerts: default_max_alerts(),
            auto_filter: default_auto_filter(),
        }
    }
}
