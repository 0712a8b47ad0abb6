//! Per-alert trigger evaluation.
//!
//! One evaluation takes a rule and the volume-sorted ticker universe and
//! produces the list of triggered symbols. Snapshot-backed kinds (24h price
//! moves, volatility) read the precomputed metrics directly; candle-backed
//! kinds fan out per-symbol kline fetches through the bounded mapper. A
//! failed kline fetch means "did not trigger" for that symbol only.

use crate::cooldown::filter_armed;
use crate::map_limit::map_limit;
use perpwatch_core::{
    AlertKind, AlertRule, Candle, CandleSource, Interval, TickerSnapshot, TimePeriod,
    KLINE_CONCURRENCY, MAX_KLINE_COINS_PER_ALERT,
};
use rust_decimal::Decimal;
use tracing::debug;

/// One-minute candles fetched per density check.
const DENSITY_FETCH_LIMIT: usize = 60;

/// Closes examined per density check (the window's tail).
const DENSITY_WINDOW: usize = 20;

/// Outcome of evaluating one rule against the universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Symbols that survived the blacklist and volume filters.
    pub checked_coins: usize,
    /// Symbols that satisfied the trigger condition, in universe order.
    pub triggered: Vec<String>,
}

/// Evaluates alert rules against ticker and kline data.
pub struct AlertEvaluator<'a, C: CandleSource> {
    candles: &'a C,
}

impl<'a, C: CandleSource> AlertEvaluator<'a, C> {
    pub fn new(candles: &'a C) -> Self {
        Self { candles }
    }

    /// Evaluate `rule` against `universe` (sorted by 24h turnover, descending).
    pub async fn evaluate(
        &self,
        rule: &AlertRule,
        universe: &[TickerSnapshot],
        auto_filter: bool,
        now_ms: i64,
    ) -> Evaluation {
        let eligible: Vec<&TickerSnapshot> = universe
            .iter()
            .filter(|t| !rule.blacklist.contains(&t.symbol))
            .filter(|t| rule.volume_in_bounds(t.turnover_24h))
            .collect();
        let checked_coins = eligible.len();

        let candidates = if auto_filter {
            filter_armed(rule, eligible, now_ms)
        } else {
            eligible
        };

        let triggered = match &rule.kind {
            AlertKind::PriceIncrease {
                period: TimePeriod::H24,
                threshold_pct,
            } => candidates
                .iter()
                .filter(|t| t.price_change_pct >= *threshold_pct)
                .map(|t| t.symbol.clone())
                .collect(),
            AlertKind::PriceDecrease {
                period: TimePeriod::H24,
                threshold_pct,
            } => candidates
                .iter()
                .filter(|t| t.price_change_pct <= -*threshold_pct)
                .map(|t| t.symbol.clone())
                .collect(),
            AlertKind::Volatility { threshold_pct } => candidates
                .iter()
                .filter(|t| t.volatility_pct >= *threshold_pct)
                .map(|t| t.symbol.clone())
                .collect(),
            AlertKind::PriceIncrease {
                period,
                threshold_pct,
            } => {
                self.candle_scan(candidates, *period, move |candles| {
                    matches!(price_move_pct(candles), Some(pct) if pct >= *threshold_pct)
                })
                .await
            }
            AlertKind::PriceDecrease {
                period,
                threshold_pct,
            } => {
                self.candle_scan(candidates, *period, move |candles| {
                    matches!(price_move_pct(candles), Some(pct) if pct <= -*threshold_pct)
                })
                .await
            }
            AlertKind::VolumeSpike {
                period,
                threshold_pct,
            } => {
                self.candle_scan(candidates, *period, move |candles| {
                    matches!(volume_spike_pct(candles), Some(pct) if pct >= *threshold_pct)
                })
                .await
            }
            AlertKind::DensityAppearance { max_range_pct } => {
                self.density_scan(candidates, *max_range_pct).await
            }
        };

        Evaluation {
            checked_coins,
            triggered,
        }
    }

    /// Fan out per-symbol kline fetches for the rule's period and keep the
    /// symbols whose candles satisfy `hit`.
    async fn candle_scan<F>(
        &self,
        candidates: Vec<&TickerSnapshot>,
        period: TimePeriod,
        hit: F,
    ) -> Vec<String>
    where
        F: Fn(&[Candle]) -> bool,
    {
        let symbols: Vec<String> = candidates
            .into_iter()
            .take(MAX_KLINE_COINS_PER_ALERT)
            .map(|t| t.symbol.clone())
            .collect();
        let interval = period.kline_interval();
        let limit = period.kline_limit();
        let hit = &hit;

        let hits = map_limit(symbols, KLINE_CONCURRENCY, |symbol| async move {
            match self.candles.fetch_candles(&symbol, interval, limit).await {
                Ok(candles) if hit(&candles) => Some(symbol),
                Ok(_) => None,
                Err(err) => {
                    debug!(symbol = %symbol, error = %err, "kline fetch failed, treating as not triggered");
                    None
                }
            }
        })
        .await;

        hits.into_iter().flatten().collect()
    }

    /// Density check: the last 20 one-minute closes must all sit inside a
    /// `max_range_pct` band.
    async fn density_scan(
        &self,
        candidates: Vec<&TickerSnapshot>,
        max_range_pct: Decimal,
    ) -> Vec<String> {
        let symbols: Vec<String> = candidates
            .into_iter()
            .take(MAX_KLINE_COINS_PER_ALERT)
            .map(|t| t.symbol.clone())
            .collect();

        let hits = map_limit(symbols, KLINE_CONCURRENCY, |symbol| async move {
            match self
                .candles
                .fetch_candles(&symbol, Interval::Min1, DENSITY_FETCH_LIMIT)
                .await
            {
                Ok(candles) => {
                    matches!(close_range_pct(&candles), Some(pct) if pct <= max_range_pct)
                        .then_some(symbol)
                }
                Err(err) => {
                    debug!(symbol = %symbol, error = %err, "kline fetch failed, treating as not triggered");
                    None
                }
            }
        })
        .await;

        hits.into_iter().flatten().collect()
    }
}

/// Close-to-close move over the window: `(last - first) / first * 100`.
///
/// None when fewer than two candles arrived or the first close is zero.
fn price_move_pct(candles: &[Candle]) -> Option<Decimal> {
    if candles.len() < 2 {
        return None;
    }
    let first = candles.first()?.close;
    let last = candles.last()?.close;
    if first.is_zero() {
        return None;
    }
    Some((last - first) / first * Decimal::ONE_HUNDRED)
}

/// Last candle's volume versus the average of the preceding candles:
/// `(last - avg) / avg * 100`. None when the average is zero.
fn volume_spike_pct(candles: &[Candle]) -> Option<Decimal> {
    let (last, rest) = candles.split_last()?;
    if rest.is_empty() {
        return None;
    }
    let sum: Decimal = rest.iter().map(|c| c.volume).sum();
    let avg = sum / Decimal::from(rest.len());
    if avg.is_zero() {
        return None;
    }
    Some((last.volume - avg) / avg * Decimal::ONE_HUNDRED)
}

/// Spread of the last `DENSITY_WINDOW` closes: `(max - min) / min * 100`.
///
/// None when fewer than 20 candles arrived or the minimum close is zero.
fn close_range_pct(candles: &[Candle]) -> Option<Decimal> {
    if candles.len() < DENSITY_WINDOW {
        return None;
    }
    let tail = &candles[candles.len() - DENSITY_WINDOW..];
    let min = tail.iter().map(|c| c.close).min()?;
    let max = tail.iter().map(|c| c.close).max()?;
    if min.is_zero() {
        return None;
    }
    Some((max - min) / min * Decimal::ONE_HUNDRED)
}
