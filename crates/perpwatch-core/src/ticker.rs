//! Ticker snapshot entry with derived 24h metrics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One symbol's ticker from a single snapshot fetch.
///
/// Derived metrics are computed once at construction and the entry is
/// immutable afterwards. Created fresh each fetch cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Symbol id (e.g., "BTCUSDT").
    pub symbol: String,
    /// Last traded price.
    pub last_price: Decimal,
    /// Price 24h ago. Already normalized: falls back to `last_price` when
    /// the source value was absent, zero or unparsable.
    pub prev_price_24h: Decimal,
    /// 24h high.
    pub high_price_24h: Decimal,
    /// 24h low.
    pub low_price_24h: Decimal,
    /// 24h quote-currency (USD) volume.
    pub turnover_24h: Decimal,
    /// `(last - prev) / prev * 100`.
    pub price_change_pct: Decimal,
    /// `(high - low) / prev * 100`.
    pub volatility_pct: Decimal,
}

impl TickerSnapshot {
    /// Build a snapshot entry and compute derived metrics.
    ///
    /// `prev` must never be used as a divisor when zero: the denominator
    /// falls back to `last`, and if that is also zero both derived metrics
    /// are zero rather than NaN or infinity.
    pub fn new(
        symbol: impl Into<String>,
        last_price: Decimal,
        prev_price_24h: Decimal,
        high_price_24h: Decimal,
        low_price_24h: Decimal,
        turnover_24h: Decimal,
    ) -> Self {
        let prev = if prev_price_24h.is_zero() {
            last_price
        } else {
            prev_price_24h
        };

        let (price_change_pct, volatility_pct) = if prev.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                (last_price - prev) / prev * Decimal::ONE_HUNDRED,
                (high_price_24h - low_price_24h) / prev * Decimal::ONE_HUNDRED,
            )
        };

        Self {
            symbol: symbol.into(),
            last_price,
            prev_price_24h: prev,
            high_price_24h,
            low_price_24h,
            turnover_24h,
            price_change_pct,
            volatility_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_derived_metrics() {
        let t = TickerSnapshot::new(
            "BTCUSDT",
            dec!(121),
            dec!(100),
            dec!(130),
            dec!(95),
            dec!(1000000),
        );
        assert_eq!(t.price_change_pct, dec!(21));
        assert_eq!(t.volatility_pct, dec!(35));
    }

    #[test]
    fn test_zero_prev_falls_back_to_last() {
        let t = TickerSnapshot::new(
            "NEWUSDT",
            dec!(2),
            Decimal::ZERO,
            dec!(3),
            dec!(1),
            dec!(500),
        );
        // Denominator is last_price (2): change = 0%, volatility = 100%
        assert_eq!(t.prev_price_24h, dec!(2));
        assert_eq!(t.price_change_pct, Decimal::ZERO);
        assert_eq!(t.volatility_pct, dec!(100));
    }

    #[test]
    fn test_both_prices_zero_yields_zero_metrics() {
        let t = TickerSnapshot::new(
            "DEADUSDT",
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!(t.price_change_pct, Decimal::ZERO);
        assert_eq!(t.volatility_pct, Decimal::ZERO);
    }
}
