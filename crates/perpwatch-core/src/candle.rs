//! Kline candles and interval codes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bybit v5 kline interval codes.
///
/// Minute codes are what the evaluator uses; `Day`/`Week`/`Month` are
/// supported by the fetcher but unused by alert checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Min60,
    Day,
    Week,
    Month,
}

impl Interval {
    /// Wire code for the kline endpoint (`interval` query parameter).
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Min1 => "1",
            Self::Min3 => "3",
            Self::Min5 => "5",
            Self::Min15 => "15",
            Self::Min30 => "30",
            Self::Min60 => "60",
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
        }
    }

    /// Duration of one candle in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60 * 1000;
        match self {
            Self::Min1 => MINUTE,
            Self::Min3 => 3 * MINUTE,
            Self::Min5 => 5 * MINUTE,
            Self::Min15 => 15 * MINUTE,
            Self::Min30 => 30 * MINUTE,
            Self::Min60 => 60 * MINUTE,
            Self::Day => 24 * 60 * MINUTE,
            Self::Week => 7 * 24 * 60 * MINUTE,
            Self::Month => 30 * 24 * 60 * MINUTE,
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// One OHLCV candle.
///
/// Sequences handed to the evaluator are chronological ascending; the
/// fetcher normalizes the source's newest-first order before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time, ms since epoch.
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Base-currency volume.
    pub volume: Decimal,
    /// Quote-currency volume.
    pub turnover: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_codes() {
        assert_eq!(Interval::Min1.as_code(), "1");
        assert_eq!(Interval::Min60.as_code(), "60");
        assert_eq!(Interval::Day.as_code(), "D");
        assert_eq!(Interval::Month.as_code(), "M");
    }

    #[test]
    fn test_interval_duration() {
        assert_eq!(Interval::Min3.duration_ms(), 180_000);
        assert_eq!(Interval::Day.duration_ms(), 86_400_000);
    }
}
