//! HTTP client for the Bybit v5 market endpoints.

use chrono::Utc;
use perpwatch_core::{
    Candle, CandleSource, Interval, TickerSnapshot, TickerSource, UpstreamError,
};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Public mainnet REST base.
pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com/v5";

/// Hard per-call timeout raced against each kline attempt.
const KLINE_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Kline attempts before surfacing `RetriesExhausted`.
const KLINE_MAX_ATTEMPTS: u32 = 3;

/// Bybit v5 response envelope. `retCode != 0` signals a non-success status
/// even when HTTP is 200.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker {
    symbol: String,
    #[serde(default)]
    last_price: String,
    #[serde(default)]
    prev_price_24h: String,
    #[serde(default)]
    high_price_24h: String,
    #[serde(default)]
    low_price_24h: String,
    #[serde(default)]
    turnover_24h: String,
}

#[derive(Debug, Deserialize)]
struct TickersResult {
    list: Vec<RawTicker>,
}

/// `[startTime, open, high, low, close, volume, turnover]`, all strings.
type RawKline = (String, String, String, String, String, String, String);

#[derive(Debug, Deserialize)]
struct KlineResult {
    list: Vec<RawKline>,
}

/// Lenient numeric parse: absent or unparsable fields become zero, so
/// derived-metric fallbacks apply instead of poisoning the snapshot.
fn parse_dec(s: &str) -> Decimal {
    Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO)
}

fn decode_tickers(body: &str) -> Result<HashMap<String, TickerSnapshot>, UpstreamError> {
    let envelope: ApiEnvelope<TickersResult> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    if envelope.ret_code != 0 {
        return Err(UpstreamError::Envelope {
            ret_code: envelope.ret_code,
            ret_msg: envelope.ret_msg,
        });
    }

    let result = envelope
        .result
        .ok_or_else(|| UpstreamError::Malformed("missing result field".to_string()))?;

    let mut snapshot = HashMap::with_capacity(result.list.len());
    for raw in result.list {
        let entry = TickerSnapshot::new(
            raw.symbol.clone(),
            parse_dec(&raw.last_price),
            parse_dec(&raw.prev_price_24h),
            parse_dec(&raw.high_price_24h),
            parse_dec(&raw.low_price_24h),
            parse_dec(&raw.turnover_24h),
        );
        snapshot.insert(raw.symbol, entry);
    }
    Ok(snapshot)
}

fn decode_klines(body: &str) -> Result<Vec<Candle>, UpstreamError> {
    let envelope: ApiEnvelope<KlineResult> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    if envelope.ret_code != 0 {
        return Err(UpstreamError::Envelope {
            ret_code: envelope.ret_code,
            ret_msg: envelope.ret_msg,
        });
    }

    let result = envelope
        .result
        .ok_or_else(|| UpstreamError::Malformed("missing result field".to_string()))?;

    let mut candles = Vec::with_capacity(result.list.len());
    for (start, open, high, low, close, volume, turnover) in result.list {
        let open_time = start
            .parse::<i64>()
            .map_err(|e| UpstreamError::Malformed(format!("bad candle start time: {e}")))?;
        candles.push(Candle {
            open_time,
            open: parse_dec(&open),
            high: parse_dec(&high),
            low: parse_dec(&low),
            close: parse_dec(&close),
            volume: parse_dec(&volume),
            turnover: parse_dec(&turnover),
        });
    }

    // Bybit returns klines newest first; the evaluator compares first vs
    // last close, so normalize to chronological ascending.
    if candles.len() > 1 && candles[0].open_time > candles[candles.len() - 1].open_time {
        candles.reverse();
    }
    Ok(candles)
}

/// REST client for linear-perpetual tickers and klines.
pub struct MarketClient {
    client: Client,
    base_url: String,
}

impl MarketClient {
    /// Create a client against the given REST base (e.g.
    /// `https://api.bybit.com/v5`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(KLINE_CALL_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_body(&self, path: &str, query: &[(&str, String)]) -> Result<String, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Http(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(UpstreamError::Http(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    /// Fetch the full linear ticker list in one round trip.
    ///
    /// No internal retry: a failed snapshot means the caller skips this
    /// tick rather than stalling the scheduler on backoff.
    pub async fn fetch_ticker_snapshot(
        &self,
    ) -> Result<HashMap<String, TickerSnapshot>, UpstreamError> {
        let body = self
            .get_body("/market/tickers", &[("category", "linear".to_string())])
            .await?;
        let snapshot = decode_tickers(&body)?;
        debug!(symbols = snapshot.len(), "Fetched ticker snapshot");
        Ok(snapshot)
    }

    async fn fetch_kline_once(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, UpstreamError> {
        let end = Utc::now().timestamp_millis();
        let start = end - limit as i64 * interval.duration_ms();
        let body = self
            .get_body(
                "/market/kline",
                &[
                    ("category", "linear".to_string()),
                    ("symbol", symbol.to_string()),
                    ("interval", interval.as_code().to_string()),
                    ("start", start.to_string()),
                    ("end", end.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        decode_klines(&body)
    }

    /// Fetch klines for one symbol, ascending by open time.
    ///
    /// Up to 3 attempts with 1s-per-attempt backoff; each attempt races a
    /// 10s timeout. Malformed bodies count as failed attempts.
    pub async fn fetch_kline(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, UpstreamError> {
        let mut last_error = String::new();

        for attempt in 1..=KLINE_MAX_ATTEMPTS {
            match tokio::time::timeout(
                KLINE_CALL_TIMEOUT,
                self.fetch_kline_once(symbol, interval, limit),
            )
            .await
            {
                Ok(Ok(candles)) => return Ok(candles),
                Ok(Err(e)) => {
                    warn!(symbol, attempt, error = %e, "Kline fetch attempt failed");
                    last_error = e.to_string();
                }
                Err(_) => {
                    warn!(symbol, attempt, "Kline fetch attempt timed out");
                    last_error = UpstreamError::Timeout.to_string();
                }
            }

            if attempt < KLINE_MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
            }
        }

        Err(UpstreamError::RetriesExhausted {
            attempts: KLINE_MAX_ATTEMPTS,
            last: last_error,
        })
    }
}

impl TickerSource for MarketClient {
    async fn fetch_tickers(&self) -> Result<HashMap<String, TickerSnapshot>, UpstreamError> {
        self.fetch_ticker_snapshot().await
    }
}

impl CandleSource for MarketClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, UpstreamError> {
        self.fetch_kline(symbol, interval, limit).await
    }
}
