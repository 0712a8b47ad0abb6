//! Bybit v5 REST market data client.
//!
//! Two operations back the alert engine:
//! - `fetch_tickers`: the full linear-perpetual ticker list in one round
//!   trip, no internal retry (a failed snapshot skips the tick)
//! - `fetch_candles`: klines for one symbol with retry, backoff and a hard
//!   per-call timeout race

pub mod client;

pub use client::{MarketClient, DEFAULT_BASE_URL};
