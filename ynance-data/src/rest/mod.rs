//! One-shot REST fetchers for every polled data source.
//!
//! Each fetcher pairs a pure `parse_*` function over the response body with an async wrapper that
//! performs a single timed request and never propagates an error: the outcome is always a
//! [`Fetched`](crate::fetch::Fetched).

/// Shared reqwest client and base URLs.
pub mod client;

/// Alpha Vantage daily stock history.
pub mod alpha_vantage;

/// Binance spot klines and futures premium index.
pub mod binance;

/// CoinGecko simple price.
pub mod coingecko;

/// alternative.me Fear & Greed index.
pub mod fear_greed;

/// FRED economic series observations.
pub mod fred;

/// Gemini exchange public ticker.
pub mod gemini;

pub use client::{Endpoints, RestClient};
