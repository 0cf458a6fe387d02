#![forbid(unsafe_code)]

//! # Ynance-Data
//! Market-data layer of the Ynance dashboard:
//! * **REST fetchers** for Alpha Vantage, Binance, FRED, alternative.me Fear & Greed, Gemini and
//!   CoinGecko. Every fetch returns a [`Fetched`] and never panics.
//! * **Binance WebSocket streams** (tickers, klines, depth, mark price) with an explicit
//!   [`ConnectionState`] machine, exponential backoff and an idle read timeout, supervised per
//!   [`SubscriptionKey`] by a [`StreamSupervisor`].
//! * **Indicators**: SMA, EMA, RSI and MACD over close series.
//! * **Reports**: LLM-drafted market commentary with a fixed fallback.
//! * **Dashboard state** mutated only through [`DashboardState::apply`] and
//!   [`DashboardState::apply_fetch`].

/// Credentials (`secrets.json`) and environment configuration.
pub mod config;

/// Serde helpers for exchange payloads.
pub mod de;

/// All [`Error`](std::error::Error)s generated in Ynance-Data.
pub mod error;

/// Updates flowing from producers to the dashboard state owner.
pub mod event;

/// Exchange WebSocket message formats.
pub mod exchange;

/// Outcome of a single data-source request.
pub mod fetch;

/// Technical indicators.
pub mod indicator;

/// Normalised market-data models.
pub mod model;

/// LLM report drafting.
pub mod report;

/// REST fetchers.
pub mod rest;

/// Dashboard state and kline buffers.
pub mod state;

/// WebSocket connections, backoff and supervision.
pub mod streams;

/// Stream subscription identity.
pub mod subscription;

pub use config::{DashboardConfig, LlmConfig, Provider, Secrets};
pub use error::DataError;
pub use event::{FetchUpdate, StreamUpdate};
pub use fetch::Fetched;
pub use state::{DashboardState, KlineBuffer};
pub use streams::{ConnectionState, StreamConfig, StreamSupervisor};
pub use subscription::{StreamKind, SubscriptionKey};
