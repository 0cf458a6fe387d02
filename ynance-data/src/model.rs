//! Normalised market-data models shared by the REST fetchers, the WebSocket streams and the
//! dashboard state.

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::str::FromStr;

/// OHLCV bar for one interval.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct PriceBar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Close prices of a bar series, in order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

/// 24h rolling ticker statistics for one instrument.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TickerSnapshot {
    pub symbol: SmolStr,
    pub last_price: f64,
    pub volume_24h: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// Price level in a partial order book, with the running quantity from the top of book.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize, Constructor)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
    pub cumulative: f64,
}

/// Top-N order book snapshot, replaced wholesale on every depth message.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DepthSnapshot {
    pub last_update_id: u64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl DepthSnapshot {
    /// Keep the first `depth_limit` `(price, quantity)` levels of each side in input order and
    /// attach the cumulative quantity column.
    pub fn from_levels(
        last_update_id: u64,
        bids: &[(f64, f64)],
        asks: &[(f64, f64)],
        depth_limit: usize,
    ) -> Self {
        Self {
            last_update_id,
            bids: cumulate(bids, depth_limit),
            asks: cumulate(asks, depth_limit),
        }
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    /// Best ask minus best bid.
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    /// Bid share of the total visible quantity, 0..=1.
    pub fn bid_share(&self) -> Option<f64> {
        let bid = self.bids.last().map(|level| level.cumulative).unwrap_or(0.0);
        let ask = self.asks.last().map(|level| level.cumulative).unwrap_or(0.0);
        let total = bid + ask;
        (total > 0.0).then(|| bid / total)
    }
}

fn cumulate(levels: &[(f64, f64)], depth_limit: usize) -> Vec<BookLevel> {
    levels
        .iter()
        .take(depth_limit)
        .scan(0.0, |running, &(price, quantity)| {
            *running += quantity;
            Some(BookLevel::new(price, quantity, *running))
        })
        .collect()
}

/// Which Fear & Greed index a reading belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Deserialize, Serialize)]
pub enum SentimentMarket {
    Stock,
    #[default]
    Crypto,
}

impl SentimentMarket {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentMarket::Stock => "stock",
            SentimentMarket::Crypto => "crypto",
        }
    }
}

/// Most recent Fear & Greed reading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SentimentReading {
    /// 0 (extreme fear) ..= 100 (extreme greed).
    pub value: u8,
    pub classification: String,
    pub market: SentimentMarket,
}

/// One observation of an economic series.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Perpetual futures mark price and funding.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FundingRate {
    pub symbol: SmolStr,
    pub mark_price: f64,
    /// Funding rate per period as a fraction (0.0001 = 0.01%).
    pub funding_rate: f64,
    pub next_funding_time: Option<DateTime<Utc>>,
}

/// Top-of-book quote from a spot exchange ticker.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ExchangeQuote {
    pub symbol: SmolStr,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: f64,
}

/// Aggregated USD price for a coin.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CoinPrice {
    pub id: SmolStr,
    pub usd: f64,
    pub change_24h_pct: Option<f64>,
}

/// Kline interval supported by the Binance REST and stream endpoints.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Deserialize, Serialize)]
pub enum KlineInterval {
    #[default]
    Minute1,
    Minute5,
    Minute15,
    Hour1,
    Hour4,
    Day1,
}

impl KlineInterval {
    pub const ALL: [KlineInterval; 6] = [
        KlineInterval::Minute1,
        KlineInterval::Minute5,
        KlineInterval::Minute15,
        KlineInterval::Hour1,
        KlineInterval::Hour4,
        KlineInterval::Day1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KlineInterval::Minute1 => "1m",
            KlineInterval::Minute5 => "5m",
            KlineInterval::Minute15 => "15m",
            KlineInterval::Hour1 => "1h",
            KlineInterval::Hour4 => "4h",
            KlineInterval::Day1 => "1d",
        }
    }

    /// Next interval in the selector cycle, wrapping around.
    pub fn next(&self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|interval| interval == self)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KlineInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported kline interval: {s}"))
    }
}
