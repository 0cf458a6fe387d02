use crate::model::KlineInterval;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Kind of Binance market stream.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum StreamKind {
    /// All-market rolling 24h ticker array.
    Tickers,
    Kline,
    /// Top 20 partial order book, 100ms updates.
    Depth,
    /// USD-M futures mark price and funding, 1s updates.
    MarkPrice,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Tickers => "tickers",
            StreamKind::Kline => "kline",
            StreamKind::Depth => "depth",
            StreamKind::MarkPrice => "mark_price",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one stream subscription. At most one connection runs per key.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct SubscriptionKey {
    pub kind: StreamKind,
    /// Upper-case instrument symbol (eg/ "BTCUSDT"), `None` for all-market streams.
    pub symbol: Option<SmolStr>,
    pub interval: Option<KlineInterval>,
}

impl SubscriptionKey {
    pub fn tickers() -> Self {
        Self {
            kind: StreamKind::Tickers,
            symbol: None,
            interval: None,
        }
    }

    pub fn kline(symbol: &str, interval: KlineInterval) -> Self {
        Self {
            kind: StreamKind::Kline,
            symbol: Some(normalise(symbol)),
            interval: Some(interval),
        }
    }

    pub fn depth(symbol: &str) -> Self {
        Self {
            kind: StreamKind::Depth,
            symbol: Some(normalise(symbol)),
            interval: None,
        }
    }

    pub fn mark_price(symbol: &str) -> Self {
        Self {
            kind: StreamKind::MarkPrice,
            symbol: Some(normalise(symbol)),
            interval: None,
        }
    }

    /// Binance stream name, eg/ "btcusdt@kline_1m".
    pub fn stream_name(&self) -> SmolStr {
        let symbol = self
            .symbol
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        match self.kind {
            StreamKind::Tickers => SmolStr::new_static("!ticker@arr"),
            StreamKind::Kline => format_smolstr!(
                "{symbol}@kline_{}",
                self.interval.unwrap_or_default().as_str()
            ),
            StreamKind::Depth => format_smolstr!("{symbol}@depth20@100ms"),
            StreamKind::MarkPrice => format_smolstr!("{symbol}@markPrice@1s"),
        }
    }

    /// Whether the stream is served by the USD-M futures endpoint rather than spot.
    pub fn is_futures(&self) -> bool {
        self.kind == StreamKind::MarkPrice
    }
}

impl std::fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stream_name())
    }
}

fn normalise(symbol: &str) -> SmolStr {
    SmolStr::from(symbol.trim().to_uppercase())
}
