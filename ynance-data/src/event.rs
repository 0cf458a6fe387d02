use crate::{
    fetch::Fetched,
    model::{
        CoinPrice, DepthSnapshot, ExchangeQuote, FundingRate, KlineInterval, PriceBar,
        SentimentMarket, SentimentReading, SeriesPoint, TickerSnapshot,
    },
    report::Report,
};
use smol_str::SmolStr;

/// Normalised update decoded from one inbound stream message.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// Full replacement of the all-market ticker table.
    Tickers(Vec<TickerSnapshot>),
    Kline {
        symbol: SmolStr,
        interval: KlineInterval,
        bar: PriceBar,
        /// Whether the exchange has closed this bar.
        closed: bool,
    },
    Depth {
        symbol: SmolStr,
        depth: DepthSnapshot,
    },
    MarkPrice(FundingRate),
}

/// Completed result of a background REST fetch or report draft.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchUpdate {
    StockDaily {
        symbol: SmolStr,
        bars: Fetched<Vec<PriceBar>>,
    },
    /// REST history used to seed a kline buffer before the stream catches up.
    CryptoKlines {
        symbol: SmolStr,
        interval: KlineInterval,
        bars: Fetched<Vec<PriceBar>>,
    },
    Funding {
        symbol: SmolStr,
        funding: Fetched<FundingRate>,
    },
    Series {
        series_id: SmolStr,
        points: Fetched<Vec<SeriesPoint>>,
    },
    Sentiment {
        market: SentimentMarket,
        reading: Fetched<SentimentReading>,
    },
    Quote(Fetched<ExchangeQuote>),
    CoinPrices(Fetched<Vec<CoinPrice>>),
    Report(Report),
}

impl FetchUpdate {
    /// Data source label used in warnings.
    pub fn source(&self) -> SmolStr {
        match self {
            FetchUpdate::StockDaily { symbol, .. } => smol_str::format_smolstr!("Stocks {symbol}"),
            FetchUpdate::CryptoKlines { symbol, .. } => {
                smol_str::format_smolstr!("Klines {symbol}")
            }
            FetchUpdate::Funding { symbol, .. } => smol_str::format_smolstr!("Funding {symbol}"),
            FetchUpdate::Series { series_id, .. } => {
                smol_str::format_smolstr!("Macro {series_id}")
            }
            FetchUpdate::Sentiment { market, .. } => {
                smol_str::format_smolstr!("Fear & Greed {}", market.as_str())
            }
            FetchUpdate::Quote(_) => SmolStr::new_static("Gemini"),
            FetchUpdate::CoinPrices(_) => SmolStr::new_static("CoinGecko"),
            FetchUpdate::Report(_) => SmolStr::new_static("Report"),
        }
    }
}
