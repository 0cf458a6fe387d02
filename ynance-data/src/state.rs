//! Dashboard application state.
//!
//! [`DashboardState`] is owned by a single task (the UI loop) and only mutated through
//! [`DashboardState::apply`] for stream updates and [`DashboardState::apply_fetch`] for REST and
//! report results.

use crate::{
    event::{FetchUpdate, StreamUpdate},
    fetch::Fetched,
    model::{
        CoinPrice, DepthSnapshot, ExchangeQuote, FundingRate, KlineInterval, PriceBar,
        SentimentMarket, SentimentReading, SeriesPoint, TickerSnapshot, closes,
    },
    report::{Baseline, IndexClose, ReportArchive},
};
use chrono::{DateTime, Utc};
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

/// Maximum bars retained per kline buffer.
pub const MAX_KLINE_BARS: usize = 500;

/// Effect of pushing a bar into a [`KlineBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlineApply {
    Appended,
    Replaced,
    /// Bar is older than the last stored bar.
    Ignored,
}

/// Rolling kline history for one symbol and interval.
///
/// The last bar is updated in place while it is still open; a newer open time starts a new bar.
#[derive(Debug, Clone, PartialEq)]
pub struct KlineBuffer {
    bars: VecDeque<PriceBar>,
    capacity: usize,
    /// Exchange still reports the last bar as open.
    forming: bool,
}

impl Default for KlineBuffer {
    fn default() -> Self {
        Self::new(MAX_KLINE_BARS)
    }
}

impl KlineBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
            forming: false,
        }
    }

    /// Push a streamed bar, recording whether the exchange has closed it.
    pub fn push_streamed(&mut self, bar: PriceBar, closed: bool) -> KlineApply {
        let applied = self.push(bar);
        if applied != KlineApply::Ignored {
            self.forming = !closed;
        }
        applied
    }

    /// Whether the last bar is still open on the exchange.
    pub fn is_forming(&self) -> bool {
        self.forming && !self.bars.is_empty()
    }

    pub fn push(&mut self, bar: PriceBar) -> KlineApply {
        match self.bars.back_mut() {
            Some(last) if bar.open_time == last.open_time => {
                *last = bar;
                KlineApply::Replaced
            }
            Some(last) if bar.open_time < last.open_time => KlineApply::Ignored,
            _ => {
                if self.bars.len() == self.capacity {
                    self.bars.pop_front();
                }
                self.bars.push_back(bar);
                KlineApply::Appended
            }
        }
    }

    /// Merge REST history with whatever the stream has already delivered. Stream bars win on
    /// equal open times.
    pub fn seed(&mut self, history: impl IntoIterator<Item = PriceBar>) {
        let mut merged: BTreeMap<DateTime<Utc>, PriceBar> = history
            .into_iter()
            .map(|bar| (bar.open_time, bar))
            .collect();
        merged.extend(self.bars.drain(..).map(|bar| (bar.open_time, bar)));

        let skip = merged.len().saturating_sub(self.capacity);
        self.bars.extend(merged.into_values().skip(skip));
    }

    pub fn bars(&self) -> impl DoubleEndedIterator<Item = &PriceBar> + ExactSizeIterator {
        self.bars.iter()
    }

    pub fn to_vec(&self) -> Vec<PriceBar> {
        self.bars.iter().copied().collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.back()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// What to do with a slot after a fetch completes.
enum Outcome<T> {
    Store(T),
    Keep,
    Clear,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    tickers: BTreeMap<SmolStr, TickerSnapshot>,
    klines: HashMap<(SmolStr, KlineInterval), KlineBuffer>,
    depth: HashMap<SmolStr, DepthSnapshot>,
    funding: HashMap<SmolStr, FundingRate>,
    stock_daily: HashMap<SmolStr, Vec<PriceBar>>,
    series: BTreeMap<SmolStr, Vec<SeriesPoint>>,
    sentiment: HashMap<SentimentMarket, SentimentReading>,
    quote: Option<ExchangeQuote>,
    coin_prices: Vec<CoinPrice>,
    reports: ReportArchive,
    warnings: BTreeMap<SmolStr, String>,
    last_stream_update: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded stream message. Last update wins per slot.
    pub fn apply(&mut self, update: StreamUpdate) {
        self.last_stream_update = Some(Utc::now());

        match update {
            StreamUpdate::Tickers(tickers) => {
                self.tickers = tickers
                    .into_iter()
                    .map(|ticker| (ticker.symbol.clone(), ticker))
                    .collect();
            }
            StreamUpdate::Kline {
                symbol,
                interval,
                bar,
                closed,
            } => {
                let buffer = self.klines.entry((symbol.clone(), interval)).or_default();
                if buffer.push_streamed(bar, closed) == KlineApply::Ignored {
                    debug!(%symbol, %interval, open_time = %bar.open_time, "dropping out-of-order kline");
                }
            }
            StreamUpdate::Depth { symbol, depth } => {
                self.depth.insert(symbol, depth);
            }
            StreamUpdate::MarkPrice(funding) => {
                self.funding.insert(funding.symbol.clone(), funding);
            }
        }
    }

    /// Apply a completed fetch. Transient failures keep the previous data, permanent failures
    /// clear it. Either way a warning is recorded for the source until it next succeeds.
    pub fn apply_fetch(&mut self, update: FetchUpdate) {
        let source = update.source();

        match update {
            FetchUpdate::StockDaily { symbol, bars } => match self.outcome(source, bars) {
                Outcome::Store(bars) => {
                    self.stock_daily.insert(symbol, bars);
                }
                Outcome::Clear => {
                    self.stock_daily.remove(&symbol);
                }
                Outcome::Keep => {}
            },
            FetchUpdate::CryptoKlines {
                symbol,
                interval,
                bars,
            } => {
                // Stream bars stay regardless of REST failures
                if let Outcome::Store(bars) = self.outcome(source, bars) {
                    self.klines.entry((symbol, interval)).or_default().seed(bars);
                }
            }
            FetchUpdate::Funding { symbol, funding } => match self.outcome(source, funding) {
                Outcome::Store(funding) => {
                    self.funding.insert(symbol, funding);
                }
                Outcome::Clear => {
                    self.funding.remove(&symbol);
                }
                Outcome::Keep => {}
            },
            FetchUpdate::Series { series_id, points } => match self.outcome(source, points) {
                Outcome::Store(points) => {
                    self.series.insert(series_id, points);
                }
                Outcome::Clear => {
                    self.series.remove(&series_id);
                }
                Outcome::Keep => {}
            },
            FetchUpdate::Sentiment { market, reading } => match self.outcome(source, reading) {
                Outcome::Store(reading) => {
                    self.sentiment.insert(market, reading);
                }
                Outcome::Clear => {
                    self.sentiment.remove(&market);
                }
                Outcome::Keep => {}
            },
            FetchUpdate::Quote(quote) => match self.outcome(source, quote) {
                Outcome::Store(quote) => self.quote = Some(quote),
                Outcome::Clear => self.quote = None,
                Outcome::Keep => {}
            },
            FetchUpdate::CoinPrices(prices) => match self.outcome(source, prices) {
                Outcome::Store(prices) => self.coin_prices = prices,
                Outcome::Clear => self.coin_prices.clear(),
                Outcome::Keep => {}
            },
            FetchUpdate::Report(report) => {
                self.warnings.remove(&source);
                self.reports.push(report);
            }
        }
    }

    fn outcome<T>(&mut self, source: SmolStr, fetched: Fetched<T>) -> Outcome<T> {
        if let Some(warning) = fetched.warning(&source) {
            self.warnings.insert(source, warning);
            return match fetched {
                Fetched::Permanent(_) => Outcome::Clear,
                _ => Outcome::Keep,
            };
        }

        self.warnings.remove(&source);
        match fetched {
            Fetched::Ready(data) => Outcome::Store(data),
            _ => Outcome::Keep,
        }
    }

    /// Record a warning that did not come from a fetch result.
    pub fn warn(&mut self, source: impl Into<SmolStr>, warning: impl Into<String>) {
        self.warnings.insert(source.into(), warning.into());
    }

    pub fn tickers(&self) -> impl Iterator<Item = &TickerSnapshot> {
        self.tickers.values()
    }

    pub fn ticker(&self, symbol: &str) -> Option<&TickerSnapshot> {
        self.tickers.get(symbol)
    }

    pub fn klines(&self, symbol: &str, interval: KlineInterval) -> Option<&KlineBuffer> {
        self.klines.get(&(SmolStr::new(symbol), interval))
    }

    pub fn depth(&self, symbol: &str) -> Option<&DepthSnapshot> {
        self.depth.get(symbol)
    }

    pub fn funding(&self, symbol: &str) -> Option<&FundingRate> {
        self.funding.get(symbol)
    }

    pub fn stock_daily(&self, symbol: &str) -> Option<&[PriceBar]> {
        self.stock_daily.get(symbol).map(Vec::as_slice)
    }

    pub fn series(&self) -> impl Iterator<Item = (&SmolStr, &Vec<SeriesPoint>)> {
        self.series.iter()
    }

    pub fn series_points(&self, series_id: &str) -> Option<&[SeriesPoint]> {
        self.series.get(series_id).map(Vec::as_slice)
    }

    pub fn sentiment(&self, market: SentimentMarket) -> Option<&SentimentReading> {
        self.sentiment.get(&market)
    }

    pub fn quote(&self) -> Option<&ExchangeQuote> {
        self.quote.as_ref()
    }

    pub fn coin_prices(&self) -> &[CoinPrice] {
        &self.coin_prices
    }

    pub fn reports(&self) -> &ReportArchive {
        &self.reports
    }

    pub fn warnings(&self) -> impl Iterator<Item = &String> {
        self.warnings.values()
    }

    /// Current warning for one data source, eg/ "Stocks SPY".
    pub fn warning(&self, source: &str) -> Option<&str> {
        self.warnings.get(source).map(String::as_str)
    }

    pub fn last_stream_update(&self) -> Option<DateTime<Utc>> {
        self.last_stream_update
    }

    /// Latest close and previous close for each tracked stock and crypto symbol, in the order
    /// given. Symbols without data are skipped.
    pub fn index_closes<S: AsRef<str>>(&self, stocks: &[S], crypto: &[S]) -> Vec<IndexClose> {
        let stock_closes = stocks.iter().filter_map(|symbol| {
            let bars = self.stock_daily(symbol.as_ref())?;
            let closes = closes(bars);
            let (&close, rest) = closes.split_last()?;
            Some(IndexClose::new(
                SmolStr::new(symbol.as_ref()),
                close,
                rest.last().copied(),
            ))
        });

        let crypto_closes = crypto.iter().filter_map(|symbol| {
            let ticker = self.ticker(symbol.as_ref())?;
            let previous = ticker.last_price - ticker.change;
            Some(
                IndexClose::new(
                    ticker.symbol.clone(),
                    ticker.last_price,
                    (previous > 0.0).then_some(previous),
                )
                .with_baseline(Baseline::DayAgo),
            )
        });

        stock_closes.chain(crypto_closes).collect()
    }
}
