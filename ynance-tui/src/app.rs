//! Dashboard view model: tab and symbol selection, key handling and the commands they produce.
//!
//! [`App`] never performs I/O. Key presses become [`Command`]s that the runtime executes, and
//! results flow back in through [`App::on_stream`] and [`App::on_fetch`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use smol_str::SmolStr;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use ynance_data::{
    ConnectionState, DashboardConfig, DashboardState, DataError, FetchUpdate, StreamUpdate,
    SubscriptionKey,
    model::{KlineInterval, SentimentMarket},
    report::{Report, ReportKind},
};

/// Number of klines requested to seed a chart before the stream catches up.
pub const KLINE_BACKFILL: u16 = 200;

/// How long a status message stays on screen.
pub const STATUS_TTL: Duration = Duration::from_secs(8);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Tab {
    #[default]
    Crypto,
    Stocks,
    Macro,
    Report,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Crypto, Tab::Stocks, Tab::Macro, Tab::Report];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Crypto => "Crypto",
            Tab::Stocks => "Stocks",
            Tab::Macro => "Macro",
            Tab::Report => "Report",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// One REST fetch the runtime should perform in the background.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchRequest {
    CryptoKlines {
        symbol: SmolStr,
        interval: KlineInterval,
    },
    Funding {
        symbol: SmolStr,
    },
    Sentiment(SentimentMarket),
    StockDaily {
        symbol: SmolStr,
    },
    Series {
        series_id: SmolStr,
    },
    /// Gemini ticker for the selected crypto asset.
    Quote {
        symbol: SmolStr,
    },
    CoinPrices {
        ids: Vec<SmolStr>,
    },
}

/// Side effect requested by the view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Bring running stream subscriptions in line with [`App::desired_subscriptions`].
    Reconcile,
    Fetch(FetchRequest),
    Draft(ReportKind),
    SaveReport,
}

/// Dashboard view model.
#[derive(Debug)]
pub struct App {
    pub config: DashboardConfig,
    pub state: DashboardState,
    pub tab: Tab,
    pub interval: KlineInterval,
    crypto_index: usize,
    stock_index: usize,
    series_index: usize,
    report_index: usize,
    drafting: Option<ReportKind>,
    status: Option<(String, Instant)>,
    stream_statuses: Vec<(SubscriptionKey, ConnectionState)>,
}

impl App {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            interval: config.kline_interval,
            config,
            state: DashboardState::new(),
            tab: Tab::default(),
            crypto_index: 0,
            stock_index: 0,
            series_index: 0,
            report_index: 0,
            drafting: None,
            status: None,
            stream_statuses: Vec::new(),
        }
    }

    pub fn selected_crypto(&self) -> Option<&SmolStr> {
        self.config.crypto_symbols.get(self.crypto_index)
    }

    pub fn selected_stock(&self) -> Option<&SmolStr> {
        self.config.stock_symbols.get(self.stock_index)
    }

    pub fn selected_series(&self) -> Option<&SmolStr> {
        self.config.fred_series.get(self.series_index)
    }

    /// Report currently highlighted in the archive list.
    pub fn selected_report(&self) -> Option<&Report> {
        self.state.reports().get(self.report_index)
    }

    pub fn report_index(&self) -> usize {
        self.report_index
    }

    pub fn drafting(&self) -> Option<ReportKind> {
        self.drafting
    }

    /// Latest status message, until it expires.
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|(_, set_at)| set_at.elapsed() < STATUS_TTL)
            .map(|(status, _)| status.as_str())
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some((status.into(), Instant::now()));
    }

    pub fn stream_statuses(&self) -> &[(SubscriptionKey, ConnectionState)] {
        &self.stream_statuses
    }

    pub fn set_stream_statuses(&mut self, statuses: Vec<(SubscriptionKey, ConnectionState)>) {
        self.stream_statuses = statuses;
    }

    /// Streams that should be running for the current selection.
    pub fn desired_subscriptions(&self) -> Vec<SubscriptionKey> {
        let mut keys = vec![SubscriptionKey::tickers()];
        if let Some(symbol) = self.selected_crypto() {
            keys.push(SubscriptionKey::kline(symbol, self.interval));
            keys.push(SubscriptionKey::depth(symbol));
            keys.push(SubscriptionKey::mark_price(symbol));
        }
        keys
    }

    /// REST fetches backing the current tab.
    pub fn fetch_requests(&self) -> Vec<FetchRequest> {
        match self.tab {
            Tab::Crypto => {
                let mut requests = Vec::new();
                if let Some(symbol) = self.selected_crypto() {
                    requests.push(FetchRequest::CryptoKlines {
                        symbol: symbol.clone(),
                        interval: self.interval,
                    });
                    requests.push(FetchRequest::Funding {
                        symbol: symbol.clone(),
                    });
                    requests.push(FetchRequest::Quote {
                        symbol: gemini_symbol(symbol),
                    });
                }
                requests.push(FetchRequest::Sentiment(SentimentMarket::Crypto));
                requests.push(FetchRequest::CoinPrices {
                    ids: self
                        .config
                        .crypto_symbols
                        .iter()
                        .map(|symbol| coingecko_id(symbol))
                        .collect(),
                });
                requests
            }
            Tab::Stocks => {
                let mut requests: Vec<FetchRequest> = self
                    .selected_stock()
                    .map(|symbol| FetchRequest::StockDaily {
                        symbol: symbol.clone(),
                    })
                    .into_iter()
                    .collect();
                requests.push(FetchRequest::Sentiment(SentimentMarket::Stock));
                requests
            }
            Tab::Macro => self
                .config
                .fred_series
                .iter()
                .map(|series_id| FetchRequest::Series {
                    series_id: series_id.clone(),
                })
                .collect(),
            // Report prompts use every tracked stock's latest close
            Tab::Report => self
                .config
                .stock_symbols
                .iter()
                .filter(|symbol| self.state.stock_daily(symbol).is_none())
                .map(|symbol| FetchRequest::StockDaily {
                    symbol: symbol.clone(),
                })
                .collect(),
        }
    }

    /// Reconcile streams and refetch everything the current tab shows.
    pub fn refresh(&self) -> Vec<Command> {
        std::iter::once(Command::Reconcile)
            .chain(self.fetch_requests().into_iter().map(Command::Fetch))
            .collect()
    }

    fn select_tab(&mut self, tab: Tab) -> Vec<Command> {
        if self.tab == tab {
            return Vec::new();
        }
        self.tab = tab;
        self.status = None;
        self.refresh()
    }

    fn cycle_selection(&mut self, forward: bool) -> Vec<Command> {
        let (index, len) = match self.tab {
            Tab::Crypto => (&mut self.crypto_index, self.config.crypto_symbols.len()),
            Tab::Stocks => (&mut self.stock_index, self.config.stock_symbols.len()),
            Tab::Macro => (&mut self.series_index, self.config.fred_series.len()),
            Tab::Report => (&mut self.report_index, self.state.reports().len()),
        };

        if len < 2 {
            return Vec::new();
        }
        *index = if forward {
            (*index + 1) % len
        } else {
            (*index + len - 1) % len
        };

        match self.tab {
            Tab::Crypto | Tab::Stocks => self.refresh(),
            Tab::Macro | Tab::Report => Vec::new(),
        }
    }

    fn draft(&mut self, kind: ReportKind) -> Vec<Command> {
        if let Some(pending) = self.drafting {
            self.set_status(format!("{pending} report is still being drafted"));
            return Vec::new();
        }
        self.drafting = Some(kind);
        self.set_status(format!("drafting {kind} report..."));
        vec![Command::Draft(kind)]
    }

    /// Translate a key press into commands.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => vec![Command::Quit],
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![Command::Quit]
            }
            KeyCode::Tab => self.select_tab(self.tab.next()),
            KeyCode::Char(digit @ '1'..='4') => {
                let index = digit as usize - '1' as usize;
                self.select_tab(Tab::ALL[index])
            }
            KeyCode::Right => self.cycle_selection(true),
            KeyCode::Left => self.cycle_selection(false),
            KeyCode::Char('i') => {
                self.interval = self.interval.next();
                self.set_status(format!("interval {}", self.interval));
                self.refresh()
            }
            KeyCode::Char('r') => {
                self.set_status("refreshing...");
                self.refresh()
            }
            KeyCode::Char('g') => self.draft(ReportKind::Daily),
            KeyCode::Char('w') => self.draft(ReportKind::Weekly),
            KeyCode::Char('s') => vec![Command::SaveReport],
            _ => Vec::new(),
        }
    }

    pub fn on_stream(&mut self, update: StreamUpdate) {
        self.state.apply(update);
    }

    pub fn on_fetch(&mut self, update: FetchUpdate) {
        if let FetchUpdate::Report(report) = &update {
            self.drafting = None;
            self.report_index = 0;
            self.set_status(format!("{} report ready", report.kind));
        }
        self.state.apply_fetch(update);
    }

    /// Save the highlighted report into the configured report directory.
    pub fn save_selected_report(&mut self) -> Result<PathBuf, DataError> {
        let result = match self.selected_report() {
            Some(report) => report.save(&self.config.report_dir),
            None => Err(DataError::Config("no report to save, press g to draft one".to_string())),
        };

        self.set_status(match &result {
            Ok(path) => format!("saved {}", path.display()),
            Err(error) => format!("save failed: {error}"),
        });
        result
    }
}

/// Quote currencies stripped when mapping exchange symbols to assets.
const QUOTE_CURRENCIES: [&str; 5] = ["USDT", "USDC", "FDUSD", "BUSD", "USD"];

/// Base asset of a Binance symbol, eg/ "BTCUSDT" -> "BTC".
pub fn base_asset(symbol: &str) -> &str {
    QUOTE_CURRENCIES
        .iter()
        .find_map(|quote| symbol.strip_suffix(quote).filter(|base| !base.is_empty()))
        .unwrap_or(symbol)
}

/// Gemini ticker symbol for a Binance symbol, eg/ "BTCUSDT" -> "btcusd".
pub fn gemini_symbol(symbol: &str) -> SmolStr {
    smol_str::format_smolstr!("{}usd", base_asset(symbol).to_lowercase())
}

/// CoinGecko coin id for a Binance symbol.
pub fn coingecko_id(symbol: &str) -> SmolStr {
    match base_asset(symbol) {
        "BTC" => SmolStr::new_static("bitcoin"),
        "ETH" => SmolStr::new_static("ethereum"),
        "SOL" => SmolStr::new_static("solana"),
        "BNB" => SmolStr::new_static("binancecoin"),
        "XRP" => SmolStr::new_static("ripple"),
        "ADA" => SmolStr::new_static("cardano"),
        "DOGE" => SmolStr::new_static("dogecoin"),
        other => SmolStr::from(other.to_lowercase()),
    }
}
