//! Executes [`Command`]s: stream reconciliation, background fetches and report drafts.

use crate::app::{App, Command, FetchRequest, KLINE_BACKFILL};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use ynance_data::{
    DataError, FetchUpdate, Provider, Secrets, StreamSupervisor,
    report::{ReportDrafter, ReportKind},
    rest::{RestClient, alpha_vantage, binance, coingecko, fear_greed, fred, gemini},
};

/// Capacity of the fetch result channel.
pub const FETCH_CHANNEL_SIZE: usize = 64;

/// Perform one REST request and wrap the outcome for the state owner.
pub async fn run_fetch(client: &RestClient, secrets: &Secrets, request: FetchRequest) -> FetchUpdate {
    match request {
        FetchRequest::CryptoKlines { symbol, interval } => {
            let bars = binance::fetch_klines(client, &symbol, interval, KLINE_BACKFILL).await;
            FetchUpdate::CryptoKlines {
                symbol,
                interval,
                bars,
            }
        }
        FetchRequest::Funding { symbol } => {
            let funding = binance::fetch_funding_rate(client, &symbol).await;
            FetchUpdate::Funding { symbol, funding }
        }
        FetchRequest::Sentiment(market) => FetchUpdate::Sentiment {
            market,
            reading: fear_greed::fetch_index(client, market).await,
        },
        FetchRequest::StockDaily { symbol } => {
            let bars =
                alpha_vantage::fetch_daily(client, &symbol, secrets.key(Provider::AlphaVantage))
                    .await;
            FetchUpdate::StockDaily { symbol, bars }
        }
        FetchRequest::Series { series_id } => {
            let points = fred::fetch_series(client, &series_id, secrets.key(Provider::Fred)).await;
            FetchUpdate::Series { series_id, points }
        }
        FetchRequest::Quote { symbol } => FetchUpdate::Quote(
            gemini::fetch_ticker(client, &symbol, secrets.key(Provider::Gemini)).await,
        ),
        FetchRequest::CoinPrices { ids } => FetchUpdate::CoinPrices(
            coingecko::fetch_prices(client, &ids, secrets.key(Provider::CoinGecko)).await,
        ),
    }
}

/// Side-effect half of the dashboard. Owns the stream supervisor and spawns fetch tasks that
/// report back over a channel, so the [`App`] stays the single owner of dashboard state.
#[derive(Debug)]
pub struct Runtime {
    client: RestClient,
    secrets: Arc<Secrets>,
    drafter: ReportDrafter,
    supervisor: StreamSupervisor,
    fetch_tx: mpsc::Sender<FetchUpdate>,
}

impl Runtime {
    pub fn new(
        client: RestClient,
        secrets: Secrets,
        drafter: ReportDrafter,
        supervisor: StreamSupervisor,
        fetch_tx: mpsc::Sender<FetchUpdate>,
    ) -> Self {
        Self {
            client,
            secrets: Arc::new(secrets),
            drafter,
            supervisor,
            fetch_tx,
        }
    }

    pub fn supervisor(&self) -> &StreamSupervisor {
        &self.supervisor
    }

    /// Execute `commands` in order. Returns `false` once a [`Command::Quit`] is seen.
    pub fn execute(&mut self, app: &mut App, commands: Vec<Command>) -> bool {
        for command in commands {
            match command {
                Command::Quit => return false,
                Command::Reconcile => self.reconcile(app),
                Command::Fetch(request) => self.spawn_fetch(request),
                Command::Draft(kind) => self.spawn_draft(app, kind),
                Command::SaveReport => {
                    if let Err(error) = app.save_selected_report() {
                        warn!(%error, "failed to save report");
                    }
                }
            }
        }
        true
    }

    fn reconcile(&mut self, app: &mut App) {
        let desired = app.desired_subscriptions();
        let cancelled = self.supervisor.retain(&desired);
        let started = desired
            .into_iter()
            .filter(|key| self.supervisor.ensure(key.clone()))
            .count();

        if started > 0 || !cancelled.is_empty() {
            debug!(started, cancelled = cancelled.len(), "subscriptions reconciled");
        }
        app.set_stream_statuses(self.supervisor.statuses());
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let client = self.client.clone();
        let secrets = Arc::clone(&self.secrets);
        let fetch_tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let update = run_fetch(&client, &secrets, request).await;
            if fetch_tx.send(update).await.is_err() {
                debug!("dashboard closed before fetch completed");
            }
        });
    }

    fn spawn_draft(&self, app: &App, kind: ReportKind) {
        let closes = app
            .state
            .index_closes(&app.config.stock_symbols, &app.config.crypto_symbols);
        let drafter = self.drafter.clone();
        let fetch_tx = self.fetch_tx.clone();
        let date = Utc::now().date_naive();

        info!(%kind, indices = closes.len(), "drafting report");
        tokio::spawn(async move {
            let report = drafter.draft(kind, date, &closes).await;
            if fetch_tx.send(FetchUpdate::Report(report)).await.is_err() {
                debug!("dashboard closed before report completed");
            }
        });
    }

    /// Cancel every stream and wait for the connection tasks to exit.
    pub async fn shutdown(&mut self) {
        self.supervisor.shutdown().await;
    }
}

/// Build the report drafter from configuration, logging and degrading on failure.
pub fn build_drafter(app: &App, secrets: &Secrets) -> ReportDrafter {
    match ReportDrafter::from_config(&app.config.llm, secrets.key(Provider::Llm)) {
        Ok(drafter) => drafter,
        Err(error) => {
            warn!(%error, "report generation disabled");
            ReportDrafter::new(None)
        }
    }
}

/// Startup warnings for providers that have no credential.
pub fn credential_warnings(secrets: &Secrets) -> Vec<(Provider, String)> {
    [
        Provider::AlphaVantage,
        Provider::Fred,
        Provider::Gemini,
        Provider::CoinGecko,
        Provider::Llm,
    ]
    .into_iter()
    .filter(|provider| secrets.key(*provider).is_none())
    .map(|provider| (provider, DataError::MissingCredential(provider).warning(provider.as_str())))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ynance_data::{
        DashboardConfig, Fetched, StreamConfig,
        model::SentimentMarket,
        report::ReportSource,
    };

    fn offline_client() -> RestClient {
        // Nothing listens on port 9 locally, so any request that reaches the network fails fast
        let base = "http://127.0.0.1:9".to_string();
        let endpoints = ynance_data::rest::Endpoints {
            alpha_vantage: base.clone(),
            binance_spot: base.clone(),
            binance_futures: base.clone(),
            fred: base.clone(),
            fear_greed: base.clone(),
            gemini: base.clone(),
            coingecko: base,
        };
        RestClient::with_endpoints(endpoints, std::time::Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_run_fetch_without_credentials_is_permanent() {
        let client = offline_client();
        let secrets = Secrets::default();

        let update = run_fetch(
            &client,
            &secrets,
            FetchRequest::StockDaily {
                symbol: "SPY".into(),
            },
        )
        .await;
        match update {
            FetchUpdate::StockDaily { symbol, bars } => {
                assert_eq!(symbol, "SPY");
                assert!(matches!(
                    bars,
                    Fetched::Permanent(DataError::MissingCredential(Provider::AlphaVantage))
                ));
            }
            other => panic!("unexpected update: {other:?}"),
        }

        let update = run_fetch(
            &client,
            &secrets,
            FetchRequest::CoinPrices {
                ids: vec!["bitcoin".into()],
            },
        )
        .await;
        assert!(matches!(
            update,
            FetchUpdate::CoinPrices(Fetched::Permanent(DataError::MissingCredential(
                Provider::CoinGecko
            )))
        ));
    }

    #[tokio::test]
    async fn test_run_fetch_unreachable_is_transient() {
        let update = run_fetch(
            &offline_client(),
            &Secrets::default(),
            FetchRequest::Sentiment(SentimentMarket::Crypto),
        )
        .await;

        match update {
            FetchUpdate::Sentiment { market, reading } => {
                assert_eq!(market, SentimentMarket::Crypto);
                assert!(matches!(reading, Fetched::Transient(_)));
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_draft_command_delivers_fallback_report() {
        let (fetch_tx, mut fetch_rx) = mpsc::channel(FETCH_CHANNEL_SIZE);
        let (supervisor, _stream_rx) = StreamSupervisor::channel(StreamConfig::default());
        let mut app = App::new(DashboardConfig::default());
        let mut runtime = Runtime::new(
            offline_client(),
            Secrets::default(),
            ReportDrafter::new(None),
            supervisor,
            fetch_tx,
        );

        assert!(runtime.execute(&mut app, vec![Command::Draft(ReportKind::Daily)]));
        let update = fetch_rx.recv().await.unwrap();
        app.on_fetch(update);

        let report = app.state.reports().latest().unwrap();
        assert_eq!(report.source, ReportSource::Fallback);
        assert!(!runtime.execute(&mut app, vec![Command::Quit]));
        runtime.shutdown().await;
    }

    #[test]
    fn test_credential_warnings_name_the_secret() {
        let secrets = Secrets::from_json(r#"{"FRED_API_KEY": "abc"}"#).unwrap();
        let warnings = credential_warnings(&secrets);

        assert!(warnings.iter().all(|(provider, _)| *provider != Provider::Fred));
        let (_, alpha) = warnings
            .iter()
            .find(|(provider, _)| *provider == Provider::AlphaVantage)
            .unwrap();
        assert!(alpha.contains("ALPHA_VANTAGE_API_KEY"));
    }
}
