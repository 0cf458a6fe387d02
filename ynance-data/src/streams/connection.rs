use super::{
    backoff::{Backoff, BackoffConfig},
    timeout::{DEFAULT_WS_READ_TIMEOUT, TimeoutStream},
};
use crate::{
    event::StreamUpdate, exchange::binance::StreamEndpoints, exchange::binance::parse_message,
    subscription::SubscriptionKey,
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Lifecycle of one stream connection, published on a `watch` channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Subscribed,
    Error(String),
    Backoff {
        attempt: u32,
        delay: Duration,
    },
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Subscribed => "live",
            ConnectionState::Error(_) => "error",
            ConnectionState::Backoff { .. } => "backoff",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Subscribed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Error(reason) => write!(f, "error: {reason}"),
            ConnectionState::Backoff { attempt, delay } => {
                write!(f, "retry #{attempt} in {}s", delay.as_secs())
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Stream connection configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoints: StreamEndpoints,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Socket is considered dead after this long without a frame
    pub read_timeout: Duration,
    pub backoff: BackoffConfig,
    /// Number of book levels kept per depth side
    pub depth_limit: usize,
    /// Maximum channel buffer size for updates
    pub channel_buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoints: StreamEndpoints::default(),
            ping_interval: Duration::from_secs(30),
            read_timeout: DEFAULT_WS_READ_TIMEOUT,
            backoff: BackoffConfig::default(),
            depth_limit: 20,
            channel_buffer_size: 1000,
        }
    }
}

impl StreamConfig {
    pub fn with_endpoints(mut self, endpoints: StreamEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit.max(1);
        self
    }

    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

/// Why a single connected session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Cancelled,
    ReceiverDropped,
    Disconnected(String),
}

/// Resolves once cancellation is requested or the supervisor is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

/// Run one subscription until cancelled, reconnecting with exponential backoff.
///
/// State transitions: `Connecting` -> `Subscribed` -> (`Error` -> `Backoff` -> `Connecting`)*,
/// ending in `Disconnected`.
pub async fn run_connection(
    key: SubscriptionKey,
    config: StreamConfig,
    update_tx: mpsc::Sender<StreamUpdate>,
    state_tx: watch::Sender<ConnectionState>,
    mut cancel: watch::Receiver<bool>,
) {
    let url = match config.endpoints.url(&key) {
        Ok(url) => url,
        Err(error) => {
            error!(%key, %error, "invalid stream url");
            state_tx.send_replace(ConnectionState::Error(error.to_string()));
            return;
        }
    };

    info!(%key, %url, "starting stream");
    let mut backoff = Backoff::new(config.backoff);

    loop {
        if *cancel.borrow() {
            break;
        }

        state_tx.send_replace(ConnectionState::Connecting);

        let connected = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => break,
            connected = connect_async(url.as_str()) => connected,
        };

        let reason = match connected {
            Ok((websocket, _)) => {
                info!(%key, "stream subscribed");
                state_tx.send_replace(ConnectionState::Subscribed);
                backoff.reset();

                match run_session(&key, &config, websocket, &update_tx, &mut cancel).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::ReceiverDropped => {
                        warn!(%key, "update receiver dropped, stopping stream");
                        break;
                    }
                    SessionEnd::Disconnected(reason) => reason,
                }
            }
            Err(error) => {
                error!(%key, %error, "failed to connect");
                error.to_string()
            }
        };

        state_tx.send_replace(ConnectionState::Error(reason));

        let delay = backoff.next_delay();
        state_tx.send_replace(ConnectionState::Backoff {
            attempt: backoff.attempt(),
            delay,
        });
        debug!(%key, ?delay, "waiting before reconnecting");

        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    state_tx.send_replace(ConnectionState::Disconnected);
    info!(%key, "stream stopped");
}

async fn run_session<S>(
    key: &SubscriptionKey,
    config: &StreamConfig,
    websocket: tokio_tungstenite::WebSocketStream<S>,
    update_tx: &mpsc::Sender<StreamUpdate>,
    cancel: &mut watch::Receiver<bool>,
) -> SessionEnd
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, read) = websocket.split();
    let mut read = TimeoutStream::new(read, config.read_timeout);

    let mut ping = tokio::time::interval(config.ping_interval);
    // First tick completes immediately
    ping.tick().await;

    let end = loop {
        let message = tokio::select! {
            biased;
            _ = cancelled(cancel) => break SessionEnd::Cancelled,
            _ = ping.tick() => {
                if let Err(error) = write.send(Message::Ping(Vec::new().into())).await {
                    break SessionEnd::Disconnected(format!("ping failed: {error}"));
                }
                continue;
            }
            message = read.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => match parse_message(key, text.as_str(), config.depth_limit) {
                Ok(Some(update)) => {
                    if update_tx.send(update).await.is_err() {
                        break SessionEnd::ReceiverDropped;
                    }
                }
                Ok(None) => {}
                Err(error) => debug!(%key, %error, "dropping malformed message"),
            },
            Some(Ok(Message::Close(frame))) => {
                info!(%key, ?frame, "server closed connection");
                break SessionEnd::Disconnected("closed by server".to_string());
            }
            // Pong replies are queued by tungstenite and flushed on the next write
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                error!(%key, %error, "WebSocket error");
                break SessionEnd::Disconnected(error.to_string());
            }
            None if read.timed_out() => {
                break SessionEnd::Disconnected("read timeout".to_string());
            }
            None => break SessionEnd::Disconnected("stream ended".to_string()),
        }
    };

    if end == SessionEnd::Cancelled {
        let _ = write.send(Message::Close(None)).await;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KlineInterval;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    fn kline_frame(open_time: i64) -> String {
        format!(
            r#"{{"e":"kline","E":{event},"s":"BTCUSDT","k":{{"t":{open_time},"T":{close_time},"s":"BTCUSDT","i":"1m","o":"100.0","c":"101.0","h":"102.0","l":"99.0","v":"1.5","n":10,"x":true}}}}"#,
            event = open_time + 30_000,
            close_time = open_time + 59_999,
        )
    }

    /// Local server that sends one kline and one malformed frame per connection, then closes.
    async fn spawn_kline_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let mut session = 0i64;
            while let Ok((socket, _)) = listener.accept().await {
                let Ok(mut websocket) = accept_async(socket).await else {
                    continue;
                };
                let open_time = 1_700_000_000_000 + session * 60_000;
                session += 1;
                let _ = websocket.send(Message::Text(kline_frame(open_time).into())).await;
                let _ = websocket.send(Message::Text("not json".into())).await;
                let _ = websocket.close(None).await;
                while let Some(Ok(_)) = websocket.next().await {}
            }
        });

        port
    }

    #[test]
    fn test_config_builder() {
        let config = StreamConfig::default()
            .with_ping_interval(Duration::from_secs(15))
            .with_read_timeout(Duration::from_secs(5))
            .with_depth_limit(0)
            .with_channel_buffer_size(500);

        assert_eq!(config.ping_interval, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.depth_limit, 1);
        assert_eq!(config.channel_buffer_size, 500);
    }

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(120));
        assert_eq!(config.backoff, BackoffConfig::default());
        assert_eq!(config.depth_limit, 20);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Subscribed.to_string(), "live");
        assert_eq!(
            ConnectionState::Backoff {
                attempt: 3,
                delay: Duration::from_secs(4)
            }
            .to_string(),
            "retry #3 in 4s"
        );
        assert_eq!(
            ConnectionState::Error("refused".into()).to_string(),
            "error: refused"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_enters_backoff_and_stops_on_cancel() {
        init_logging();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = StreamConfig::default().with_endpoints(StreamEndpoints {
            spot: format!("ws://127.0.0.1:{port}/ws"),
            futures: format!("ws://127.0.0.1:{port}/ws"),
        });
        let (update_tx, _update_rx) = mpsc::channel(8);
        let (state_tx, mut state_rx) = watch::channel(ConnectionState::default());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(run_connection(
            SubscriptionKey::tickers(),
            config,
            update_tx,
            state_tx,
            cancel_rx,
        ));

        let state = tokio::time::timeout(
            Duration::from_secs(5),
            state_rx.wait_for(|state| matches!(state, ConnectionState::Backoff { .. })),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(
            state,
            ConnectionState::Backoff {
                attempt: 1,
                delay: Duration::from_secs(1)
            }
        );

        cancel_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_live_session_reconnects_after_server_close() {
        init_logging();
        let port = spawn_kline_server().await;

        let config = StreamConfig::default()
            .with_endpoints(StreamEndpoints {
                spot: format!("ws://127.0.0.1:{port}/ws"),
                futures: format!("ws://127.0.0.1:{port}/ws"),
            })
            .with_backoff(BackoffConfig {
                initial: Duration::from_millis(200),
                max: Duration::from_secs(1),
                factor: 2,
            });
        let (update_tx, mut update_rx) = mpsc::channel(8);
        let (state_tx, mut state_rx) = watch::channel(ConnectionState::default());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(run_connection(
            SubscriptionKey::kline("BTCUSDT", KlineInterval::Minute1),
            config,
            update_tx,
            state_tx,
            cancel_rx,
        ));

        let mut open_times = Vec::new();
        for _ in 0..2 {
            let update = tokio::time::timeout(Duration::from_secs(5), update_rx.recv())
                .await
                .unwrap()
                .unwrap();
            let StreamUpdate::Kline { bar, closed, .. } = update else {
                panic!("expected kline update");
            };
            assert!(closed);
            assert_eq!(bar.close, 101.0);
            open_times.push(bar.open_time.timestamp_millis());

            // Every session subscribed before the server closed it, so backoff restarts at 1
            let state = tokio::time::timeout(
                Duration::from_secs(5),
                state_rx.wait_for(|state| matches!(state, ConnectionState::Backoff { .. })),
            )
            .await
            .unwrap()
            .unwrap()
            .clone();
            assert_eq!(
                state,
                ConnectionState::Backoff {
                    attempt: 1,
                    delay: Duration::from_millis(200)
                }
            );
        }
        assert_eq!(open_times, vec![1_700_000_000_000, 1_700_000_060_000]);

        cancel_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
    }
}
