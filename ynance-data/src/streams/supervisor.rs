use super::connection::{ConnectionState, StreamConfig, run_connection};
use crate::{event::StreamUpdate, subscription::SubscriptionKey};
use std::collections::{BTreeMap, HashSet};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

#[derive(Debug)]
struct SupervisedStream {
    cancel: watch::Sender<bool>,
    state: watch::Receiver<ConnectionState>,
    handle: JoinHandle<()>,
}

impl SupervisedStream {
    fn cancel(&self) {
        self.cancel.send_replace(true);
    }
}

/// Owns one connection task per [`SubscriptionKey`].
///
/// Every task publishes into the same update channel. Keys are started at most once, so
/// repeatedly reconciling the same selection never opens duplicate sockets.
#[derive(Debug)]
pub struct StreamSupervisor {
    config: StreamConfig,
    update_tx: mpsc::Sender<StreamUpdate>,
    streams: BTreeMap<SubscriptionKey, SupervisedStream>,
}

impl StreamSupervisor {
    pub fn new(config: StreamConfig, update_tx: mpsc::Sender<StreamUpdate>) -> Self {
        Self {
            config,
            update_tx,
            streams: BTreeMap::new(),
        }
    }

    /// Convenience constructor that also creates the update channel.
    pub fn channel(config: StreamConfig) -> (Self, mpsc::Receiver<StreamUpdate>) {
        let (update_tx, update_rx) = mpsc::channel(config.channel_buffer_size.max(1));
        (Self::new(config, update_tx), update_rx)
    }

    /// Start a subscription unless one is already running for `key`.
    ///
    /// Returns `true` if a new task was spawned. A task that has exited is replaced.
    pub fn ensure(&mut self, key: SubscriptionKey) -> bool {
        if let Some(stream) = self.streams.get(&key) {
            if !stream.handle.is_finished() {
                return false;
            }
            debug!(%key, "replacing finished stream task");
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let handle = tokio::spawn(run_connection(
            key.clone(),
            self.config.clone(),
            self.update_tx.clone(),
            state_tx,
            cancel_rx,
        ));

        info!(%key, "subscription started");
        self.streams.insert(
            key,
            SupervisedStream {
                cancel: cancel_tx,
                state: state_rx,
                handle,
            },
        );
        true
    }

    /// Cancel every subscription whose key is not in `keys`. Returns the cancelled keys.
    pub fn retain<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a SubscriptionKey>,
    ) -> Vec<SubscriptionKey> {
        let keep: HashSet<&SubscriptionKey> = keys.into_iter().collect();

        let stale: Vec<SubscriptionKey> = self
            .streams
            .keys()
            .filter(|key| !keep.contains(key))
            .cloned()
            .collect();

        for key in &stale {
            if let Some(stream) = self.streams.remove(key) {
                stream.cancel();
                info!(%key, "subscription cancelled");
            }
        }

        stale
    }

    /// Cancel all subscriptions and wait for their tasks to exit.
    pub async fn shutdown(&mut self) {
        let streams = std::mem::take(&mut self.streams);
        for stream in streams.values() {
            stream.cancel();
        }
        for (key, stream) in streams {
            if let Err(error) = stream.handle.await {
                debug!(%key, %error, "stream task ended abnormally");
            }
        }
        info!("all subscriptions stopped");
    }

    /// Latest connection state of every running subscription, ordered by key.
    pub fn statuses(&self) -> Vec<(SubscriptionKey, ConnectionState)> {
        self.streams
            .iter()
            .map(|(key, stream)| (key.clone(), stream.state.borrow().clone()))
            .collect()
    }

    pub fn is_running(&self, key: &SubscriptionKey) -> bool {
        self.streams
            .get(key)
            .is_some_and(|stream| !stream.handle.is_finished())
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl Drop for StreamSupervisor {
    fn drop(&mut self) {
        for stream in self.streams.values() {
            stream.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exchange::binance::StreamEndpoints, model::KlineInterval};

    fn unreachable_config() -> StreamConfig {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        StreamConfig::default().with_endpoints(StreamEndpoints {
            spot: format!("ws://127.0.0.1:{port}/ws"),
            futures: format!("ws://127.0.0.1:{port}/ws"),
        })
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent_per_key() {
        let (mut supervisor, _update_rx) = StreamSupervisor::channel(unreachable_config());
        let kline = SubscriptionKey::kline("BTCUSDT", KlineInterval::Minute1);

        assert!(supervisor.ensure(kline.clone()));
        assert!(!supervisor.ensure(kline.clone()));
        assert!(supervisor.ensure(SubscriptionKey::depth("BTCUSDT")));
        assert_eq!(supervisor.len(), 2);
        assert!(supervisor.is_running(&kline));

        supervisor.shutdown().await;
        assert!(supervisor.is_empty());
    }

    #[tokio::test]
    async fn test_retain_cancels_unselected_keys() {
        let (mut supervisor, _update_rx) = StreamSupervisor::channel(unreachable_config());
        let btc = SubscriptionKey::depth("BTCUSDT");
        let eth = SubscriptionKey::depth("ETHUSDT");
        supervisor.ensure(btc.clone());
        supervisor.ensure(eth.clone());
        supervisor.ensure(SubscriptionKey::tickers());

        let cancelled = supervisor.retain([&SubscriptionKey::tickers(), &eth]);

        assert_eq!(cancelled, vec![btc.clone()]);
        assert!(!supervisor.is_running(&btc));
        assert!(supervisor.is_running(&eth));

        let keys: Vec<SubscriptionKey> = supervisor
            .statuses()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys.len(), 2);

        supervisor.shutdown().await;
    }
}
