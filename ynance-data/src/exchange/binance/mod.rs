use crate::{
    error::DataError,
    event::StreamUpdate,
    subscription::{StreamKind, SubscriptionKey},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Order book levels for the partial depth stream.
pub mod depth;

/// Kline / candlestick stream.
pub mod kline;

/// Futures mark price and funding stream.
pub mod mark_price;

/// All-market rolling 24h ticker stream.
pub mod ticker;

/// Binance spot market stream base url.
///
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams>
pub const BASE_URL_BINANCE_SPOT_WS: &str = "wss://stream.binance.com:9443/ws";

/// Binance USD-M futures market stream base url.
///
/// See docs: <https://developers.binance.com/docs/derivatives/usds-margined-futures/websocket-market-streams>
pub const BASE_URL_BINANCE_FUTURES_WS: &str = "wss://fstream.binance.com/ws";

/// Base URLs of the Binance stream endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoints {
    pub spot: String,
    pub futures: String,
}

impl Default for StreamEndpoints {
    fn default() -> Self {
        Self {
            spot: BASE_URL_BINANCE_SPOT_WS.to_string(),
            futures: BASE_URL_BINANCE_FUTURES_WS.to_string(),
        }
    }
}

impl StreamEndpoints {
    /// Raw stream URL for a subscription, eg/ "wss://stream.binance.com:9443/ws/btcusdt@kline_1m".
    pub fn url(&self, key: &SubscriptionKey) -> Result<Url, DataError> {
        let base = if key.is_futures() { &self.futures } else { &self.spot };
        let url = format!("{}/{}", base.trim_end_matches('/'), key.stream_name());
        Url::parse(&url).map_err(DataError::from)
    }
}

/// Decode one text frame received on the stream identified by `key`.
///
/// Returns `Ok(None)` for control frames (eg/ subscription acknowledgements). Frames wrapped in
/// the combined-stream envelope (`{"stream": .., "data": ..}`) are unwrapped first.
pub fn parse_message(
    key: &SubscriptionKey,
    text: &str,
    depth_limit: usize,
) -> Result<Option<StreamUpdate>, DataError> {
    let mut value: Value = serde_json::from_str(text)?;

    if value.get("stream").is_some() {
        if let Some(data) = value.get_mut("data") {
            value = data.take();
        }
    }

    if value.get("result").is_some() && value.get("id").is_some() {
        return Ok(None);
    }

    let update = match key.kind {
        StreamKind::Tickers => {
            let tickers: Vec<ticker::BinanceTicker> = from_value(value)?;
            StreamUpdate::Tickers(tickers.into_iter().map(Into::into).collect())
        }
        StreamKind::Kline => from_value::<kline::BinanceKlineEvent>(value)?.into_update(),
        StreamKind::Depth => {
            let symbol = key.symbol.clone().unwrap_or_default();
            from_value::<depth::BinanceDepth>(value)?.into_update(symbol, depth_limit)
        }
        StreamKind::MarkPrice => {
            StreamUpdate::MarkPrice(from_value::<mark_price::BinanceMarkPrice>(value)?.into())
        }
    };

    Ok(Some(update))
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, DataError> {
    serde_json::from_value(value).map_err(DataError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KlineInterval;

    #[test]
    fn test_stream_urls() {
        let endpoints = StreamEndpoints::default();

        assert_eq!(
            endpoints
                .url(&SubscriptionKey::kline("BTCUSDT", KlineInterval::Minute1))
                .unwrap()
                .as_str(),
            "wss://stream.binance.com:9443/ws/btcusdt@kline_1m"
        );
        assert_eq!(
            endpoints
                .url(&SubscriptionKey::mark_price("BTCUSDT"))
                .unwrap()
                .as_str(),
            "wss://fstream.binance.com/ws/btcusdt@markPrice@1s"
        );
    }

    #[test]
    fn test_parse_message_control_and_malformed() {
        let key = SubscriptionKey::depth("BTCUSDT");

        assert_eq!(
            parse_message(&key, r#"{"result":null,"id":1}"#, 20).unwrap(),
            None
        );
        assert!(parse_message(&key, "not json", 20).is_err());
        assert!(parse_message(&key, r#"{"lastUpdateId":"x"}"#, 20).is_err());
        assert!(parse_message(&SubscriptionKey::tickers(), r#"{"e":"24hrTicker"}"#, 20).is_err());
    }

    #[test]
    fn test_parse_message_combined_envelope() {
        let key = SubscriptionKey::depth("BTCUSDT");
        let text = r#"{
            "stream": "btcusdt@depth20@100ms",
            "data": {"lastUpdateId": 5, "bids": [["100.0", "1.0"]], "asks": [["101.0", "2.0"]]}
        }"#;

        let Some(StreamUpdate::Depth { symbol, depth }) = parse_message(&key, text, 20).unwrap()
        else {
            panic!("expected depth update");
        };
        assert_eq!(symbol, "BTCUSDT");
        assert_eq!(depth.last_update_id, 5);
    }
}
