use crate::{
    de::{de_str, de_u64_epoch_ms_as_datetime_utc},
    event::StreamUpdate,
    model::{KlineInterval, PriceBar},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use smol_str::SmolStr;

/// Binance kline stream event.
///
/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#klinecandlestick-streams-for-utc>
/// ```json
/// {
///     "e": "kline",
///     "E": 1672515782136,
///     "s": "BNBBTC",
///     "k": {
///         "t": 1672515780000,
///         "T": 1672515839999,
///         "s": "BNBBTC",
///         "i": "1m",
///         "o": "0.0010",
///         "c": "0.0020",
///         "h": "0.0025",
///         "l": "0.0015",
///         "v": "1000",
///         "n": 100,
///         "x": false
///     }
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BinanceKlineEvent {
    #[serde(rename = "s")]
    pub symbol: SmolStr,
    #[serde(rename = "k")]
    pub kline: BinanceKlineInner,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BinanceKlineInner {
    #[serde(rename = "t", deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
    pub open_time: DateTime<Utc>,
    #[serde(rename = "i", deserialize_with = "de_str")]
    pub interval: KlineInterval,
    #[serde(rename = "o", deserialize_with = "de_str")]
    pub open: f64,
    #[serde(rename = "h", deserialize_with = "de_str")]
    pub high: f64,
    #[serde(rename = "l", deserialize_with = "de_str")]
    pub low: f64,
    #[serde(rename = "c", deserialize_with = "de_str")]
    pub close: f64,
    #[serde(rename = "v", deserialize_with = "de_str")]
    pub volume: f64,
    #[serde(rename = "x")]
    pub closed: bool,
}

impl BinanceKlineEvent {
    pub fn into_update(self) -> StreamUpdate {
        let kline = self.kline;
        StreamUpdate::Kline {
            symbol: self.symbol,
            interval: kline.interval,
            bar: PriceBar::new(
                kline.open_time,
                kline.open,
                kline.high,
                kline.low,
                kline.close,
                kline.volume,
            ),
            closed: kline.closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exchange::binance::parse_message, subscription::SubscriptionKey};

    #[test]
    fn test_parse_kline_event() {
        let text = r#"{
            "e": "kline", "E": 1700000030000, "s": "BTCUSDT",
            "k": {
                "t": 1700000000000, "T": 1700000059999, "s": "BTCUSDT", "i": "1m",
                "f": 100, "L": 200, "o": "37000.00", "c": "37010.50", "h": "37020.00",
                "l": "36990.00", "v": "12.5", "n": 100, "x": true, "q": "462500.0",
                "V": "6.0", "Q": "222000.0", "B": "0"
            }
        }"#;

        let key = SubscriptionKey::kline("BTCUSDT", KlineInterval::Minute1);
        let update = parse_message(&key, text, 20).unwrap().unwrap();

        let StreamUpdate::Kline {
            symbol,
            interval,
            bar,
            closed,
        } = update
        else {
            panic!("expected kline update");
        };
        assert_eq!(symbol, "BTCUSDT");
        assert_eq!(interval, KlineInterval::Minute1);
        assert!(closed);
        assert_eq!(bar.open_time.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(
            (bar.open, bar.high, bar.low, bar.close, bar.volume),
            (37000.0, 37020.0, 36990.0, 37010.5, 12.5)
        );
    }

    #[test]
    fn test_parse_kline_unknown_interval() {
        let text = r#"{"e":"kline","s":"BTCUSDT","k":{"t":0,"i":"3m","o":"1","h":"1","l":"1","c":"1","v":"1","x":false}}"#;
        let key = SubscriptionKey::kline("BTCUSDT", KlineInterval::Minute1);
        assert!(parse_message(&key, text, 20).is_err());
    }
}
