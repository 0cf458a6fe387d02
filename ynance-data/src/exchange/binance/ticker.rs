use crate::{de::de_str, model::TickerSnapshot};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Binance rolling 24h ticker, one element of the `!ticker@arr` payload.
///
/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#all-market-rolling-window-statistics-streams>
/// ```json
/// {
///     "e": "24hrTicker",
///     "E": 1672515782136,
///     "s": "BNBBTC",
///     "p": "0.0015",
///     "P": "250.00",
///     "w": "0.0018",
///     "c": "0.0025",
///     "o": "0.0010",
///     "h": "0.0025",
///     "l": "0.0010",
///     "v": "10000",
///     "q": "18"
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BinanceTicker {
    #[serde(rename = "s")]
    pub symbol: SmolStr,
    #[serde(rename = "c", deserialize_with = "de_str")]
    pub last_price: f64,
    #[serde(rename = "v", deserialize_with = "de_str")]
    pub volume: f64,
    #[serde(rename = "p", deserialize_with = "de_str")]
    pub price_change: f64,
    #[serde(rename = "P", deserialize_with = "de_str")]
    pub price_change_pct: f64,
}

impl From<BinanceTicker> for TickerSnapshot {
    fn from(ticker: BinanceTicker) -> Self {
        Self {
            symbol: ticker.symbol,
            last_price: ticker.last_price,
            volume_24h: ticker.volume,
            change: ticker.price_change,
            change_pct: ticker.price_change_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::StreamUpdate, exchange::binance::parse_message, subscription::SubscriptionKey,
    };

    #[test]
    fn test_parse_ticker_array() {
        let text = r#"[
            {"e":"24hrTicker","E":1672515782136,"s":"BTCUSDT","p":"-120.50","P":"-0.29","w":"41000",
             "x":"41120.00","c":"41000.00","Q":"0.01","b":"40999.99","B":"1","a":"41000.01","A":"2",
             "o":"41120.50","h":"41500","l":"40800","v":"21000.5","q":"861000000","O":0,"C":1,
             "F":1,"L":2,"n":3},
            {"e":"24hrTicker","E":1672515782136,"s":"ETHUSDT","p":"12.00","P":"0.55","c":"2200.00",
             "v":"150000"}
        ]"#;

        let update = parse_message(&SubscriptionKey::tickers(), text, 20)
            .unwrap()
            .unwrap();

        let StreamUpdate::Tickers(tickers) = update else {
            panic!("expected tickers update");
        };
        assert_eq!(tickers.len(), 2);
        assert_eq!(
            tickers[0],
            TickerSnapshot {
                symbol: SmolStr::new("BTCUSDT"),
                last_price: 41000.0,
                volume_24h: 21000.5,
                change: -120.5,
                change_pct: -0.29,
            }
        );
        assert_eq!(tickers[1].change_pct, 0.55);
    }
}
