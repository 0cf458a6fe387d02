use crate::{
    de::{de_str, de_u64_epoch_ms_as_datetime_utc},
    model::FundingRate,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use smol_str::SmolStr;

/// Binance USD-M futures mark price update.
///
/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/derivatives/usds-margined-futures/websocket-market-streams/Mark-Price-Stream>
/// ```json
/// {
///     "e": "markPriceUpdate",
///     "E": 1562305380000,
///     "s": "BTCUSDT",
///     "p": "11794.15000000",
///     "i": "11784.62659091",
///     "P": "11784.25641265",
///     "r": "0.00038167",
///     "T": 1562306400000
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BinanceMarkPrice {
    #[serde(rename = "s")]
    pub symbol: SmolStr,
    #[serde(rename = "p", deserialize_with = "de_str")]
    pub mark_price: f64,
    #[serde(rename = "r", deserialize_with = "de_str")]
    pub funding_rate: f64,
    #[serde(rename = "T", deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
    pub next_funding_time: DateTime<Utc>,
}

impl From<BinanceMarkPrice> for FundingRate {
    fn from(update: BinanceMarkPrice) -> Self {
        Self {
            symbol: update.symbol,
            mark_price: update.mark_price,
            funding_rate: update.funding_rate,
            next_funding_time: (update.next_funding_time.timestamp_millis() > 0)
                .then_some(update.next_funding_time),
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
    fn test_parse_mark_price() {
        let text = r#"{"e":"markPriceUpdate","E":1562305380000,"s":"BTCUSDT","p":"11794.15000000","i":"11784.62659091","P":"11784.25641265","r":"0.00038167","T":1562306400000}"#;

        let update = parse_message(&SubscriptionKey::mark_price("BTCUSDT"), text, 20)
            .unwrap()
            .unwrap();

        assert_eq!(
            update,
            StreamUpdate::MarkPrice(FundingRate {
                symbol: SmolStr::new("BTCUSDT"),
                mark_price: 11794.15,
                funding_rate: 0.00038167,
                next_funding_time: DateTime::from_timestamp_millis(1_562_306_400_000),
            })
        );
    }
}
