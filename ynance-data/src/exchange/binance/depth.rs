use crate::{de::de_str, event::StreamUpdate, model::DepthSnapshot};
use serde::Deserialize;
use smol_str::SmolStr;

/// Binance order book snapshot.
///
/// Accepts both the spot partial depth format (`lastUpdateId`, `bids`, `asks`) and the futures
/// depth format (`u`, `b`, `a`).
///
/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#partial-book-depth-streams>
/// ```json
/// {
///     "lastUpdateId": 160,
///     "bids": [["0.0024", "10"]],
///     "asks": [["0.0026", "100"]]
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BinanceDepth {
    #[serde(rename = "lastUpdateId", alias = "u")]
    pub last_update_id: u64,
    #[serde(rename = "bids", alias = "b")]
    pub bids: Vec<BinanceLevel>,
    #[serde(rename = "asks", alias = "a")]
    pub asks: Vec<BinanceLevel>,
}

/// `[price, quantity]` pair encoded as strings.
#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
pub struct BinanceLevel(
    #[serde(deserialize_with = "de_str")] pub f64,
    #[serde(deserialize_with = "de_str")] pub f64,
);

impl BinanceDepth {
    pub fn into_update(self, symbol: SmolStr, depth_limit: usize) -> StreamUpdate {
        let bids: Vec<(f64, f64)> = self.bids.iter().map(|level| (level.0, level.1)).collect();
        let asks: Vec<(f64, f64)> = self.asks.iter().map(|level| (level.0, level.1)).collect();

        StreamUpdate::Depth {
            symbol,
            depth: DepthSnapshot::from_levels(self.last_update_id, &bids, &asks, depth_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exchange::binance::parse_message, subscription::SubscriptionKey};

    #[test]
    fn test_parse_depth_formats() {
        struct TestCase {
            input: &'static str,
            expected_id: u64,
        }

        let tests = vec![
            TestCase {
                // TC0: spot partial depth
                input: r#"{"lastUpdateId":160,"bids":[["100.0","1.0"],["99.0","2.0"],["98.0","3.0"]],"asks":[["101.0","0.5"],["102.0","0.5"],["103.0","1.0"]]}"#,
                expected_id: 160,
            },
            TestCase {
                // TC1: futures depth update
                input: r#"{"e":"depthUpdate","E":1,"T":1,"s":"BTCUSDT","U":150,"u":161,"pu":149,"b":[["100.0","1.0"],["99.0","2.0"],["98.0","3.0"]],"a":[["101.0","0.5"],["102.0","0.5"],["103.0","1.0"]]}"#,
                expected_id: 161,
            },
        ];

        let key = SubscriptionKey::depth("BTCUSDT");
        for (index, test) in tests.into_iter().enumerate() {
            let Some(StreamUpdate::Depth { symbol, depth }) =
                parse_message(&key, test.input, 2).unwrap()
            else {
                panic!("TC{} failed: expected depth update", index);
            };

            assert_eq!(symbol, "BTCUSDT", "TC{} failed", index);
            assert_eq!(depth.last_update_id, test.expected_id, "TC{} failed", index);
            assert_eq!(depth.bids.len(), 2, "TC{} failed", index);
            assert_eq!(depth.bids[1].cumulative, 3.0, "TC{} failed", index);
            assert_eq!(depth.asks[1].cumulative, 1.0, "TC{} failed", index);
        }
    }
}
