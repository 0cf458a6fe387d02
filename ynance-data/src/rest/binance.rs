use super::client::{RestClient, finish};
use crate::{
    de::{de_str, de_u64_epoch_ms_as_datetime_utc},
    error::DataError,
    fetch::Fetched,
    model::{FundingRate, KlineInterval, PriceBar},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use smol_str::SmolStr;

const SOURCE_KLINES: &str = "Binance klines";
const SOURCE_FUNDING: &str = "Binance funding";

/// Maximum number of klines Binance returns per request.
pub const MAX_KLINE_LIMIT: u16 = 1000;

/// Binance kline response row (array format).
///
/// Format: [open_time, open, high, low, close, volume, close_time, quote_volume, trades, taker_buy_base, taker_buy_quote, ignore]
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct BinanceKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

impl BinanceKline {
    fn to_bar(&self) -> Option<PriceBar> {
        Some(PriceBar::new(
            DateTime::from_timestamp_millis(self.0)?,
            self.1.parse().ok()?,
            self.2.parse().ok()?,
            self.3.parse().ok()?,
            self.4.parse().ok()?,
            self.5.parse().ok()?,
        ))
    }
}

/// Parse a kline array, preserving row order. Rows with unparseable numbers are skipped.
pub fn parse_klines(body: &str) -> Result<Vec<PriceBar>, DataError> {
    let klines: Vec<BinanceKline> = serde_json::from_str(body)?;
    Ok(klines.iter().filter_map(BinanceKline::to_bar).collect())
}

/// Fetch the most recent `limit` spot klines for a symbol.
pub async fn fetch_klines(
    client: &RestClient,
    symbol: &str,
    interval: KlineInterval,
    limit: u16,
) -> Fetched<Vec<PriceBar>> {
    let result = async {
        let limit = limit.clamp(1, MAX_KLINE_LIMIT).to_string();
        let request = client
            .get(&client.endpoints().binance_spot, "/api/v3/klines")?
            .query(&[
                ("symbol", symbol.to_uppercase().as_str()),
                ("interval", interval.as_str()),
                ("limit", limit.as_str()),
            ]);
        let body = client.send_text(request).await?;
        parse_klines(&body)
    }
    .await;

    finish(SOURCE_KLINES, result)
}

/// Binance USD-M futures premium index.
///
/// See docs: <https://developers.binance.com/docs/derivatives/usds-margined-futures/market-data/rest-api/Mark-Price>
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    symbol: SmolStr,
    #[serde(deserialize_with = "de_str")]
    mark_price: f64,
    #[serde(deserialize_with = "de_str")]
    last_funding_rate: f64,
    #[serde(deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
    next_funding_time: DateTime<Utc>,
}

impl From<PremiumIndex> for FundingRate {
    fn from(index: PremiumIndex) -> Self {
        Self {
            symbol: index.symbol,
            mark_price: index.mark_price,
            funding_rate: index.last_funding_rate,
            // Delivery contracts report zero
            next_funding_time: (index.next_funding_time.timestamp_millis() > 0)
                .then_some(index.next_funding_time),
        }
    }
}

pub fn parse_funding_rate(body: &str) -> Result<FundingRate, DataError> {
    serde_json::from_str::<PremiumIndex>(body)
        .map(FundingRate::from)
        .map_err(DataError::from)
}

/// Fetch the current mark price and funding rate of a perpetual futures symbol.
pub async fn fetch_funding_rate(client: &RestClient, symbol: &str) -> Fetched<FundingRate> {
    let result = async {
        let request = client
            .get(&client.endpoints().binance_futures, "/fapi/v1/premiumIndex")?
            .query(&[("symbol", symbol.to_uppercase())]);
        let body = client.send_text(request).await?;
        parse_funding_rate(&body)
    }
    .await;

    finish(SOURCE_FUNDING, result)
}
