use super::client::{RestClient, finish};
use crate::{
    config::Provider,
    de::{de_opt_str_f64, de_str},
    error::DataError,
    fetch::Fetched,
    model::PriceBar,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

const SOURCE: &str = "Alpha Vantage";

/// Response of the `TIME_SERIES_DAILY_ADJUSTED` function.
///
/// Rate limiting and bad requests are reported with a 200 status and a message field in place of
/// the series.
#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    series: Option<BTreeMap<NaiveDate, DailyEntry>>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    #[serde(rename = "1. open", deserialize_with = "de_str")]
    open: f64,
    #[serde(rename = "2. high", deserialize_with = "de_str")]
    high: f64,
    #[serde(rename = "3. low", deserialize_with = "de_str")]
    low: f64,
    #[serde(rename = "4. close", deserialize_with = "de_str")]
    close: f64,
    #[serde(rename = "5. volume", default, deserialize_with = "de_opt_str_f64")]
    volume: Option<f64>,
    #[serde(rename = "6. volume", default, deserialize_with = "de_opt_str_f64")]
    adjusted_volume: Option<f64>,
}

/// Parse a daily series into bars sorted ascending by date.
pub fn parse_daily(body: &str) -> Result<Vec<PriceBar>, DataError> {
    let response: DailyResponse = serde_json::from_str(body)?;

    if let Some(message) = response.note {
        return Err(DataError::Status {
            status: 429,
            body: message,
        });
    }
    if let Some(message) = response.information {
        // Premium-only functions never succeed on a free key, everything else is throttling
        let status = if message.to_ascii_lowercase().contains("premium") {
            403
        } else {
            429
        };
        return Err(DataError::Status {
            status,
            body: message,
        });
    }
    if let Some(message) = response.error_message {
        return Err(DataError::Status {
            status: 400,
            body: message,
        });
    }

    let series = response
        .series
        .ok_or_else(|| DataError::Parse("missing \"Time Series (Daily)\"".to_string()))?;

    Ok(series
        .into_iter()
        .filter_map(|(date, entry)| {
            let open_time = date.and_hms_opt(0, 0, 0)?.and_utc();
            Some(PriceBar::new(
                open_time,
                entry.open,
                entry.high,
                entry.low,
                entry.close,
                entry.adjusted_volume.or(entry.volume).unwrap_or(0.0),
            ))
        })
        .collect())
}

/// Fetch compact (last ~100 sessions) daily history for a stock symbol.
pub async fn fetch_daily(
    client: &RestClient,
    symbol: &str,
    api_key: Option<&str>,
) -> Fetched<Vec<PriceBar>> {
    let result = async {
        let api_key = api_key.ok_or(DataError::MissingCredential(Provider::AlphaVantage))?;
        let request = client.get(&client.endpoints().alpha_vantage, "/query")?.query(&[
            ("function", "TIME_SERIES_DAILY_ADJUSTED"),
            ("symbol", symbol),
            ("outputsize", "compact"),
            ("apikey", api_key),
        ]);
        let body = client.send_text(request).await?;
        parse_daily(&body)
    }
    .await;

    finish(SOURCE, result)
}
