use super::client::{RestClient, finish};
use crate::{
    config::Provider,
    de::de_str,
    error::DataError,
    fetch::Fetched,
    model::ExchangeQuote,
};
use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::HashMap;

const SOURCE: &str = "Gemini";

/// Gemini v1 public ticker.
///
/// `volume` is keyed by currency (eg/ "BTC", "USD") plus a `timestamp` entry.
#[derive(Debug, Deserialize)]
struct PubTicker {
    #[serde(deserialize_with = "de_str")]
    bid: f64,
    #[serde(deserialize_with = "de_str")]
    ask: f64,
    #[serde(deserialize_with = "de_str")]
    last: f64,
    #[serde(default)]
    volume: HashMap<String, Value>,
}

/// Parse a ticker, taking base-currency volume from the volume entry whose key prefixes `symbol`.
pub fn parse_ticker(body: &str, symbol: &str) -> Result<ExchangeQuote, DataError> {
    let ticker: PubTicker = serde_json::from_str(body)?;
    let symbol_upper = symbol.to_uppercase();

    let volume = ticker
        .volume
        .iter()
        .filter(|(currency, _)| currency.as_str() != "timestamp")
        .find(|(currency, _)| symbol_upper.starts_with(&currency.to_uppercase()))
        .and_then(|(_, value)| match value {
            Value::String(raw) => raw.trim().parse().ok(),
            Value::Number(number) => number.as_f64(),
            _ => None,
        })
        .unwrap_or(0.0);

    Ok(ExchangeQuote {
        symbol: SmolStr::from(symbol_upper),
        bid: ticker.bid,
        ask: ticker.ask,
        last: ticker.last,
        volume,
    })
}

/// Fetch the public ticker for a Gemini symbol (eg/ "btcusd").
pub async fn fetch_ticker(
    client: &RestClient,
    symbol: &str,
    api_key: Option<&str>,
) -> Fetched<ExchangeQuote> {
    let result = async {
        let api_key = api_key.ok_or(DataError::MissingCredential(Provider::Gemini))?;
        let path = format!("/v1/pubticker/{}", symbol.to_lowercase());
        let request = client
            .get(&client.endpoints().gemini, &path)?
            .header("X-GEMINI-APIKEY", api_key);
        let body = client.send_text(request).await?;
        parse_ticker(&body, symbol)
    }
    .await;

    finish(SOURCE, result)
}
