use super::client::{RestClient, finish};
use crate::{config::Provider, error::DataError, fetch::Fetched, model::CoinPrice};
use serde::Deserialize;
use smol_str::SmolStr;
use std::collections::HashMap;

const SOURCE: &str = "CoinGecko";

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

/// Parse a simple price response, returning prices in the order of `ids`. Unknown ids are
/// skipped.
pub fn parse_prices<S: AsRef<str>>(body: &str, ids: &[S]) -> Result<Vec<CoinPrice>, DataError> {
    let mut prices: HashMap<String, SimplePrice> = serde_json::from_str(body)?;

    Ok(ids
        .iter()
        .filter_map(|id| {
            let id = id.as_ref().to_lowercase();
            let price = prices.remove(&id)?;
            Some(CoinPrice {
                id: SmolStr::from(id),
                usd: price.usd,
                change_24h_pct: price.usd_24h_change,
            })
        })
        .collect())
}

/// Fetch USD prices and 24h change for a set of CoinGecko coin ids (eg/ "bitcoin").
pub async fn fetch_prices<S: AsRef<str>>(
    client: &RestClient,
    ids: &[S],
    api_key: Option<&str>,
) -> Fetched<Vec<CoinPrice>> {
    let result = async {
        let api_key = api_key.ok_or(DataError::MissingCredential(Provider::CoinGecko))?;
        let joined = ids
            .iter()
            .map(|id| id.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        let request = client
            .get(&client.endpoints().coingecko, "/api/v3/simple/price")?
            .header("x-cg-demo-api-key", api_key)
            .query(&[
                ("ids", joined.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ]);
        let body = client.send_text(request).await?;
        parse_prices(&body, ids)
    }
    .await;

    finish(SOURCE, result)
}
