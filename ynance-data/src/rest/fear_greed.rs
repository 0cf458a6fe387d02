use super::client::{RestClient, finish};
use crate::{
    de::de_str,
    error::DataError,
    fetch::Fetched,
    model::{SentimentMarket, SentimentReading},
};
use serde::Deserialize;

const SOURCE: &str = "Fear & Greed";

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    #[serde(deserialize_with = "de_str")]
    value: u8,
    value_classification: String,
}

/// Parse the most recent reading from an index response.
pub fn parse_index(body: &str, market: SentimentMarket) -> Result<SentimentReading, DataError> {
    let response: FngResponse = serde_json::from_str(body)?;
    let entry = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| DataError::Parse("empty \"data\" array".to_string()))?;

    Ok(SentimentReading {
        value: entry.value.min(100),
        classification: entry.value_classification,
        market,
    })
}

/// Fetch the latest Fear & Greed reading for a market.
pub async fn fetch_index(client: &RestClient, market: SentimentMarket) -> Fetched<SentimentReading> {
    let result = async {
        let mut request = client
            .get(&client.endpoints().fear_greed, "/fng/")?
            .query(&[("limit", "1")]);
        if market == SentimentMarket::Crypto {
            request = request.query(&[("crypto", "1")]);
        }
        let body = client.send_text(request).await?;
        parse_index(&body, market)
    }
    .await;

    finish(SOURCE, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        let body = r#"{
            "name": "Fear and Greed Index",
            "data": [
                {"value": "72", "value_classification": "Greed", "timestamp": "1704153600", "time_until_update": "3600"}
            ],
            "metadata": {"error": null}
        }"#;

        let reading = parse_index(body, SentimentMarket::Crypto).unwrap();

        assert_eq!(
            reading,
            SentimentReading {
                value: 72,
                classification: "Greed".to_string(),
                market: SentimentMarket::Crypto,
            }
        );
    }

    #[test]
    fn test_parse_index_empty_or_malformed() {
        assert!(matches!(
            parse_index(r#"{"data": []}"#, SentimentMarket::Stock),
            Err(DataError::Parse(_))
        ));
        assert!(parse_index(r#"{"data": [{"value": "abc"}]}"#, SentimentMarket::Stock).is_err());
        assert!(parse_index("", SentimentMarket::Stock).is_err());

        let fetched: Fetched<SentimentReading> =
            parse_index("{}", SentimentMarket::Stock).into();
        assert_eq!(fetched.into_data(), SentimentReading::default());
    }
}
