use super::client::{RestClient, finish};
use crate::{config::Provider, error::DataError, fetch::Fetched, model::SeriesPoint};
use chrono::NaiveDate;
use serde::Deserialize;

const SOURCE: &str = "FRED";

/// FRED marks missing observations with a single dot.
const MISSING_VALUE: &str = ".";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: NaiveDate,
    value: String,
}

/// Parse series observations, skipping missing values.
pub fn parse_series(body: &str) -> Result<Vec<SeriesPoint>, DataError> {
    let response: ObservationsResponse = serde_json::from_str(body)?;

    Ok(response
        .observations
        .into_iter()
        .filter(|observation| observation.value.trim() != MISSING_VALUE)
        .filter_map(|observation| {
            let value = observation.value.trim().parse().ok()?;
            Some(SeriesPoint::new(observation.date, value))
        })
        .collect())
}

/// Fetch every observation of an economic series.
pub async fn fetch_series(
    client: &RestClient,
    series_id: &str,
    api_key: Option<&str>,
) -> Fetched<Vec<SeriesPoint>> {
    let result = async {
        let api_key = api_key.ok_or(DataError::MissingCredential(Provider::Fred))?;
        let request = client
            .get(&client.endpoints().fred, "/fred/series/observations")?
            .query(&[
                ("series_id", series_id),
                ("api_key", api_key),
                ("file_type", "json"),
            ]);
        let body = client.send_text(request).await?;
        parse_series(&body)
    }
    .await;

    finish(SOURCE, result)
}
