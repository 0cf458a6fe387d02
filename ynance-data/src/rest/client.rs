use crate::{error::DataError, fetch::Fetched};
use reqwest::RequestBuilder;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Per-request timeout for every REST data source.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of response body characters carried in a status error.
const ERROR_BODY_LIMIT: usize = 200;

pub const BASE_URL_ALPHA_VANTAGE: &str = "https://www.alphavantage.co";
pub const BASE_URL_BINANCE_SPOT: &str = "https://api.binance.com";
pub const BASE_URL_BINANCE_FUTURES: &str = "https://fapi.binance.com";
pub const BASE_URL_FRED: &str = "https://api.stlouisfed.org";
pub const BASE_URL_FEAR_GREED: &str = "https://api.alternative.me";
pub const BASE_URL_GEMINI: &str = "https://api.gemini.com";
pub const BASE_URL_COINGECKO: &str = "https://api.coingecko.com";

/// Base URLs of every REST data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub alpha_vantage: String,
    pub binance_spot: String,
    pub binance_futures: String,
    pub fred: String,
    pub fear_greed: String,
    pub gemini: String,
    pub coingecko: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            alpha_vantage: BASE_URL_ALPHA_VANTAGE.to_string(),
            binance_spot: BASE_URL_BINANCE_SPOT.to_string(),
            binance_futures: BASE_URL_BINANCE_FUTURES.to_string(),
            fred: BASE_URL_FRED.to_string(),
            fear_greed: BASE_URL_FEAR_GREED.to_string(),
            gemini: BASE_URL_GEMINI.to_string(),
            coingecko: BASE_URL_COINGECKO.to_string(),
        }
    }
}

/// Shared HTTP client for the REST fetchers: one timed GET per call, no retry.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl RestClient {
    pub fn new() -> Result<Self, DataError> {
        Self::with_endpoints(Endpoints::default(), DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_endpoints(endpoints: Endpoints, timeout: Duration) -> Result<Self, DataError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ynance/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Start a GET request for `path` relative to `base`.
    pub fn get(&self, base: &str, path: &str) -> Result<RequestBuilder, DataError> {
        let url = Url::parse(base)?.join(path)?;
        Ok(self.http.get(url))
    }

    /// Send a request and return the body of a successful response.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, DataError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DataError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        debug!(%status, bytes = body.len(), "REST response received");
        Ok(body)
    }
}

/// Convert a fetch result into a [`Fetched`], logging failures against the data source name.
pub(crate) fn finish<T>(source: &'static str, result: Result<T, DataError>) -> Fetched<T> {
    if let Err(error) = &result {
        match error {
            DataError::MissingCredential(_) => debug!(source, %error, "data source disabled"),
            _ => warn!(source, %error, transient = error.is_transient(), "fetch failed"),
        }
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client = RestClient::new().unwrap();
        let request = client
            .get(&client.endpoints().binance_spot, "/api/v3/klines")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "https://api.binance.com/api/v3/klines");
    }

    #[test]
    fn test_finish_classifies() {
        let fetched = finish::<u8>("test", Err(DataError::Timeout));
        assert!(matches!(fetched, Fetched::Transient(_)));
        assert_eq!(finish("test", Ok(1u8)), Fetched::Ready(1));
    }
}
