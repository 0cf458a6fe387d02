//! Credentials and runtime configuration.
//!
//! Secrets are loaded once from a `secrets.json` file; every key is optional and a missing key
//! only disables the feature that needs it. Everything else is read from environment variables
//! with sensible defaults.

use crate::{error::DataError, model::KlineInterval};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};

/// Default location of the secrets file, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = "secrets.json";

/// Default OpenAI-compatible generation endpoint (Gemini).
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Default generation model.
pub const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash";

/// External service that may require a credential.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum Provider {
    AlphaVantage,
    Binance,
    CoinGecko,
    Fred,
    Gemini,
    Kosis,
    Llm,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::AlphaVantage => "Alpha Vantage",
            Provider::Binance => "Binance",
            Provider::CoinGecko => "CoinGecko",
            Provider::Fred => "FRED",
            Provider::Gemini => "Gemini",
            Provider::Kosis => "KOSIS",
            Provider::Llm => "LLM",
        }
    }

    /// Name of the `secrets.json` key holding this provider's credential.
    pub fn secret_key(&self) -> &'static str {
        match self {
            Provider::AlphaVantage => "ALPHA_VANTAGE_API_KEY",
            Provider::Binance => "BINANCE_API_KEY",
            Provider::CoinGecko => "COINGECKO_API_KEY",
            Provider::Fred => "FRED_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Kosis => "KOSIS_API_KEY",
            Provider::Llm => "LLM_API_KEY",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contents of `secrets.json`.
#[derive(Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Secrets {
    #[serde(rename = "BINANCE_API_KEY", default)]
    pub binance_api_key: Option<String>,
    #[serde(rename = "BINANCE_SECRET_KEY", default)]
    pub binance_secret_key: Option<String>,
    #[serde(rename = "FRED_API_KEY", default)]
    pub fred_api_key: Option<String>,
    #[serde(rename = "ALPHA_VANTAGE_API_KEY", default)]
    pub alpha_vantage_api_key: Option<String>,
    #[serde(rename = "COINGECKO_API_KEY", default)]
    pub coingecko_api_key: Option<String>,
    #[serde(rename = "KOSIS_API_KEY", default)]
    pub kosis_api_key: Option<String>,
    #[serde(rename = "GEMINI_API_KEY", default)]
    pub gemini_api_key: Option<String>,
    #[serde(rename = "LLM_API_KEY", default)]
    pub llm_api_key: Option<String>,
}

// Keys never reach the logs.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("configured", &self.configured())
            .finish()
    }
}

impl Secrets {
    /// Parse a secrets file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DataError> {
        serde_json::from_str(raw).map_err(|error| DataError::Config(error.to_string()))
    }

    /// Load secrets, degrading to "no keys" if the file is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(secrets) => {
                info!(path = %path.display(), keys = ?secrets.configured(), "loaded secrets");
                secrets
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    %error,
                    "failed to load secrets, keyed data sources are disabled"
                );
                Self::default()
            }
        }
    }

    /// Credential for a provider, treating blank values as absent.
    pub fn key(&self, provider: Provider) -> Option<&str> {
        let value = match provider {
            Provider::AlphaVantage => &self.alpha_vantage_api_key,
            Provider::Binance => &self.binance_api_key,
            Provider::CoinGecko => &self.coingecko_api_key,
            Provider::Fred => &self.fred_api_key,
            Provider::Gemini => &self.gemini_api_key,
            Provider::Kosis => &self.kosis_api_key,
            Provider::Llm => {
                return non_blank(&self.llm_api_key).or_else(|| non_blank(&self.gemini_api_key));
            }
        };
        non_blank(value)
    }

    /// Providers that have a usable credential.
    pub fn configured(&self) -> Vec<Provider> {
        [
            Provider::AlphaVantage,
            Provider::Binance,
            Provider::CoinGecko,
            Provider::Fred,
            Provider::Gemini,
            Provider::Kosis,
            Provider::Llm,
        ]
        .into_iter()
        .filter(|provider| self.key(*provider).is_some())
        .collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Hosted text-generation endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

/// Dashboard runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub secrets_path: PathBuf,
    pub crypto_symbols: Vec<SmolStr>,
    pub stock_symbols: Vec<SmolStr>,
    pub fred_series: Vec<SmolStr>,
    pub kline_interval: KlineInterval,
    pub depth_limit: usize,
    pub report_dir: PathBuf,
    pub llm: LlmConfig,
    pub tick_rate: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl DashboardConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let symbols = |name: &str, default: &str| -> Vec<SmolStr> {
            let parsed = parse_list(&lookup(name).unwrap_or_else(|| default.to_string()));
            if parsed.is_empty() {
                parse_list(default)
            } else {
                parsed
            }
        };

        let kline_interval = lookup("KLINE_INTERVAL")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        let depth_limit = lookup("DEPTH_LIMIT")
            .and_then(|raw| raw.parse().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(20);

        let tick_rate_ms = lookup("TICK_RATE_MS")
            .and_then(|raw| raw.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(250);

        Self {
            secrets_path: lookup("YNANCE_SECRETS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_PATH)),
            crypto_symbols: symbols("CRYPTO_SYMBOLS", "BTCUSDT,ETHUSDT,SOLUSDT"),
            stock_symbols: symbols("STOCK_SYMBOLS", "SPY,QQQ,AAPL"),
            fred_series: symbols("FRED_SERIES", "DGS10,CPIAUCSL,UNRATE"),
            kline_interval,
            depth_limit,
            report_dir: lookup("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            llm: LlmConfig {
                base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            },
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }
}

fn parse_list(raw: &str) -> Vec<SmolStr> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .map(SmolStr::from)
        .collect()
}
