use crate::config::Provider;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `ynance-data`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("HTTP transport failure: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error("no API key configured for {0}")]
    MissingCredential(Provider),

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("SocketError: {0}")]
    Socket(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DataError {
    /// Determine if an error is worth retrying later, or whether the affected feature should be
    /// treated as unavailable until configuration changes.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Transport(_) | DataError::Timeout | DataError::Socket(_) => true,
            DataError::Status { status, .. } => *status == 429 || *status >= 500,
            DataError::Generation(_) => true,
            _ => false,
        }
    }

    /// Short user-facing warning line for a failed data source.
    pub fn warning(&self, source: &str) -> String {
        match self {
            DataError::MissingCredential(provider) => {
                format!("{source}: disabled, add {} to secrets.json", provider.secret_key())
            }
            other => format!("{source}: {other}"),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if let Some(status) = error.status() {
            Self::Status {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<std::io::Error> for DataError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DataError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(error.to_string())
    }
}

impl From<url::ParseError> for DataError {
    fn from(error: url::ParseError) -> Self {
        Self::Config(error.to_string())
    }
}
