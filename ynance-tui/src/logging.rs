use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "ynance.log";

/// Log file path from `YNANCE_LOG`, falling back to [`DEFAULT_LOG_PATH`].
pub fn log_path() -> PathBuf {
    std::env::var_os("YNANCE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
}

/// Install a global tracing subscriber that appends to `path`.
///
/// The terminal belongs to the dashboard, so nothing is ever written to stdout or stderr.
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
}
