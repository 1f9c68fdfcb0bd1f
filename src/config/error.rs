use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or preparing the probe client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in config file")]
    Parse(#[from] serde_yaml::Error),

    #[error("no targets configured")]
    NoTargets,

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid timeout {0}s: must be a positive number of seconds")]
    InvalidTimeout(f64),

    #[error("max_concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("failed to build HTTP client")]
    Client(#[from] reqwest::Error),
}
