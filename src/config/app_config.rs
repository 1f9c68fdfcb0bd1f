use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::error::ConfigError;
use super::model::{AlertConfig, Config};
use crate::http_probe::prelude::ProbeTarget;
use crate::report::display_width;

pub const TIMEOUT_ENV: &str = "PROBE_TIMEOUT_SECONDS";
pub const MARKER_ENV: &str = "PROBE_MARKER";
pub const MAX_CONCURRENCY_ENV: &str = "PROBE_MAX_CONCURRENCY";

const DEFAULT_USER_AGENT: &str = concat!("pulsecheck/", env!("CARGO_PKG_VERSION"));

/// Fully resolved configuration of one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub targets: Vec<ProbeTarget>,
    pub alerts: Vec<AlertConfig>,
    pub max_concurrency: usize,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
    pub max_name_width: usize,
}

/// Values that take precedence over the config file's global defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub timeout_seconds: Option<f64>,
    pub marker: Option<String>,
    pub max_concurrency: Option<usize>,
}

fn parse_var<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name, value: v.clone() })
        })
        .transpose()
}

impl Overrides {
    /// Read overrides from `PROBE_TIMEOUT_SECONDS`, `PROBE_MARKER` and `PROBE_MAX_CONCURRENCY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout_seconds: parse_var(TIMEOUT_ENV, lookup(TIMEOUT_ENV))?,
            marker: lookup(MARKER_ENV),
            max_concurrency: parse_var(MAX_CONCURRENCY_ENV, lookup(MAX_CONCURRENCY_ENV))?,
        })
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Overrides) -> Overrides {
        Overrides {
            timeout_seconds: other.timeout_seconds.or(self.timeout_seconds),
            marker: other.marker.or(self.marker),
            max_concurrency: other.max_concurrency.or(self.max_concurrency),
        }
    }
}

fn timeout_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(secs))
}

/// Parse and check an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Turn the deserialized file into the run configuration, applying overrides
/// and validating every target and alert endpoint.
pub fn resolve_config(config: Config, overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    if config.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    let default_timeout =
        timeout_from_secs(overrides.timeout_seconds.unwrap_or(config.timeout_seconds))?;
    let default_marker = overrides.marker.clone().or(config.marker);

    let max_concurrency = overrides.max_concurrency.unwrap_or(config.max_concurrency);
    if max_concurrency == 0 {
        return Err(ConfigError::InvalidConcurrency);
    }

    let targets = config
        .targets
        .into_iter()
        .map(|target| {
            let url = validate_url(&target.url)?;
            let timeout = match target.timeout_seconds {
                Some(secs) => timeout_from_secs(secs)?,
                None => default_timeout,
            };
            let name = target
                .name
                .or_else(|| url.host_str().map(str::to_string))
                .unwrap_or_else(|| target.url.clone());
            Ok(ProbeTarget {
                name,
                url: target.url,
                timeout,
                marker: target.marker.or_else(|| default_marker.clone()),
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    for alert in &config.alerts {
        match alert {
            AlertConfig::Console => {}
            AlertConfig::Webhook { url } | AlertConfig::DingTalk { webhook_url: url } => {
                validate_url(url)?;
            }
        }
    }

    let max_name_width = targets
        .iter()
        .map(|t| display_width(&t.name))
        .max()
        .unwrap_or(10);

    Ok(AppConfig {
        targets,
        alerts: config.alerts,
        max_concurrency,
        accept_invalid_certs: config.accept_invalid_certs,
        user_agent: config
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        max_name_width,
    })
}

pub fn parse_config(yaml: &str, overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    resolve_config(config, overrides)
}

/// Load the application configuration from a YAML file.
/// The file is parsed into a `Config` struct, after which the global defaults are
/// overridden by `overrides` (environment variables and command line flags).
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let app_config = parse_config(&config_str, overrides)?;

    log::info!(
        "Loaded {} target(s) and {} alert sink(s) from {}",
        app_config.targets.len(),
        app_config.alerts.len(),
        path.display()
    );

    Ok(app_config)
}

/// Setup the HTTP client shared by all probes.
/// Timeouts are applied per request, so the client itself carries none.
pub fn setup_client(config: &AppConfig) -> Result<reqwest::Client, ConfigError> {
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}
