use serde::Deserialize;

/// The configuration file of the PulseCheck service.
/// Contains the global probe defaults, the targets to probe and the alert sinks to notify.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Request timeout in seconds applied to targets without their own.
    /// Defaults to 30 if not specified.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,

    /// Substring a 200 response body must contain to count as healthy.
    /// When absent, any 200 response is healthy.
    #[serde(default)]
    pub marker: Option<String>,

    /// Upper bound on probes in flight at once. 1 probes strictly in order.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Accept invalid or self-signed TLS certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// User agent sent with every probe request.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// The targets to probe, in the order they are reported.
    pub targets: Vec<TargetConfig>,

    /// Alert sinks notified for unhealthy results.
    /// Defaults to a single console sink when empty.
    #[serde(default)]
    pub alerts: Vec<AlertConfig>,
}

/// A target configuration.
/// Contains the target URL and optional overrides of the global defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// The URL of the website to be monitored.
    pub url: String,

    /// Display name used in the report. Defaults to the URL host.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub timeout_seconds: Option<f64>,

    #[serde(default)]
    pub marker: Option<String>,
}

/// An alert sink selected by its `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertConfig {
    Console,
    Webhook { url: String },
    #[serde(rename = "dingtalk")]
    DingTalk { webhook_url: String },
}

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;

fn default_timeout_seconds() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_max_concurrency() -> usize {
    1
}
