use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Healthy,
    /// 200 response whose body lacks the required marker.
    ContentMismatch,
    /// Any response code other than 200.
    HttpError,
    Timeout,
    ConnectionFailure,
    UnknownError,
}

impl ProbeStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, ProbeStatus::Healthy)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProbeStatus::Healthy => "Healthy",
            ProbeStatus::ContentMismatch => "Content mismatch",
            ProbeStatus::HttpError => "HTTP error",
            ProbeStatus::Timeout => "Timeout",
            ProbeStatus::ConnectionFailure => "Connection failure",
            ProbeStatus::UnknownError => "Unknown error",
        };
        f.write_str(label)
    }
}

/// Status code and elapsed time of a received response. Kept as one value so
/// a result can never carry one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct ResponseInfo {
    status_code: u16,
    response_time_seconds: f64,
}

/// The result of probing one URL.
///
/// Built once per probe through the named constructors below, then handed
/// to the report and the alert sinks. Serializes to the JSON body sent by
/// webhook sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    url: String,
    timestamp: DateTime<Utc>,
    status: ProbeStatus,
    #[serde(flatten)]
    response: Option<ResponseInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
}

impl ProbeResult {
    fn new(
        url: &str,
        status: ProbeStatus,
        response: Option<(u16, Duration)>,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            url: url.to_string(),
            timestamp: Utc::now(),
            status,
            response: response.map(|(status_code, elapsed)| ResponseInfo {
                status_code,
                response_time_seconds: elapsed.as_secs_f64(),
            }),
            error_detail,
        }
    }

    pub fn healthy(url: &str, status_code: u16, elapsed: Duration) -> Self {
        Self::new(url, ProbeStatus::Healthy, Some((status_code, elapsed)), None)
    }

    pub fn content_mismatch(url: &str, status_code: u16, elapsed: Duration) -> Self {
        Self::new(
            url,
            ProbeStatus::ContentMismatch,
            Some((status_code, elapsed)),
            Some("missing required marker".to_string()),
        )
    }

    pub fn http_error(url: &str, status_code: u16, elapsed: Duration) -> Self {
        Self::new(
            url,
            ProbeStatus::HttpError,
            Some((status_code, elapsed)),
            Some(format!("unexpected status code {status_code}")),
        )
    }

    pub fn timeout(url: &str, timeout: Duration) -> Self {
        Self::new(
            url,
            ProbeStatus::Timeout,
            None,
            Some(format!("request exceeded {}s", timeout.as_secs_f64())),
        )
    }

    pub fn connection_failure(url: &str) -> Self {
        Self::new(
            url,
            ProbeStatus::ConnectionFailure,
            None,
            Some("unable to reach server".to_string()),
        )
    }

    pub fn unknown_error(url: &str, message: impl Into<String>) -> Self {
        Self::new(url, ProbeStatus::UnknownError, None, Some(message.into()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response.map(|r| r.status_code)
    }

    pub fn response_time_seconds(&self) -> Option<f64> {
        self.response.map(|r| r.response_time_seconds)
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }
}
