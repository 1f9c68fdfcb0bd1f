//! Alert sinks notified for unhealthy probe results.
//!
//! Every sink implements [`AlertSink`]. Delivery failures are logged and
//! swallowed inside the sink, so alerting can never abort a run.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::model::AlertConfig;
use crate::http_probe::prelude::*;
use crate::http_probe::report;

pub mod console;
pub mod dingtalk;
pub mod webhook;

pub use console::ConsoleSink;
pub use dingtalk::DingTalkSink;
pub use webhook::WebhookSink;

/// Timeout for a single alert delivery.
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(10);

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} rejected the alert with status {status}: {body}")]
    Rejected {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to write alert")]
    Io(#[from] std::io::Error),
}

/// A notification target for unhealthy results.
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `result`. Never fails from the caller's point of view.
    fn notify<'a>(&'a self, result: &'a ProbeResult) -> NotifyFuture<'a>;
}

/// Log a failed delivery. Shared by the sink implementations.
pub(crate) fn log_failure(sink: &str, result: &ProbeResult, err: &AlertError) {
    log::warn!(
        "Alert sink {} failed for {}: {}",
        sink,
        result.url(),
        report(err)
    );
}

/// One line summary used by the messaging sinks.
pub fn alert_text(result: &ProbeResult) -> String {
    format!(
        "Website {} is unhealthy ({}): {}",
        result.url(),
        result.status(),
        result.error_detail().unwrap_or("no detail")
    )
}

/// Build the sinks named in the configuration. An empty list falls back to the console.
pub fn build_sinks(configs: &[AlertConfig], client: &reqwest::Client) -> Vec<Box<dyn AlertSink>> {
    if configs.is_empty() {
        return vec![Box::new(ConsoleSink) as Box<dyn AlertSink>];
    }

    configs
        .iter()
        .map(|config| -> Box<dyn AlertSink> {
            match config {
                AlertConfig::Console => Box::new(ConsoleSink),
                AlertConfig::Webhook { url } => Box::new(WebhookSink::new(client.clone(), url)),
                AlertConfig::DingTalk { webhook_url } => {
                    Box::new(DingTalkSink::new(client.clone(), webhook_url))
                }
            }
        })
        .collect()
}

/// Fans an unhealthy result out to every configured sink, in order.
pub struct AlertDispatcher {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl AlertDispatcher {
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    pub fn from_config(configs: &[AlertConfig], client: &reqwest::Client) -> Self {
        Self::new(build_sinks(configs, client))
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Notify every sink about `result`. Healthy results are ignored.
    pub async fn dispatch(&self, result: &ProbeResult) {
        if result.is_healthy() {
            return;
        }
        for sink in &self.sinks {
            log::debug!("Sending alert for {} via {}", result.url(), sink.name());
            sink.notify(result).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::http_probe::test_client;
    use std::sync::{Arc, Mutex};

    /// Records the URLs it was notified about.
    pub(crate) struct RecordingSink {
        pub seen: Arc<Mutex<Vec<String>>>,
    }

    impl AlertSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn notify<'a>(&'a self, result: &'a ProbeResult) -> NotifyFuture<'a> {
            Box::pin(async move {
                self.seen
                    .lock()
                    .expect("lock")
                    .push(result.url().to_string());
            })
        }
    }

    #[test]
    fn test_build_sinks_defaults_to_console() {
        let client = test_client();
        let sinks = build_sinks(&[], &client);
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "console");
    }

    #[test]
    fn test_build_sinks_in_config_order() {
        let client = test_client();
        let dispatcher = AlertDispatcher::from_config(
            &[
                AlertConfig::DingTalk {
                    webhook_url: "https://oapi.dingtalk.com/robot/send?access_token=x".to_string(),
                },
                AlertConfig::Console,
                AlertConfig::Webhook {
                    url: "https://hooks.example.com/uptime".to_string(),
                },
            ],
            &client,
        );
        assert_eq!(dispatcher.sink_names(), vec!["dingtalk", "console", "webhook"]);
    }

    #[tokio::test]
    async fn test_dispatch_skips_healthy_results() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn AlertSink>> = vec![Box::new(RecordingSink { seen: seen.clone() }) as Box<dyn AlertSink>];
        let dispatcher = AlertDispatcher::new(sinks);

        dispatcher
            .dispatch(&ProbeResult::healthy("https://ok.example/", 200, Duration::ZERO))
            .await;
        dispatcher
            .dispatch(&ProbeResult::connection_failure("https://down.example/"))
            .await;

        assert_eq!(*seen.lock().expect("lock"), vec!["https://down.example/"]);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_the_others() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = AlertDispatcher::new(vec![
            Box::new(WebhookSink::new(
                test_client(),
                &format!("http://127.0.0.1:{port}/hook"),
            )) as Box<dyn AlertSink>,
            Box::new(RecordingSink { seen: seen.clone() }),
        ]);

        dispatcher
            .dispatch(&ProbeResult::http_error("https://site.example/", 500, Duration::ZERO))
            .await;

        assert_eq!(*seen.lock().expect("lock"), vec!["https://site.example/"]);
    }

    #[test]
    fn test_alert_text() {
        let result = ProbeResult::http_error("https://site.example/", 502, Duration::ZERO);
        assert_eq!(
            alert_text(&result),
            "Website https://site.example/ is unhealthy (HTTP error): unexpected status code 502"
        );
    }
}
