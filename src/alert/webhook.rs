use super::{ALERT_TIMEOUT, AlertError, AlertSink, NotifyFuture, log_failure};
use crate::http_probe::prelude::*;

/// POSTs the probe result as JSON to an arbitrary endpoint.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    async fn send(&self, result: &ProbeResult) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(ALERT_TIMEOUT)
            .json(result)
            .send()
            .await
            .map_err(|source| AlertError::Request {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Rejected {
                url: self.url.clone(),
                status,
                body,
            });
        }
        Ok(())
    }
}

impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn notify<'a>(&'a self, result: &'a ProbeResult) -> NotifyFuture<'a> {
        Box::pin(async move {
            if let Err(e) = self.send(result).await {
                log_failure(self.name(), result, &e);
            }
        })
    }
}
