use serde::{Deserialize, Serialize};

use super::{ALERT_TIMEOUT, AlertError, AlertSink, NotifyFuture, alert_text, log_failure};
use crate::http_probe::prelude::*;

/// Sends a text message through a DingTalk custom robot webhook.
#[derive(Debug, Clone)]
pub struct DingTalkSink {
    client: reqwest::Client,
    webhook_url: String,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextContent<'a>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

/// The robot answers 200 even on failure and reports the outcome in the body.
#[derive(Debug, Deserialize)]
struct RobotResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl DingTalkSink {
    pub fn new(client: reqwest::Client, webhook_url: &str) -> Self {
        Self {
            client,
            webhook_url: webhook_url.to_string(),
        }
    }

    async fn send(&self, result: &ProbeResult) -> Result<(), AlertError> {
        let content = alert_text(result);
        let message = TextMessage {
            msgtype: "text",
            text: TextContent { content: &content },
        };

        let request_error = |source: reqwest::Error| AlertError::Request {
            url: self.webhook_url.clone(),
            source,
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .timeout(ALERT_TIMEOUT)
            .json(&message)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Rejected {
                url: self.webhook_url.clone(),
                status,
                body,
            });
        }

        let reply: RobotResponse = response.json().await.map_err(request_error)?;
        if reply.errcode != 0 {
            return Err(AlertError::Rejected {
                url: self.webhook_url.clone(),
                status,
                body: format!("errcode {}: {}", reply.errcode, reply.errmsg),
            });
        }
        Ok(())
    }
}

impl AlertSink for DingTalkSink {
    fn name(&self) -> &str {
        "dingtalk"
    }

    fn notify<'a>(&'a self, result: &'a ProbeResult) -> NotifyFuture<'a> {
        Box::pin(async move {
            if let Err(e) = self.send(result).await {
                log_failure(self.name(), result, &e);
            }
        })
    }
}
