use std::io::ErrorKind;
use std::time::{Duration, Instant};

use reqwest::StatusCode;

use super::prelude::*;
use super::report;

/// One URL to probe, with its effective timeout and optional content marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTarget {
    pub name: String,
    pub url: String,
    pub timeout: Duration,
    pub marker: Option<String>,
}

/// Walk the error chain looking for an error that means the server could not
/// be reached or dropped the connection before answering.
fn is_connection_error(err: &reqwest::Error) -> bool {
    if err.is_connect() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(src) = source {
        // Peer closed the socket before sending a complete response.
        if let Some(hyper_err) = src.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return true;
            }
        }
        if let Some(io) = src.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = src.source();
    }
    false
}

fn classify_error(target: &ProbeTarget, err: &reqwest::Error) -> ProbeResult {
    if err.is_timeout() {
        ProbeResult::timeout(&target.url, target.timeout)
    } else if is_connection_error(err) {
        ProbeResult::connection_failure(&target.url)
    } else {
        ProbeResult::unknown_error(&target.url, report(err))
    }
}

/// Issue a single GET against `target` and classify the outcome.
///
/// The timeout bounds the whole exchange, body included. Errors never escape:
/// every failure mode is folded into the returned [`ProbeResult`].
pub async fn probe_url(client: &reqwest::Client, target: &ProbeTarget) -> ProbeResult {
    log::debug!("Probing {} (timeout {:?})", target.url, target.timeout);

    let start = Instant::now();
    let response = match client.get(&target.url).timeout(target.timeout).send().await {
        Ok(resp) => resp,
        Err(e) => return classify_error(target, &e),
    };

    let status = response.status();
    if status != StatusCode::OK {
        return ProbeResult::http_error(&target.url, status.as_u16(), start.elapsed());
    }

    let Some(marker) = target.marker.as_deref() else {
        return ProbeResult::healthy(&target.url, status.as_u16(), start.elapsed());
    };

    // Decoded per the response charset, UTF-8 when none is declared.
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return classify_error(target, &e),
    };
    let elapsed = start.elapsed();

    if body.contains(marker) {
        ProbeResult::healthy(&target.url, status.as_u16(), elapsed)
    } else {
        ProbeResult::content_mismatch(&target.url, status.as_u16(), elapsed)
    }
}
