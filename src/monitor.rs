//! One monitoring run: probe every target, print the report, raise alerts.

use std::process::ExitCode;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Semaphore;

use crate::alert::AlertDispatcher;
use crate::config::AppConfig;
use crate::http_probe::prelude::*;
use crate::report;

async fn handle_result(
    config: &AppConfig,
    target: &ProbeTarget,
    result: &ProbeResult,
    alerts: &AlertDispatcher,
) {
    println!();
    println!("{}", report::format_result(result, &target.name, config.max_name_width));

    if result.is_healthy() {
        log::debug!("{} is healthy", target.url);
    } else {
        log::warn!(
            "{} is unhealthy: {}",
            target.url,
            result.error_detail().unwrap_or_default()
        );
        alerts.dispatch(result).await;
    }
}

async fn run_sequential(
    config: &AppConfig,
    client: &Client,
    alerts: &AlertDispatcher,
) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        let result = probe_url(client, target).await;
        handle_result(config, target, &result, alerts).await;
        results.push(result);
    }
    results
}

/// Probes run in parallel up to `max_concurrency`; results are still handled
/// in configuration order.
async fn run_concurrent(
    config: &AppConfig,
    client: &Client,
    alerts: &AlertDispatcher,
) -> Vec<ProbeResult> {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
    let mut handles = Vec::with_capacity(config.targets.len());

    for target in &config.targets {
        let client = client.clone();
        let target = target.clone();
        let semaphore = semaphore.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            probe_url(&client, &target).await
        });
        handles.push(handle);
    }

    let mut results = Vec::with_capacity(handles.len());
    for (target, handle) in config.targets.iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => ProbeResult::unknown_error(&target.url, format!("probe task failed: {e}")),
        };
        handle_result(config, target, &result, alerts).await;
        results.push(result);
    }
    results
}

/// Probe all configured targets and return their results in configuration order.
pub async fn run(config: &AppConfig, client: &Client, alerts: &AlertDispatcher) -> Vec<ProbeResult> {
    println!("{}", report::banner(&chrono::Local::now()));

    let results = if config.max_concurrency <= 1 {
        run_sequential(config, client, alerts).await
    } else {
        run_concurrent(config, client, alerts).await
    };

    println!();
    println!("{}", report::summary(&results));
    println!("{}", report::footer());

    log::info!("Run finished: {}", report::summary(&results));
    results
}

/// Success only when every target is healthy, so schedulers can alert on the exit status.
pub fn exit_code(results: &[ProbeResult]) -> ExitCode {
    if results.iter().all(ProbeResult::is_healthy) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertSink;
    use crate::alert::tests::RecordingSink;
    use crate::http_probe::test_client;
    use crate::config::app_config::{Overrides, parse_config};
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn site() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>心理测试</h1>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stale"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>coming soon</h1>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("心理测试")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        server
    }

    fn config_for(server: &MockServer, max_concurrency: usize) -> AppConfig {
        let yaml = format!(
            r#"
            marker: 心理测试
            max_concurrency: {max_concurrency}
            targets:
                - url: {uri}/slow
                - url: {uri}/ok
                - url: {uri}/missing
                - url: {uri}/stale
            "#,
            uri = server.uri()
        );
        parse_config(&yaml, &Overrides::default()).expect("valid config")
    }

    fn recording() -> (AlertDispatcher, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn AlertSink>> = vec![Box::new(RecordingSink {
            seen: seen.clone(),
        }) as Box<dyn AlertSink>];
        (AlertDispatcher::new(sinks), seen)
    }

    fn statuses(results: &[ProbeResult]) -> Vec<ProbeStatus> {
        results.iter().map(ProbeResult::status).collect()
    }

    const EXPECTED: [ProbeStatus; 4] = [
        ProbeStatus::Healthy,
        ProbeStatus::Healthy,
        ProbeStatus::HttpError,
        ProbeStatus::ContentMismatch,
    ];

    #[tokio::test]
    async fn test_sequential_run_alerts_on_unhealthy_only() {
        let server = site().await;
        let config = config_for(&server, 1);
        let (alerts, seen) = recording();

        let results = run(&config, &test_client(), &alerts).await;

        assert_eq!(statuses(&results), EXPECTED);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![format!("{}/missing", server.uri()), format!("{}/stale", server.uri())]
        );
        assert_eq!(exit_code(&results), ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_config_order() {
        let server = site().await;
        let config = config_for(&server, 4);
        let (alerts, seen) = recording();

        let results = run(&config, &test_client(), &alerts).await;

        assert_eq!(statuses(&results), EXPECTED);
        let urls: Vec<&str> = results.iter().map(ProbeResult::url).collect();
        let expected: Vec<String> = ["slow", "ok", "missing", "stale"]
            .iter()
            .map(|p| format!("{}/{p}", server.uri()))
            .collect();
        assert_eq!(urls, expected);
        assert_eq!(seen.lock().expect("lock").len(), 2);
    }

    #[test]
    fn test_exit_code_success_when_all_healthy() {
        let results = vec![ProbeResult::healthy("https://a.example/", 200, Duration::ZERO)];
        assert_eq!(exit_code(&results), ExitCode::SUCCESS);
    }
}
