use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

pub mod alert;
use alert::AlertDispatcher;
pub mod config;
use config::{ConfigError, Overrides, load_config, setup_client};
pub mod http_probe;
pub mod monitor;
pub mod report;

/// Exit status for configuration and startup failures.
const CONFIG_ERROR_EXIT: u8 = 2;

/// Probe a list of websites once and alert on anything unhealthy.
///
/// Meant to be run periodically by cron, a systemd timer or a similar scheduler.
#[derive(Debug, Parser)]
#[command(name = "pulsecheck", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config.yml")]
    config: PathBuf,

    /// Default request timeout in seconds, overriding the config file
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Default required marker, overriding the config file
    #[arg(short, long)]
    marker: Option<String>,

    /// Maximum number of probes in flight at once
    #[arg(long)]
    concurrency: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            timeout_seconds: self.timeout,
            marker: self.marker.clone(),
            max_concurrency: self.concurrency,
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, ConfigError> {
    let overrides = Overrides::from_env()?.merge(cli.overrides());

    log::info!("Using config file: {}", cli.config.display());
    let config = load_config(&cli.config, &overrides)?;

    let probe_client = setup_client(&config)?;
    // Sinks bound each delivery with their own per-request timeout.
    let alert_client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()?;

    let alerts = AlertDispatcher::from_config(&config.alerts, &alert_client);
    log::info!("Alert sinks: {:?}", alerts.sink_names());

    let results = monitor::run(&config, &probe_client, &alerts).await;
    Ok(monitor::exit_code(&results))
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", http_probe::report(&e));
            ExitCode::from(CONFIG_ERROR_EXIT)
        }
    }
}
