pub mod app_config;
pub mod error;
pub mod model;

pub use app_config::{AppConfig, Overrides, load_config, setup_client};
pub use error::ConfigError;
