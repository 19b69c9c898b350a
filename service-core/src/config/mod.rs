use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings shared by every service binary.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint. Tracing export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut loaded: Config = config.try_deserialize()?;

        // Unprefixed variables used by the deployment manifests.
        if let Ok(endpoint) = std::env::var("OTLP_ENDPOINT")
            && !endpoint.trim().is_empty()
        {
            loaded.otlp_endpoint = Some(endpoint);
        }
        if let Ok(level) = std::env::var("LOG_LEVEL")
            && !level.trim().is_empty()
        {
            loaded.log_level = level;
        }

        Ok(loaded)
    }
}
