use std::time::Duration;

use dotenvy::dotenv;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Gateway connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    /// Bounds a hung request; surfaces as a network error when exceeded.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Read `IOT_API_URL` and `IOT_API_TIMEOUT_SECS` from the environment
    /// (a `.env` file is honored), falling back to the defaults.
    pub fn from_env() -> Self {
        dotenv().ok();
        let base_url =
            std::env::var("IOT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let timeout = std::env::var("IOT_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, timeout }
    }
}
