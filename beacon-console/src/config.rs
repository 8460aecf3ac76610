use std::path::Path;
use std::time::Duration;

use jiff::tz::TimeZone;
use serde::Deserialize;

use crate::analytics::{AggregationOptions, DEFAULT_MAX_DAYS};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub list: ListConfig,
    pub analytics: AnalyticsConfig,
    pub cascade: CascadeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Value of the `Authorization` header, scheme included
    pub token: Option<String>,
    /// Network sent with collection requests unless overridden
    pub network: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a transport failure or 5xx response
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub items_per_page: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Number of most recent days kept in the daily history
    pub max_days: usize,
    /// `UTC` or an IANA zone name used to bucket timestamped samples
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Select the first option of a level as soon as it loads
    pub auto_select_first: bool,
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AnalyticsConfig {
    pub fn options(&self) -> color_eyre::Result<AggregationOptions> {
        let timezone = if self.timezone.eq_ignore_ascii_case("utc") {
            TimeZone::UTC
        } else {
            TimeZone::get(&self.timezone)?
        };

        Ok(AggregationOptions {
            max_days: self.max_days.max(1),
            timezone,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.airqo.net/api/v2".to_string(),
            token: None,
            network: None,
            timeout_secs: 15,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self { items_per_page: 8 }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_MAX_DAYS,
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            auto_select_first: true,
        }
    }
}
