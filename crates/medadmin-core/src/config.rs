//! Panel configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use medadmin_session::LOGIN_PATH;
use medadmin_table::DEFAULT_PAGE_LENGTH;
use medadmin_ui::DEFAULT_ALERT_TTL;

use crate::error::CoreError;
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base for relative API paths
    pub base_url: String,
    /// Login page; every other admin page requires a token
    pub login_path: String,
    /// Path to the database file
    pub database_path: PathBuf,
    pub alert_ttl_ms: u64,
    /// Initial grid page length
    pub page_length: usize,
    /// None leaves requests without a timeout
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: LOGIN_PATH.to_string(),
            database_path: data_dir.join("admin.db"),
            alert_ttl_ms: DEFAULT_ALERT_TTL.as_millis() as u64,
            page_length: DEFAULT_PAGE_LENGTH,
            request_timeout_secs: None,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("MedChinaAdmin"))
            .unwrap_or_else(|| PathBuf::from(".medadmin"))
    }

    /// Defaults overridden by `MEDADMIN_BASE_URL`, `MEDADMIN_DB_PATH` and
    /// `MEDADMIN_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match lookup("MEDADMIN_BASE_URL") {
            Some(value) => config.base_url = parse_base_url(&value)?.to_string(),
            None => tracing::info!(
                default = %config.base_url,
                "MEDADMIN_BASE_URL not set, using default"
            ),
        }

        match lookup("MEDADMIN_DB_PATH") {
            Some(value) if !value.trim().is_empty() => {
                config.database_path = PathBuf::from(value.trim())
            }
            _ => tracing::info!(
                default = %config.database_path.display(),
                "MEDADMIN_DB_PATH not set, using default"
            ),
        }

        if let Some(value) = lookup("MEDADMIN_TIMEOUT_SECS") {
            let secs = value.trim().parse::<u64>().map_err(|e| {
                tracing::warn!(value = %value, error = %e, "Invalid MEDADMIN_TIMEOUT_SECS");
                CoreError::Config(format!("MEDADMIN_TIMEOUT_SECS: {}", e))
            })?;
            config.request_timeout_secs = (secs > 0).then_some(secs);
        }

        Ok(config)
    }

    pub fn base_url(&self) -> Result<Url> {
        parse_base_url(&self.base_url)
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_millis(self.alert_ttl_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

/// Parse a base URL, making sure relative joins keep its whole path
pub(crate) fn parse_base_url(value: &str) -> Result<Url> {
    let value = value.trim();
    let value = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    };
    Url::parse(&value).map_err(|e| CoreError::Config(format!("invalid base URL {}: {}", value, e)))
}
