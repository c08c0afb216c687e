use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use super::constants::{ACK_TIMEOUT_SECS, LOG_FILE_PATH, PAGE_SIZE};
use super::defaults::*;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    #[serde(default)]
    pub file: LogFile,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    #[serde(default = "log_file_path")]
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BackendConfig {
    /// Display name used in logs and the screen title
    #[serde(default)]
    pub alias: Option<String>,

    /// GraphQL HTTP endpoint, e.g. https://example.com/graphql
    #[serde(default)]
    pub endpoint: String,

    /// Websocket endpoint for subscriptions. Derived from `endpoint`
    /// when omitted.
    #[serde(default)]
    pub realtime_endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u16>,

    #[serde(default = "page_size")]
    pub page_size: usize,

    #[serde(default = "ack_timeout_secs")]
    pub ack_timeout_secs: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(|secs| Duration::from_secs(secs as u64))
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    /// realtime_endpoint returns the configured websocket endpoint, or the
    /// HTTP endpoint with its scheme switched to ws/wss.
    pub fn realtime_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = self.realtime_endpoint.as_deref() {
            let url = url::Url::parse(endpoint)
                .wrap_err(format!("parsing realtime endpoint {}", endpoint))?;
            return Ok(url.to_string());
        }

        let mut url = url::Url::parse(&self.endpoint)
            .wrap_err(format!("parsing endpoint {}", self.endpoint))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => eyre::bail!("unsupported endpoint scheme {}", other),
        };
        url.set_scheme(scheme)
            .map_err(|_| eyre::eyre!("switching {} to {}", self.endpoint, scheme))?;
        Ok(url.to_string())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some("info".to_string()),
            file: LogFile::default(),
            filters: None,
        }
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            path: LOG_FILE_PATH.to_string(),
            append: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            alias: None,
            endpoint: String::new(),
            realtime_endpoint: None,
            api_key: None,
            auth_token: None,
            timeout_secs: None,
            page_size: PAGE_SIZE,
            ack_timeout_secs: ACK_TIMEOUT_SECS,
        }
    }
}
