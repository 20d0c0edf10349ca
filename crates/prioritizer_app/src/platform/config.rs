//! Runtime configuration: optional RON file, then CLI/env overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use prioritizer_core::RevealSettings;
use prioritizer_engine::{ApiSettings, ChannelSettings, EngineSettings};
use serde::Deserialize;
use thiserror::Error;

use super::logging::LogDestination;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "prioritizer.ron";

/// Upper bound for every pacing delay (one hour).
pub const MAX_DELAY_MS: u64 = 60 * 60 * 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unknown log level `{0}`")]
    LogLevel(String),
    #[error("invalid base url `{url}`: {message}")]
    BaseUrl { url: String, message: String },
    #[error("{field} = {value} is out of range (0..={max})")]
    Delay {
        field: &'static str,
        value: u64,
        max: u64,
    },
    #[error("reveal_batch_chars must be at least 1")]
    BatchChars,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub model: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    pub reveal_tick_ms: u64,
    pub reveal_batch_chars: usize,
    pub settle_delay_ms: u64,
    pub scroll_delay_ms: u64,
    pub log_level: String,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "gpt-4o-mini".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 300_000,
            reconnect_delay_ms: 5_000,
            reveal_tick_ms: 10,
            reveal_batch_chars: 6,
            settle_delay_ms: 1_000,
            scroll_delay_ms: 200,
            log_level: "info".to_string(),
            log_destination: LogDestination::File,
        }
    }
}

/// Values that win over the file when present.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Reads `explicit`, or the default file if it exists, or falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_ron(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|err| err.to_string())
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn reveal_settings(&self) -> Result<RevealSettings, ConfigError> {
        if self.reveal_batch_chars == 0 {
            return Err(ConfigError::BatchChars);
        }
        Ok(RevealSettings {
            tick: delay("reveal_tick_ms", self.reveal_tick_ms)?,
            batch_chars: self.reveal_batch_chars,
            settle_delay: delay("settle_delay_ms", self.settle_delay_ms)?,
            scroll_delay: delay("scroll_delay_ms", self.scroll_delay_ms)?,
        })
    }

    /// `with_channel` is false for commands that only use the REST endpoints.
    pub fn engine_settings(&self, with_channel: bool) -> Result<EngineSettings, ConfigError> {
        let channel = if with_channel {
            let mut channel =
                ChannelSettings::for_base_url(&self.base_url).map_err(|err| {
                    ConfigError::BaseUrl {
                        url: self.base_url.clone(),
                        message: err.to_string(),
                    }
                })?;
            channel.reconnect_delay = delay("reconnect_delay_ms", self.reconnect_delay_ms)?;
            Some(channel)
        } else {
            None
        };

        Ok(EngineSettings {
            api: ApiSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
            },
            channel,
        })
    }
}

fn delay(field: &'static str, value: u64) -> Result<Duration, ConfigError> {
    if value > MAX_DELAY_MS {
        return Err(ConfigError::Delay {
            field,
            value,
            max: MAX_DELAY_MS,
        });
    }
    Ok(Duration::from_millis(value))
}
