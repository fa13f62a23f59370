//! Settings file loading and validation

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use hostscope_logs::LogSources;
use hostscope_types::DisplayLimits;

const DEFAULT_QUIT_TOKEN: &str = "q";
const DEFAULT_FAIL2BAN_CLIENT: &str = "fail2ban-client";
const DEFAULT_FAIL2BAN_TIMEOUT_SECS: f64 = 5.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings as written in the file; every key optional until validated
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    ufw_log: Option<PathBuf>,
    auth_log: Option<PathBuf>,
    fail2ban_log: Option<PathBuf>,
    update_interval: Option<f64>,
    quit_token: Option<String>,
    fail2ban_client: Option<String>,
    fail2ban_timeout: Option<f64>,
    #[serde(default)]
    limits: DisplayLimits,
}

/// Validated settings handed to the refresh loop
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub sources: LogSources,
    pub update_interval: Duration,
    pub quit_token: String,
    pub fail2ban_client: String,
    /// Upper bound for one `fail2ban-client` call
    pub fail2ban_timeout: Duration,
    pub limits: DisplayLimits,
}

impl Settings {
    /// Load and validate a settings file
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let raw: RawSettings = if is_json {
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        Self::validate(raw)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let sources = LogSources {
            firewall: raw.ufw_log.ok_or(ConfigError::Missing("ufw_log"))?,
            auth: raw.auth_log.ok_or(ConfigError::Missing("auth_log"))?,
            ban: raw.fail2ban_log.ok_or(ConfigError::Missing("fail2ban_log"))?,
        };

        let interval = raw
            .update_interval
            .ok_or(ConfigError::Missing("update_interval"))?;
        let update_interval = positive_secs("update_interval", interval)?;

        let quit_token = raw
            .quit_token
            .unwrap_or_else(|| DEFAULT_QUIT_TOKEN.to_string())
            .trim()
            .to_string();
        if quit_token.is_empty() {
            return Err(ConfigError::Invalid {
                key: "quit_token",
                reason: "must not be empty".to_string(),
            });
        }

        let fail2ban_client = raw
            .fail2ban_client
            .unwrap_or_else(|| DEFAULT_FAIL2BAN_CLIENT.to_string());
        if fail2ban_client.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "fail2ban_client",
                reason: "must not be empty".to_string(),
            });
        }

        let fail2ban_timeout = positive_secs(
            "fail2ban_timeout",
            raw.fail2ban_timeout.unwrap_or(DEFAULT_FAIL2BAN_TIMEOUT_SECS),
        )?;

        Ok(Self {
            sources,
            update_interval,
            quit_token,
            fail2ban_client,
            fail2ban_timeout,
            limits: raw.limits,
        })
    }

    /// Replace the refresh interval, e.g. from the command line
    pub fn with_interval(mut self, secs: f64) -> Result<Self, ConfigError> {
        self.update_interval = positive_secs("update_interval", secs)?;
        Ok(self)
    }
}

fn positive_secs(key: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be a positive number of seconds, got {}", secs),
        });
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
