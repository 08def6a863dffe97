//! Configuration file management.
//!
//! Handles reading `opcli.toml`, looked up in the current directory first and
//! then in the user configuration directory (`~/.config/opcli/opcli.toml`).
//! Every setting is optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Client configuration stored in `opcli.toml`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Explicit path to the `op` binary. Searched on `PATH` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    /// Account to sign in to: user UUID, email, or sign-in URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Bound on sign-in attempts in seconds. `0` disables the bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signin_timeout_secs: Option<u64>,
    /// Bound on every other `op` call in seconds. Unset or `0` means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

impl Config {
    /// Candidate config paths, most specific first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(constants::CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(constants::CONFIG_DIR).join(constants::CONFIG_FILE));
        }
        paths
    }

    /// Load the first config file found, or the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file can't be read,
    /// `ConfigError::Parse` if the TOML is malformed, or
    /// `ConfigError::InvalidValue` if a setting is out of range.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate setting values.
    pub fn validate(&self) -> Result<()> {
        if let Some(account) = &self.account {
            if account.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "account",
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }
        if let Some(binary) = &self.binary {
            if binary.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "binary",
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Effective sign-in timeout.
    pub fn signin_timeout(&self) -> Option<Duration> {
        match self.signin_timeout_secs {
            None => Some(constants::DEFAULT_SIGNIN_TIMEOUT),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        }
    }

    /// Effective timeout for non-signin commands.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
