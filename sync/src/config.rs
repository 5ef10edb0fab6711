//! Sync configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use walletview_utils::LogFormat;

use crate::SyncError;

/// Configuration for the wallet sync engine and its daemon.
///
/// Can be loaded from a TOML file via [`SyncConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Wallet service host.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Wallet service JSON-RPC port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// RPC password, sent with every request when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_password: Option<String>,

    /// Sleep between the end of one cycle and the start of the next.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Deadline for each individual RPC call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Upper bound for the retry delay after repeated transport failures.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// IANA zone name used for displayed times (e.g. "Europe/Berlin").
    /// Falls back to `TZ`, then the system zone, then UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Number of undelivered view updates buffered before the driver waits.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    8070
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_call_timeout_secs() -> u64 {
    10
}

fn default_max_backoff_secs() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SyncConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SyncError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SyncError> {
        let config: Self = toml::from_str(s).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, SyncError> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Reject values the driver cannot run with.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.refresh_interval_secs == 0 {
            return Err(SyncError::Config(
                "refresh_interval_secs must be at least 1".into(),
            ));
        }
        if self.call_timeout_secs == 0 {
            return Err(SyncError::Config("call_timeout_secs must be at least 1".into()));
        }
        if self.channel_capacity == 0 {
            return Err(SyncError::Config("channel_capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            rpc_password: None,
            refresh_interval_secs: default_refresh_interval_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            timezone: None,
            channel_capacity: default_channel_capacity(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
