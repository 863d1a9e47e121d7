//! Fetcher settings
//!
//! Timeouts used when dialing and handshaking with a remote endpoint. They are
//! fixed when a [`ChainFetcher`](crate::checks::ChainFetcher) is built and
//! never change afterwards.

use crate::utils::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default ceiling on resolving and connecting to the endpoint
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Default ceiling on the TLS handshake once TCP is connected
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Connection settings for fetching certificate chains
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_handshake_timeout() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT_SECS
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        }
    }
}

impl FetchSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Reject timeouts that would make every fetch fail immediately
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "connect_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.handshake_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "handshake_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate settings from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        Self::from_toml_str(&content)
    }
}
