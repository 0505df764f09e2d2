//! Result channel configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 25_000;

/// Configuration shared by every namespace of a [`crate::ResultChannels`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Wait budget used by the `get_*` helpers (default: 25s)
    pub default_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ChannelConfig {
    /// Parse a configuration from TOML; missing fields take their defaults
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
