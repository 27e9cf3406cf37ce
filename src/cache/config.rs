//! Result cache configuration.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_FRESHNESS_SECS: u64 = 5 * 60;

/// Result cache configuration from `newsdesk.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep fetched results in memory between requests.
    pub enabled: bool,
    /// Age after which a cached result is treated as absent.
    #[serde(with = "secs")]
    pub freshness: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            freshness: Duration::from_secs(DEFAULT_FRESHNESS_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            freshness: settings.freshness,
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
