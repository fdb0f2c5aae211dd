use serde::Deserialize;
use std::time::Duration;

use super::cache::MemoryKeyCacher;

pub(super) const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(10);

/// Serializable settings for a JWKS client, meant to be embedded in an
/// application's own configuration file.
///
/// ```
/// use jwt_bearer_rs::{CacheMode, JwksClientOptions};
///
/// let options: JwksClientOptions = serde_json::from_str(
///     r#"{"uri": "https://issuer.example/.well-known/jwks.json",
///         "cache": {"mode": "bounded", "max_age_secs": 600, "capacity": 5}}"#,
/// )
/// .unwrap();
/// assert_eq!(options.timeout_secs, Some(10));
/// assert!(matches!(options.cache, CacheMode::Bounded { capacity: 5, .. }));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct JwksClientOptions {
    pub uri: String,
    /// Per-request HTTP timeout; `null` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub cache: CacheMode,
}

impl JwksClientOptions {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            timeout_secs: default_timeout_secs(),
            cache: CacheMode::default(),
        }
    }

    pub(super) fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_timeout_secs() -> Option<u64> {
    Some(DEFAULT_JWKS_TIMEOUT.as_secs())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CacheMode {
    /// Keep every downloaded key for the life of the process.
    #[default]
    Persistent,
    /// Keep at most `capacity` requested keys, each for at most `max_age_secs`.
    Bounded {
        #[serde(default)]
        max_age_secs: Option<u64>,
        capacity: usize,
    },
    /// Resolve every key through a download.
    Disabled,
}

impl CacheMode {
    pub fn build(&self) -> MemoryKeyCacher {
        match self {
            CacheMode::Persistent => MemoryKeyCacher::persistent(),
            CacheMode::Bounded {
                max_age_secs,
                capacity,
            } => MemoryKeyCacher::new(max_age_secs.map(Duration::from_secs), Some(*capacity)),
            CacheMode::Disabled => MemoryKeyCacher::disabled(),
        }
    }
}
