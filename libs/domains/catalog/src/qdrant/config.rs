use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

/// Qdrant connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// gRPC endpoint, e.g. `http://localhost:6334`
    pub url: String,
    pub api_key: Option<String>,
    /// Upper bound for every individual store call
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FromEnv for QdrantConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_or_default("QDRANT_URL", "http://localhost:6334"),
            api_key: std::env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs: env_parse("QDRANT_TIMEOUT_SECS", 30)?,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}
