use std::time::Duration;

use serde::Deserialize;

use crate::services::recommendations::FanOutPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. In-memory stores are used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. Catalog responses are not cached when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Secret used to sign bearer tokens
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds
    #[serde(default = "default_jwt_ttl_secs")]
    pub jwt_ttl_secs: i64,

    /// Per-request timeout for catalog calls
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Deadline for a whole recommendation aggregation
    #[serde(default = "default_recommendation_timeout_secs")]
    pub recommendation_timeout_secs: u64,

    /// How a failed per-genre discovery call is handled
    #[serde(default)]
    pub recommendation_fan_out: FanOutPolicy,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_jwt_ttl_secs() -> i64 {
    86_400
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_recommendation_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn recommendation_timeout(&self) -> Duration {
        Duration::from_secs(self.recommendation_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
