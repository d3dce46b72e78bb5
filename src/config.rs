use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_KEYS: &[&str] = &[
    "DATABASE_URL",
    "HOST",
    "PORT",
    "LOGLEVEL",
    "IMAGE_FETCH_TIMEOUT_SECS",
    "IMAGE_MAX_BYTES",
    "SEED_ON_EMPTY",
    "CORS_ALLOW_ORIGINS",
];

/// Process configuration, loaded once by `main` and passed down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// sqlx SQLite URL. Empty means storage is not configured.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub loglevel: String,
    pub image_fetch_timeout_secs: u64,
    pub image_max_bytes: usize,
    pub seed_on_empty: bool,
    /// Comma-separated origins; empty allows any origin.
    pub cors_allow_origins: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:visions.db".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3001,
            loglevel: "info".to_string(),
            image_fetch_timeout_secs: 10,
            image_max_bytes: 5 * 1024 * 1024,
            seed_on_empty: false,
            cors_allow_origins: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Defaults overlaid with the process environment (keys are lowercased).
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::raw().only(ENV_KEYS))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }

    pub fn storage_configured(&self) -> bool {
        !self.database_url.trim().is_empty()
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allow_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}
