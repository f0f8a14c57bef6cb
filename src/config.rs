use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const ENV_CONFIG_FILE: &str = "SERIES_ACCESS_CONFIG";
pub const ENV_URL: &str = "SERIES_ACCESS_URL";
pub const ENV_USER: &str = "SERIES_ACCESS_USER";
pub const ENV_PASSWORD: &str = "SERIES_ACCESS_PASSWORD";
pub const ENV_TIMEOUT_MS: &str = "SERIES_ACCESS_TIMEOUT_MS";
pub const ENV_ROLE_PAGE: &str = "SERIES_ACCESS_ROLE_PAGE";

/// Connection and paging settings for the admin backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Base URL of the admin node, e.g. `https://admin.example.org`.
    pub base_url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub request_timeout_ms: u64,
    /// Page size for role directory queries.
    pub role_page_size: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            user: None,
            password: None,
            request_timeout_ms: 30_000,
            role_page_size: 100,
        }
    }
}

/// Optional overrides; unspecified values inherit from the layer below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminConfigOverride {
    pub base_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub role_page_size: Option<usize>,
}

impl AdminConfigOverride {
    /// Read overrides from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> AppResult<Self> {
        let parse_num = |key: &str| -> AppResult<Option<u64>> {
            match get(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|e| AppError::user("invalid_config", format!("{}={}: {}", key, v, e))),
                None => Ok(None),
            }
        };
        Ok(Self {
            base_url: get(ENV_URL),
            user: get(ENV_USER),
            password: get(ENV_PASSWORD),
            request_timeout_ms: parse_num(ENV_TIMEOUT_MS)?,
            role_page_size: parse_num(ENV_ROLE_PAGE)?.map(|n| n as usize),
        })
    }
}

impl AdminConfig {
    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::io("config_read", format!("{}: {}", path.display(), e)))?;
        let cfg: AdminConfig = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    /// Overlay `ov` on top of `self`.
    pub fn merged(mut self, ov: &AdminConfigOverride) -> Self {
        if let Some(v) = &ov.base_url { self.base_url = v.clone(); }
        if ov.user.is_some() { self.user = ov.user.clone(); }
        if ov.password.is_some() { self.password = ov.password.clone(); }
        if let Some(v) = ov.request_timeout_ms { self.request_timeout_ms = v; }
        if let Some(v) = ov.role_page_size { self.role_page_size = v; }
        self
    }

    /// Defaults, then the file named by `SERIES_ACCESS_CONFIG`, then the environment.
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var(ENV_CONFIG_FILE) {
            Ok(p) if !p.trim().is_empty() => Self::from_file(Path::new(p.trim()))?,
            _ => Self::default(),
        };
        Ok(base.merged(&AdminConfigOverride::from_env()?))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::user("invalid_config", "base_url must not be empty"));
        }
        if self.role_page_size == 0 {
            return Err(AppError::user("invalid_config", "role_page_size must be positive"));
        }
        Ok(())
    }
}
