//! Application configuration management.
//!
//! Two layers feed the client:
//! - `ApiEnvironment`: values read from the process environment
//!   (`INDE_API_URL`, `INDE_ENV`), which decide the API base URL
//! - `Config`: small persisted preferences stored at
//!   `~/.config/inde/config.json`

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "inde";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Explicit API base URL override.
pub const API_URL_ENV: &str = "INDE_API_URL";

/// Also honoured so a front-end `.env` file can be reused as-is.
pub const LEGACY_API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

/// `development` or `production`.
pub const MODE_ENV: &str = "INDE_ENV";

/// API served by a locally running backend.
pub const DEV_API_URL: &str = "http://localhost:8001";

/// Production API host.
pub const PROD_API_URL: &str = "https://api.inde.kr";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Debug builds default to development, release builds to production.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Mode::Development),
            "production" | "prod" => Some(Mode::Production),
            _ => None,
        }
    }
}

/// Inputs for base URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEnvironment {
    pub api_url: Option<String>,
    pub mode: Mode,
}

impl ApiEnvironment {
    pub fn new(api_url: Option<String>, mode: Mode) -> Self {
        Self { api_url, mode }
    }

    /// Read `INDE_API_URL` (or `NEXT_PUBLIC_API_URL`) and `INDE_ENV`.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV)
            .or_else(|_| std::env::var(LEGACY_API_URL_ENV))
            .ok();
        let mode = std::env::var(MODE_ENV)
            .ok()
            .and_then(|v| Mode::parse(&v))
            .unwrap_or_else(Mode::build_default);
        Self { api_url, mode }
    }

    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }
}

/// Pick the API base URL: explicit override, else the local backend in
/// development, else production.
pub fn resolve_base_url(env: &ApiEnvironment) -> String {
    if let Some(url) = env.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    match env.mode {
        Mode::Development => DEV_API_URL.to_string(),
        Mode::Production => PROD_API_URL.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Used when no environment override is set.
    pub api_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Environment from the process, falling back to the configured URL.
    pub fn environment(&self) -> ApiEnvironment {
        let mut env = ApiEnvironment::from_env();
        if env.api_url.is_none() {
            env.api_url = self.api_url.clone();
        }
        env
    }
}
