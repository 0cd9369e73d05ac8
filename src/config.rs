//! Minimal runtime configuration helpers.
//! Defaults align with a backend running locally on :8080.

use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;

pub const DEFAULT_STATE_DIR: &str = ".energy-controller";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL including the `/api` prefix.
    pub api_url: String,
    /// Where the session token and settings caches are persisted.
    pub state_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, String> {
        let api_url = match lookup("ENERGY_API_URL") {
            Some(v) if v.trim().is_empty() => return Err("ENERGY_API_URL is set but empty".to_string()),
            Some(v) => v.trim().trim_end_matches('/').to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        };
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(format!("ENERGY_API_URL must be an http(s) URL, got {}", api_url));
        }

        let state_dir = lookup("ENERGY_STATE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        Ok(Config { api_url, state_dir })
    }
}
