use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::models::DEFAULT_LANGUAGE;

const DEFAULT_PORT: u16 = 7000;

/// Server-wide defaults, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tmdb_api_key: Option<String>,
    pub serp_api_key: Option<String>,
    pub language: String,
    pub fallback_language: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            serp_api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            fallback_language: DEFAULT_LANGUAGE.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match non_empty_var("PORT") {
            Some(p) => p.parse().with_context(|| format!("Invalid PORT '{}'", p))?,
            None => DEFAULT_PORT,
        };
        let config = Self {
            tmdb_api_key: non_empty_var("TMDB_API_KEY"),
            serp_api_key: non_empty_var("SERPAPI_KEY"),
            language: non_empty_var("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            fallback_language: non_empty_var("FALLBACK_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            port,
        };
        if config.tmdb_api_key.is_none() {
            warn!("TMDB_API_KEY not set - every request must carry its own key");
        }
        Ok(config)
    }

    /// Layers request settings over the server defaults.
    pub fn effective(&self, user: &UserSettings) -> EffectiveSettings {
        EffectiveSettings {
            tmdb_key: user.tmdb_key().or(self.tmdb_api_key.clone()),
            serp_key: user.serp_key().or(self.serp_api_key.clone()),
            language: user.lang().unwrap_or_else(|| self.language.clone()),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Per-user overrides, from the manifest path segment or the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettings {
    #[serde(default, alias = "tmdbApiKey", alias = "tmdb")]
    pub tmdb_key: Option<String>,
    #[serde(default, alias = "serpApiKey", alias = "serpapi_key")]
    pub serp_key: Option<String>,
    #[serde(default, alias = "language")]
    pub lang: Option<String>,
}

impl UserSettings {
    /// Decodes the percent-encoded JSON segment Stremio keeps in front of
    /// `/manifest.json` for configured installs.
    pub fn from_path_segment(segment: &str) -> Result<Self> {
        let decoded = urlencoding::decode(segment).context("config segment is not valid UTF-8")?;
        serde_json::from_str(&decoded).context("config segment is not a JSON object")
    }

    /// Fields set in `self` win over `other`.
    pub fn or(self, other: UserSettings) -> UserSettings {
        UserSettings {
            tmdb_key: self.tmdb_key.or(other.tmdb_key),
            serp_key: self.serp_key.or(other.serp_key),
            lang: self.lang.or(other.lang),
        }
    }

    pub fn tmdb_key(&self) -> Option<String> {
        clean(self.tmdb_key.as_deref())
    }

    pub fn serp_key(&self) -> Option<String> {
        clean(self.serp_key.as_deref())
    }

    pub fn lang(&self) -> Option<String> {
        clean(self.lang.as_deref())
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub tmdb_key: Option<String>,
    pub serp_key: Option<String>,
    pub language: String,
}

/// Logs where the environment came from; a missing `.env` is not an error.
pub fn report_dotenv(loaded: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match loaded {
        Ok(path) => {
            info!("Loaded environment from {:?}", path);
            Some(path)
        }
        Err(e) => {
            warn!("No .env file loaded ({}) - relying on environment", e);
            None
        }
    }
}
