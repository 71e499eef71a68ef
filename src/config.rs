//! Configuration loaded from the environment (and `.env`, via `dotenvy`).
//!
//! Credentials are only required by the commands that talk to Spotify, so
//! they live apart from the report settings.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::schedule::DayOrder;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const DEFAULT_TOKEN_CACHE: &str = ".spotify_token_cache.json";
pub const DEFAULT_FESTIVAL_NAME: &str = "FESTIVAL";
pub const DEFAULT_FESTIVAL_DAYS: &str = "Wednesday,Thursday,Friday,Saturday,Sunday";

/// Loads `.env` if one exists and returns its path. A missing file is not an
/// error. Runs before logging is set up, so the caller reports the path.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_cache: PathBuf,
}

impl SpotifyConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        Ok(Self {
            client_id: required("RSPOTIFY_CLIENT_ID")?,
            client_secret: required("RSPOTIFY_CLIENT_SECRET")?,
            redirect_uri: lookup("RSPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            token_cache: PathBuf::from(
                lookup("SPOTIFY_TOKEN_CACHE").unwrap_or_else(|| DEFAULT_TOKEN_CACHE.to_string()),
            ),
        })
    }
}

/// Settings for the written schedules.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Title printed at the top of every schedule, e.g. "GLASTONBURY 2025".
    pub festival_name: String,
    pub day_order: DayOrder,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            festival_name: DEFAULT_FESTIVAL_NAME.to_string(),
            day_order: DayOrder::parse(DEFAULT_FESTIVAL_DAYS),
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            festival_name: lookup("FESTIVAL_NAME")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.festival_name),
            day_order: lookup("FESTIVAL_DAYS")
                .map(|v| DayOrder::parse(&v))
                .filter(|order| !order.is_empty())
                .unwrap_or(defaults.day_order),
        }
    }
}
