use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "RENTAL_SCOUT_API_URL";
pub const ENV_SESSION_FILE: &str = "RENTAL_SCOUT_SESSION_FILE";
pub const ENV_TIMEOUT_SECS: &str = "RENTAL_SCOUT_TIMEOUT_SECS";
pub const ENV_SHOW_IMAGES: &str = "RENTAL_SCOUT_SHOW_IMAGES";

/// Runtime settings for the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the marketplace API, including the `/api` prefix
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Where the session record is persisted
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Show image references on listing and reservation cards
    #[serde(default = "default_true")]
    pub show_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            session_file: default_session_file(),
            timeout_secs: default_timeout_secs(),
            show_images: true,
        }
    }
}

impl Config {
    /// Defaults overridden by `RENTAL_SCOUT_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Values that do not parse are skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            self.session_file = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!("Ignoring {}={:?}: expected a positive integer", ENV_TIMEOUT_SECS, raw),
            }
        }

        if let Some(raw) = lookup(ENV_SHOW_IMAGES) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.show_images = true,
                "0" | "false" | "no" | "off" => self.show_images = false,
                _ => warn!("Ignoring {}={:?}: expected a boolean", ENV_SHOW_IMAGES, raw),
            }
        }

        self
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// `~/.config/rental-scout/session.json` or the platform equivalent
fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rental-scout")
        .join("session.json")
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}
