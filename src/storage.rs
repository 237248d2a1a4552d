use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::backend::FilterCriteria;
use crate::login::DEFAULT_AUTH_TIMEOUT;
use crate::search::{DEFAULT_DEBOUNCE, DEFAULT_MIN_QUERY_LEN};

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("setlister")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn ui_state_path() -> PathBuf {
    config_dir().join("ui_state.json")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub setlist_pages: u32,
    pub auth_timeout_secs: u64,
    pub default_year_to_current: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            setlist_pages: 10,
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT.as_secs(),
            default_year_to_current: true,
        }
    }
}

impl Settings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed settings");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UiState {
    pub search_query: Option<String>,
    pub filters: Option<FilterCriteria>,
    pub public: Option<bool>,
}

pub fn save_ui_state_to(path: &Path, state: &UiState) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_json::to_string(state)?)?;
    Ok(())
}

pub fn load_ui_state_from(path: &Path) -> UiState {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
