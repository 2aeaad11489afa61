use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub media_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub edit_password: Option<String>,
    pub hide_delay_ms: Option<u64>,

    // File-only settings
    pub show_url: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub max_inline_audio_bytes: Option<usize>,
    pub session_idle_timeout_mins: Option<u64>,

    pub remote: Option<RemoteConfig>,
}

/// Optional PostgREST backend. Without it the board lives in SQLite.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
