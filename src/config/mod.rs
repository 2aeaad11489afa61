mod file_config;

pub use file_config::{FileConfig, RemoteConfig};

use crate::panel::DEFAULT_HIDE_DELAY_MS;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_MAX_INLINE_AUDIO_BYTES: usize = 1024 * 1024;
pub const DEFAULT_SESSION_IDLE_TIMEOUT_MINS: u64 = 12 * 60;
pub const DEFAULT_REMOTE_TIMEOUT_SEC: u64 = 10;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
pub const DEFAULT_MAX_BLOB_STORE_BYTES: usize = 256 * 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub edit_password: Option<String>,
    pub hide_delay_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            media_path: None,
            port: 3001,
            logging_level: RequestsLoggingLevel::Path,
            frontend_dir_path: None,
            edit_password: None,
            hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub edit_password: Option<String>,
    pub hide_delay_ms: u64,
    pub show_url: Option<String>,
    pub max_upload_bytes: usize,
    pub max_inline_audio_bytes: usize,
    pub session_idle_timeout_mins: u64,
    pub remote: Option<RemoteSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("sounds"));

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let edit_password = file
            .edit_password
            .or_else(|| cli.edit_password.clone())
            .filter(|password| !password.is_empty());

        let hide_delay_ms = file.hide_delay_ms.unwrap_or(cli.hide_delay_ms);
        if hide_delay_ms == 0 {
            bail!("hide_delay_ms must be greater than zero");
        }

        let remote = match file.remote {
            Some(RemoteConfig { url: Some(url), api_key, timeout_sec }) => Some(RemoteSettings {
                url,
                api_key,
                timeout_sec: timeout_sec.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SEC),
            }),
            Some(RemoteConfig { url: None, .. }) => bail!("[remote] requires a url"),
            None => None,
        };

        Ok(Self {
            db_dir,
            media_path,
            port,
            logging_level,
            frontend_dir_path,
            edit_password,
            hide_delay_ms,
            show_url: file.show_url,
            max_upload_bytes: file.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            max_inline_audio_bytes: file
                .max_inline_audio_bytes
                .unwrap_or(DEFAULT_MAX_INLINE_AUDIO_BYTES),
            session_idle_timeout_mins: file
                .session_idle_timeout_mins
                .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_MINS),
            remote,
        })
    }

    pub fn board_db_path(&self) -> PathBuf {
        self.db_dir.join("board.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
