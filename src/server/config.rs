use super::{RequestsLoggingLevel, EDIT_TOGGLE_PER_MINUTE};
use crate::config::{
    DEFAULT_MAX_BLOB_STORE_BYTES, DEFAULT_MAX_INLINE_AUDIO_BYTES, DEFAULT_MAX_SESSIONS,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SESSION_IDLE_TIMEOUT_MINS,
};
use crate::panel::PanelConfig;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    /// Request body limit, applied to uploads.
    pub max_upload_bytes: usize,
    /// Largest upload that may fall back to an inline `data:` URL.
    pub max_inline_audio_bytes: usize,
    /// Memory budget for uploads kept as `/blobs/` entries.
    pub max_blob_store_bytes: usize,
    pub session_idle_timeout: Duration,
    /// Sessions kept at most; the least recently seen one is evicted first.
    pub max_sessions: usize,
    pub edit_attempts_per_minute: u32,
    pub panel: PanelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            frontend_dir_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_inline_audio_bytes: DEFAULT_MAX_INLINE_AUDIO_BYTES,
            max_blob_store_bytes: DEFAULT_MAX_BLOB_STORE_BYTES,
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_TIMEOUT_MINS * 60),
            max_sessions: DEFAULT_MAX_SESSIONS,
            edit_attempts_per_minute: EDIT_TOGGLE_PER_MINUTE,
            panel: PanelConfig::default(),
        }
    }
}
