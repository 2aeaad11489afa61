use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a"];

const DEFAULT_EXTENSION: &str = ".mp3";
const DEFAULT_BASE_NAME: &str = "sound";

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^a-z0-9._-]+").unwrap();
    static ref DASH_RUNS: Regex = Regex::new(r"-+").unwrap();
    static ref TRAILING_EXTENSION: Regex = Regex::new(r"\.[^./]+$").unwrap();
    static ref UPLOAD_EXTENSION: Regex = Regex::new(r"(?i)\.[a-z0-9]+$").unwrap();
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Path traversal is not allowed")]
    Forbidden,

    #[error("Media file not found")]
    NotFound,

    #[error("Failed to save file")]
    SaveFailed(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub name: String,
    pub url: String,
}

impl MediaItem {
    fn for_file_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: format!("/sounds/{}", urlencoding::encode(name)),
        }
    }
}

/// Lowercases and replaces anything outside `[a-z0-9._-]` with dashes,
/// collapsing and trimming dash runs. May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = UNSAFE_CHARS.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with(".mp3") {
        "audio/mpeg"
    } else if lower.ends_with(".wav") {
        "audio/wav"
    } else if lower.ends_with(".ogg") {
        "audio/ogg"
    } else if lower.ends_with(".m4a") {
        "audio/mp4"
    } else {
        "application/octet-stream"
    }
}

pub fn is_audio_file_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Picks the stored name of an upload: `<base>-<8 hex chars><ext>`.
///
/// The base comes from the label when given, else from the original file
/// name, with any extension stripped. The extension always comes from the
/// original file name.
pub fn upload_file_name(original_name: Option<&str>, label: Option<&str>) -> String {
    let original_name = original_name
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_BASE_NAME);
    let source = label.filter(|label| !label.is_empty()).unwrap_or(original_name);

    let mut base = sanitize_filename(&TRAILING_EXTENSION.replace(source, ""));
    if base.is_empty() {
        base = DEFAULT_BASE_NAME.to_string();
    }

    let ext = UPLOAD_EXTENSION
        .find(original_name)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let unique: u32 = rand::rng().random();
    format!("{}-{:08x}{}", base, unique, ext)
}

/// Directory of audio files that can be listed, uploaded to and served.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Audio files directly under the library root, sorted by name.
    pub async fn list(&self) -> anyhow::Result<Vec<MediaItem>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut names = vec![];
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_audio_file_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.iter().map(|name| MediaItem::for_file_name(name)).collect())
    }

    /// Listing that degrades to an empty list, as served to clients.
    pub async fn list_or_empty(&self) -> Vec<MediaItem> {
        match self.list().await {
            Ok(items) => items,
            Err(err) => {
                warn!("Failed to list media in {:?}: {}", self.root, err);
                vec![]
            }
        }
    }

    pub async fn save_upload(
        &self,
        original_name: Option<&str>,
        label: Option<&str>,
        bytes: &[u8],
    ) -> Result<MediaItem, MediaError> {
        let file_name = upload_file_name(original_name, label);
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(MediaError::SaveFailed)?;
        tokio::fs::write(self.root.join(&file_name), bytes)
            .await
            .map_err(MediaError::SaveFailed)?;
        debug!("Saved upload {} ({} bytes)", file_name, bytes.len());
        Ok(MediaItem::for_file_name(&file_name))
    }

    /// Reads a file below the root, returning its bytes and content type.
    pub async fn read(&self, relative_path: &str) -> Result<(Vec<u8>, &'static str), MediaError> {
        if relative_path.contains("..") {
            return Err(MediaError::Forbidden);
        }
        let relative_path = relative_path.trim_start_matches('/');
        if relative_path.is_empty() {
            return Err(MediaError::NotFound);
        }

        let bytes = tokio::fs::read(self.root.join(relative_path))
            .await
            .map_err(|err| {
                debug!("Could not read media {}: {}", relative_path, err);
                MediaError::NotFound
            })?;
        Ok((bytes, content_type_for(relative_path)))
    }
}
