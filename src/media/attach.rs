//! Turning an uploaded audio file into a URL a sound can point at.
//!
//! Sources are tried in order: the media library, an inline `data:` URL for
//! small files, then an in-memory blob that lives until restart.

use super::library::{content_type_for, MediaLibrary};
use base64::Engine;
use serde::Serialize;
use crate::config::DEFAULT_MAX_BLOB_STORE_BYTES;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub const BLOB_URL_PREFIX: &str = "/blobs/";

#[derive(Debug, Clone)]
pub struct UploadedAudio {
    pub file_name: Option<String>,
    pub label: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedAudio {
    fn effective_content_type(&self) -> String {
        match &self.content_type {
            Some(content_type) if content_type.starts_with("audio/") => content_type.clone(),
            _ => content_type_for(self.file_name.as_deref().unwrap_or_default()).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachedVia {
    Library,
    Inline,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedAudio {
    pub url: String,
    pub via: AttachedVia,
}

#[derive(Debug, Clone)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct BlobStore {
    blobs: HashMap<String, Blob>,
    order: VecDeque<String>,
    total_bytes: usize,
}

/// In-memory audio blobs addressed by `/blobs/<id>`.
///
/// Holds at most `max_bytes` of audio. Registering past that evicts the
/// oldest blobs first; a single blob larger than the budget is kept alone.
pub struct BlobRegistry {
    max_bytes: usize,
    store: Mutex<BlobStore>,
}

impl Default for BlobRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLOB_STORE_BYTES)
    }
}

impl BlobRegistry {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            store: Mutex::new(BlobStore::default()),
        }
    }

    fn store(&self) -> MutexGuard<'_, BlobStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, blob: Blob) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let size = blob.bytes.len();
        let mut store = self.store();

        while store.total_bytes + size > self.max_bytes {
            let Some(oldest) = store.order.pop_front() else {
                break;
            };
            if let Some(evicted) = store.blobs.remove(&oldest) {
                store.total_bytes -= evicted.bytes.len();
                debug!("Evicted blob {} ({} bytes)", oldest, evicted.bytes.len());
            }
        }

        store.total_bytes += size;
        store.order.push_back(id.clone());
        store.blobs.insert(id.clone(), blob);
        id
    }

    pub fn get(&self, id: &str) -> Option<Blob> {
        self.store().blobs.get(id).cloned()
    }

    pub fn total_bytes(&self) -> usize {
        self.store().total_bytes
    }

    pub fn len(&self) -> usize {
        self.store().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

pub async fn attach_uploaded_audio(
    library: &MediaLibrary,
    blobs: &BlobRegistry,
    upload: UploadedAudio,
    max_inline_bytes: usize,
) -> AttachedAudio {
    match library
        .save_upload(
            upload.file_name.as_deref(),
            upload.label.as_deref(),
            &upload.bytes,
        )
        .await
    {
        Ok(item) => {
            return AttachedAudio {
                url: item.url,
                via: AttachedVia::Library,
            }
        }
        Err(err) => warn!("Upload to media library failed, falling back: {:?}", err),
    }

    let content_type = upload.effective_content_type();
    if upload.bytes.len() <= max_inline_bytes {
        return AttachedAudio {
            url: data_url(&content_type, &upload.bytes),
            via: AttachedVia::Inline,
        };
    }

    let size = upload.bytes.len();
    let id = blobs.register(Blob {
        content_type,
        bytes: upload.bytes,
    });
    info!("Registered ephemeral blob {} ({} bytes)", id, size);
    AttachedAudio {
        url: format!("{}{}", BLOB_URL_PREFIX, id),
        via: AttachedVia::Blob,
    }
}
