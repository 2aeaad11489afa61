mod attach;
mod library;

pub use attach::{
    attach_uploaded_audio, data_url, AttachedAudio, AttachedVia, Blob, BlobRegistry,
    UploadedAudio, BLOB_URL_PREFIX,
};
pub use library::{
    content_type_for, is_audio_file_name, sanitize_filename, upload_file_name, MediaError,
    MediaItem, MediaLibrary, AUDIO_EXTENSIONS,
};
