//! Test fixture creation
//!
//! Creates the temporary directories backing a test server.

use super::constants::*;
use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a media directory holding the fixture audio files and one
/// non-audio file.
pub fn create_test_media() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let media_path = dir.path().join("sounds");
    std::fs::create_dir_all(&media_path)?;

    for name in FIXTURE_AUDIO_FILES {
        std::fs::write(media_path.join(name), FIXTURE_AUDIO_BYTES)?;
    }
    std::fs::write(media_path.join(FIXTURE_OTHER_FILE), b"not audio")?;

    Ok((dir, media_path))
}

/// Creates an empty directory for board.db.
pub fn create_test_db_dir() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("board.db");
    Ok((dir, db_path))
}
