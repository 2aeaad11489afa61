use crate::board::{SectionColor, SoundMeta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub id: String,
    pub title: String,
    pub color: SectionColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundRow {
    pub id: String,
    pub section_id: String,
    pub label: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub meta: Option<SoundMeta>,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSectionRow {
    pub title: String,
    pub color: SectionColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSoundRow {
    pub section_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SoundMeta>,
    pub position: i64,
}

/// Column update for a single section. Only `Some` columns are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Column update for a single sound. Only `Some` columns are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoundPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SoundMeta>,
}
