//! SQLite schema of the embedded board store.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP_MS,
};

// =============================================================================
// Version 1 - Sections and sounds
// =============================================================================

const SECTIONS_TABLE_V1: Table = Table {
    name: "sections",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("color", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP_MS)
        ),
    ],
    indices: &[("idx_sections_created_at", "created_at")],
};

const SOUND_SECTION_FK: ForeignKey = ForeignKey {
    foreign_table: "sections",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SOUNDS_TABLE_V1: Table = Table {
    name: "sounds",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "section_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&SOUND_SECTION_FK)
        ),
        sqlite_column!("label", &SqlType::Text, non_null = true),
        sqlite_column!("audio_url", &SqlType::Text),
        sqlite_column!("meta", &SqlType::Text),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP_MS)
        ),
    ],
    indices: &[
        ("idx_sounds_section", "section_id"),
        ("idx_sounds_position", "position"),
    ],
};

pub const BOARD_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[SECTIONS_TABLE_V1, SOUNDS_TABLE_V1],
    migration: None,
}];
