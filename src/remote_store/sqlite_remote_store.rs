use super::models::{NewSectionRow, NewSoundRow, SectionPatch, SectionRow, SoundPatch, SoundRow};
use super::schema::BOARD_VERSIONED_SCHEMAS;
use super::RemoteStore;
use crate::board::{SectionColor, SoundMeta};
use crate::sqlite_persistence::{read_schema_version, BASE_DB_VERSION};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, types::Value, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Board store backed by an embedded SQLite database.
pub struct SqliteRemoteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRemoteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open board database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let latest = BOARD_VERSIONED_SCHEMAS
            .last()
            .context("No board schema defined")?;

        if is_new_db {
            info!("Creating new board database at {:?}", path);
            latest.create(&conn)?;
        } else {
            let db_version = read_schema_version(&conn)?;
            if db_version < 1 {
                bail!(
                    "Board database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let version_index = BOARD_VERSIONED_SCHEMAS
                .iter()
                .position(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown board database version {}", db_version))?;
            BOARD_VERSIONED_SCHEMAS[version_index]
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "Board database schema validation failed for version {}",
                        db_version
                    )
                })?;

            if (db_version as usize) < latest.version {
                info!(
                    "Migrating board database from version {} to {}",
                    db_version, latest.version
                );
                Self::migrate_if_needed(&mut conn, db_version as usize)?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        BOARD_VERSIONED_SCHEMAS
            .last()
            .context("No board schema defined")?
            .create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut latest_from = from_version;
        for schema in BOARD_VERSIONED_SCHEMAS.iter() {
            if schema.version > from_version {
                if let Some(migration_fn) = schema.migration {
                    migration_fn(&tx).with_context(|| {
                        format!("Failed to run migration to version {}", schema.version)
                    })?;
                }
                latest_from = schema.version;
            }
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Board database lock poisoned"))
    }

    fn row_to_section(row: &rusqlite::Row) -> rusqlite::Result<SectionRow> {
        let color: String = row.get("color")?;
        Ok(SectionRow {
            id: row.get("id")?,
            title: row.get("title")?,
            color: SectionColor::parse(&color).unwrap_or(SectionColor::Cyan),
        })
    }

    fn row_to_sound(row: &rusqlite::Row) -> rusqlite::Result<SoundRow> {
        let id: String = row.get("id")?;
        let meta: Option<String> = row.get("meta")?;
        let meta = meta.and_then(|json| match serde_json::from_str::<SoundMeta>(&json) {
            Ok(meta) => Some(meta),
            Err(err) => {
                warn!("Ignoring malformed meta of sound {}: {}", id, err);
                None
            }
        });
        Ok(SoundRow {
            id,
            section_id: row.get("section_id")?,
            label: row.get("label")?,
            audio_url: row.get("audio_url")?,
            meta,
            position: row.get("position")?,
        })
    }

    fn meta_to_json(meta: &Option<SoundMeta>) -> Result<Option<String>> {
        meta.as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize sound meta")
    }

    fn select_sounds_where(&self, section_id: Option<&str>) -> Result<Vec<SoundRow>> {
        let conn = self.lock()?;
        let sql = match section_id {
            Some(_) => {
                "SELECT id, section_id, label, audio_url, meta, position FROM sounds
                 WHERE section_id = ?1 ORDER BY position, rowid"
            }
            None => {
                "SELECT id, section_id, label, audio_url, meta, position FROM sounds
                 ORDER BY position, rowid"
            }
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = match section_id {
            Some(section_id) => stmt
                .query_map(params![section_id], Self::row_to_sound)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], Self::row_to_sound)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }

    fn update_columns(&self, table: &str, id: &str, columns: Vec<(&str, Value)>) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            assignments,
            columns.len() + 1
        );

        let mut values: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Text(id.to_string()));

        let conn = self.lock()?;
        let updated = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if updated == 0 {
            bail!("No row with id {} in {}", id, table);
        }
        Ok(())
    }
}

fn optional_text(value: Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text),
        None => Value::Null,
    }
}

#[async_trait]
impl RemoteStore for SqliteRemoteStore {
    async fn select_sections(&self) -> Result<Vec<SectionRow>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, title, color FROM sections ORDER BY created_at, rowid")?;
        let rows = stmt
            .query_map([], Self::row_to_section)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn select_sounds(&self) -> Result<Vec<SoundRow>> {
        self.select_sounds_where(None)
    }

    async fn select_section_sounds(&self, section_id: &str) -> Result<Vec<SoundRow>> {
        self.select_sounds_where(Some(section_id))
    }

    async fn insert_sections(&self, rows: Vec<NewSectionRow>) -> Result<Vec<SectionRow>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let id = uuid::Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO sections (id, title, color) VALUES (?1, ?2, ?3)",
                params![id, row.title, row.color.as_str()],
            )?;
            inserted.push(SectionRow {
                id,
                title: row.title,
                color: row.color,
            });
        }
        tx.commit()?;
        Ok(inserted)
    }

    async fn insert_sounds(&self, rows: Vec<NewSoundRow>) -> Result<Vec<SoundRow>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let id = uuid::Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO sounds (id, section_id, label, audio_url, meta, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    row.section_id,
                    row.label,
                    row.audio_url,
                    Self::meta_to_json(&row.meta)?,
                    row.position
                ],
            )
            .with_context(|| format!("Failed to insert sound into section {}", row.section_id))?;
            inserted.push(SoundRow {
                id,
                section_id: row.section_id,
                label: row.label,
                audio_url: row.audio_url,
                meta: row.meta,
                position: row.position,
            });
        }
        tx.commit()?;
        Ok(inserted)
    }

    async fn update_section(&self, id: &str, patch: SectionPatch) -> Result<()> {
        let mut columns = vec![];
        if let Some(title) = patch.title {
            columns.push(("title", Value::Text(title)));
        }
        self.update_columns("sections", id, columns)
    }

    async fn update_sound(&self, id: &str, patch: SoundPatch) -> Result<()> {
        let mut columns = vec![];
        if let Some(label) = patch.label {
            columns.push(("label", Value::Text(label)));
        }
        if let Some(audio_url) = patch.audio_url {
            columns.push(("audio_url", Value::Text(audio_url)));
        }
        if patch.meta.is_some() {
            columns.push(("meta", optional_text(Self::meta_to_json(&patch.meta)?)));
        }
        self.update_columns("sounds", id, columns)
    }

    async fn delete_section(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM sections WHERE id = ?1", params![id])?;
        if deleted == 0 {
            bail!("No section with id {}", id);
        }
        Ok(())
    }
}
