use super::defaults::default_board;
use super::labels::label_from_filename;
use super::models::{local_id, Section, SectionColor, Sound, SoundMeta};
use crate::media::MediaLibrary;
use crate::remote_store::{
    NewSectionRow, NewSoundRow, RemoteStore, SectionPatch, SectionRow, SoundPatch, SoundRow,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub const NEW_SOUND_LABEL: &str = "New Sound";
pub const NEW_SECTION_TITLE: &str = "New Section";
/// Sorts new sounds after everything created with a real position.
pub const NEW_SOUND_POSITION: i64 = 9999;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Section {0} not found")]
    SectionNotFound(String),

    #[error("Sound {0} not found")]
    SoundNotFound(String),
}

/// Which path `load_board` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOutcome {
    /// The store already held a board.
    Remote,
    /// The store was empty and got the built-in board.
    Seeded,
    /// The store had sections but no sounds; the media library filled the
    /// first section.
    Populated,
    /// The store was unusable; the built-in board is shown, unsaved.
    Fallback,
}

/// The canonical in-memory board, kept in sync with a [`RemoteStore`].
///
/// Every mutation is applied locally first. The remote write is then spawned
/// in the background; when it fails the local change stays and the failure
/// is only logged.
pub struct BoardState {
    sections: RwLock<Arc<Vec<Section>>>,
    store: Arc<dyn RemoteStore>,
    media: MediaLibrary,
    writes: TaskTracker,
}

impl BoardState {
    pub fn new(store: Arc<dyn RemoteStore>, media: MediaLibrary) -> Self {
        Self {
            sections: RwLock::new(Arc::new(vec![])),
            store,
            media,
            writes: TaskTracker::new(),
        }
    }

    /// Immutable snapshot of the current board.
    pub fn sections(&self) -> Arc<Vec<Section>> {
        self.sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn load_board(&self) -> LoadOutcome {
        let (sections, outcome) = match self.fetch_or_initialize().await {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!("Board store unavailable, showing built-in board: {:#}", err);
                (default_board(), LoadOutcome::Fallback)
            }
        };
        info!(
            "Board loaded ({:?}): {} sections, {} sounds",
            outcome,
            sections.len(),
            sections.iter().map(|s| s.sounds.len()).sum::<usize>()
        );
        self.replace(sections);
        outcome
    }

    async fn fetch_or_initialize(&self) -> Result<(Vec<Section>, LoadOutcome)> {
        let section_rows = self
            .store
            .select_sections()
            .await
            .context("Failed to select sections")?;

        if section_rows.is_empty() {
            info!("Board store is empty, seeding built-in board");
            self.seed_defaults().await.context("Failed to seed board")?;
            return Ok((self.fetch().await?, LoadOutcome::Seeded));
        }

        let sound_rows = self
            .store
            .select_sounds()
            .await
            .context("Failed to select sounds")?;

        if sound_rows.is_empty() {
            match self.populate_from_media(&section_rows[0]).await {
                Ok(0) => {}
                Ok(added) => {
                    info!("Populated board with {} sounds from the media library", added);
                    // Only the first section received sounds.
                    let sound_rows = self
                        .store
                        .select_section_sounds(&section_rows[0].id)
                        .await
                        .context("Failed to select populated sounds")?;
                    return Ok((compose(section_rows, sound_rows), LoadOutcome::Populated));
                }
                Err(err) => warn!("Failed to populate board from media: {:#}", err),
            }
        }

        Ok((compose(section_rows, sound_rows), LoadOutcome::Remote))
    }

    async fn fetch(&self) -> Result<Vec<Section>> {
        let section_rows = self.store.select_sections().await?;
        let sound_rows = self.store.select_sounds().await?;
        Ok(compose(section_rows, sound_rows))
    }

    /// Inserts the built-in board. Sections go in one at a time so their
    /// creation times follow board order.
    async fn seed_defaults(&self) -> Result<()> {
        let mut sounds = Vec::new();
        for section in default_board() {
            let row = self
                .store
                .insert_sections(vec![NewSectionRow {
                    title: section.title.clone(),
                    color: section.color,
                }])
                .await?
                .pop()
                .with_context(|| format!("No row returned for section {}", section.title))?;

            sounds.extend(
                section
                    .sounds
                    .into_iter()
                    .enumerate()
                    .map(|(position, sound)| NewSoundRow {
                        section_id: row.id.clone(),
                        label: sound.label,
                        audio_url: sound.audio_url,
                        meta: sound.meta,
                        position: position as i64,
                    }),
            );
        }
        self.store.insert_sounds(sounds).await?;
        Ok(())
    }

    async fn populate_from_media(&self, first_section: &SectionRow) -> Result<usize> {
        let items = self.media.list().await?;
        if items.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewSoundRow> = items
            .iter()
            .enumerate()
            .map(|(position, item)| NewSoundRow {
                section_id: first_section.id.clone(),
                label: label_from_filename(&item.name),
                audio_url: Some(item.url.clone()),
                meta: None,
                position: position as i64,
            })
            .collect();
        Ok(self.store.insert_sounds(rows).await?.len())
    }

    fn replace(&self, sections: Vec<Section>) {
        *self.sections.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(sections);
    }

    /// Applies `change` to a copy of the board and swaps it in.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Section>) -> Result<T, BoardError>,
    ) -> Result<T, BoardError> {
        let mut guard = self.sections.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.as_ref().clone();
        let result = change(&mut next)?;
        *guard = Arc::new(next);
        Ok(result)
    }

    fn mutate_sound<T>(
        &self,
        section_id: &str,
        sound_id: &str,
        change: impl FnOnce(&mut Sound) -> T,
    ) -> Result<T, BoardError> {
        self.mutate(|sections| {
            let sound = find_section_mut(sections, section_id)?
                .sounds
                .iter_mut()
                .find(|s| s.id == sound_id)
                .ok_or_else(|| BoardError::SoundNotFound(sound_id.to_string()))?;
            Ok(change(sound))
        })
    }

    fn spawn_write<F>(&self, what: String, write: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.writes.spawn(async move {
            match write.await {
                Ok(()) => debug!("Remote write done: {}", what),
                Err(err) => warn!("Remote write failed ({}), keeping local change: {:#}", what, err),
            }
        });
    }

    pub fn set_section_title(&self, section_id: &str, title: &str) -> Result<(), BoardError> {
        self.mutate(|sections| {
            find_section_mut(sections, section_id)?.title = title.to_string();
            Ok(())
        })?;

        let store = self.store.clone();
        let id = section_id.to_string();
        let patch = SectionPatch {
            title: Some(title.to_string()),
        };
        self.spawn_write(format!("title of section {}", id), async move {
            store.update_section(&id, patch).await
        });
        Ok(())
    }

    pub fn set_sound_label(
        &self,
        section_id: &str,
        sound_id: &str,
        label: &str,
    ) -> Result<(), BoardError> {
        self.mutate_sound(section_id, sound_id, |sound| sound.label = label.to_string())?;
        self.write_sound_patch(
            sound_id,
            SoundPatch {
                label: Some(label.to_string()),
                ..Default::default()
            },
        );
        Ok(())
    }

    pub fn set_sound_audio(
        &self,
        section_id: &str,
        sound_id: &str,
        url: &str,
    ) -> Result<(), BoardError> {
        self.mutate_sound(section_id, sound_id, |sound| {
            sound.audio_url = Some(url.to_string())
        })?;
        self.write_sound_patch(
            sound_id,
            SoundPatch {
                audio_url: Some(url.to_string()),
                ..Default::default()
            },
        );
        Ok(())
    }

    /// Shallow-merges `patch` into the sound's meta and returns the result.
    pub fn set_sound_meta(
        &self,
        section_id: &str,
        sound_id: &str,
        patch: SoundMeta,
    ) -> Result<SoundMeta, BoardError> {
        let merged = self.mutate_sound(section_id, sound_id, |sound| {
            let meta = sound.meta.get_or_insert_with(SoundMeta::default);
            meta.merge(patch);
            meta.clone()
        })?;
        self.write_sound_patch(
            sound_id,
            SoundPatch {
                meta: Some(merged.clone()),
                ..Default::default()
            },
        );
        Ok(merged)
    }

    fn write_sound_patch(&self, sound_id: &str, patch: SoundPatch) {
        let store = self.store.clone();
        let id = sound_id.to_string();
        self.spawn_write(format!("sound {}", id), async move {
            store.update_sound(&id, patch).await
        });
    }

    pub async fn add_sound(&self, section_id: &str) -> Result<Sound, BoardError> {
        if !self.sections().iter().any(|s| s.id == section_id) {
            return Err(BoardError::SectionNotFound(section_id.to_string()));
        }

        let row = NewSoundRow {
            section_id: section_id.to_string(),
            label: NEW_SOUND_LABEL.to_string(),
            audio_url: None,
            meta: Some(SoundMeta {
                nsfw: Some(true),
                ..Default::default()
            }),
            position: NEW_SOUND_POSITION,
        };
        let sound = match self.store.insert_sounds(vec![row.clone()]).await {
            Ok(mut inserted) if !inserted.is_empty() => sound_from_row(inserted.remove(0)),
            Ok(_) => {
                warn!("Remote insert of sound returned no row, keeping it local");
                local_sound(row)
            }
            Err(err) => {
                warn!("Remote insert of sound failed, keeping it local: {:#}", err);
                local_sound(row)
            }
        };

        self.mutate(|sections| {
            find_section_mut(sections, section_id)?
                .sounds
                .push(sound.clone());
            Ok(())
        })?;
        Ok(sound)
    }

    pub async fn add_section(&self) -> Section {
        let color = SectionColor::pick_for_new_section(&self.sections());
        let row = NewSectionRow {
            title: NEW_SECTION_TITLE.to_string(),
            color,
        };

        let section = match self.store.insert_sections(vec![row]).await {
            Ok(mut inserted) if !inserted.is_empty() => {
                let row = inserted.remove(0);
                Section {
                    id: row.id,
                    title: row.title,
                    color: row.color,
                    sounds: vec![],
                }
            }
            result => {
                if let Err(err) = result {
                    warn!("Remote insert of section failed, keeping it local: {:#}", err);
                }
                Section {
                    id: local_id("section"),
                    title: NEW_SECTION_TITLE.to_string(),
                    color,
                    sounds: vec![],
                }
            }
        };

        Arc::make_mut(&mut self.sections.write().unwrap_or_else(PoisonError::into_inner))
            .push(section.clone());
        section
    }

    pub fn remove_section(&self, section_id: &str) -> Result<(), BoardError> {
        self.mutate(|sections| {
            let index = sections
                .iter()
                .position(|s| s.id == section_id)
                .ok_or_else(|| BoardError::SectionNotFound(section_id.to_string()))?;
            sections.remove(index);
            Ok(())
        })?;

        let store = self.store.clone();
        let id = section_id.to_string();
        self.spawn_write(format!("delete of section {}", id), async move {
            store.delete_section(&id).await
        });
        Ok(())
    }

    /// Waits until every background write issued so far has finished.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }
}

fn find_section_mut<'a>(
    sections: &'a mut [Section],
    section_id: &str,
) -> Result<&'a mut Section, BoardError> {
    sections
        .iter_mut()
        .find(|s| s.id == section_id)
        .ok_or_else(|| BoardError::SectionNotFound(section_id.to_string()))
}

fn sound_from_row(row: SoundRow) -> Sound {
    Sound {
        id: row.id,
        label: row.label,
        audio_url: row.audio_url,
        meta: row.meta,
    }
}

fn local_sound(row: NewSoundRow) -> Sound {
    Sound {
        id: local_id("sound"),
        label: row.label,
        audio_url: row.audio_url,
        meta: row.meta,
    }
}

/// Groups sounds under their sections by ascending position. Sounds whose
/// section is unknown are dropped.
fn compose(section_rows: Vec<SectionRow>, sound_rows: Vec<SoundRow>) -> Vec<Section> {
    let mut by_section: HashMap<String, Vec<SoundRow>> = HashMap::new();
    for row in sound_rows {
        by_section.entry(row.section_id.clone()).or_default().push(row);
    }

    let sections: Vec<Section> = section_rows
        .into_iter()
        .map(|row| {
            let mut sounds = by_section.remove(&row.id).unwrap_or_default();
            sounds.sort_by_key(|s| s.position);
            Section {
                id: row.id,
                title: row.title,
                color: row.color,
                sounds: sounds.into_iter().map(sound_from_row).collect(),
            }
        })
        .collect();

    if !by_section.is_empty() {
        debug!(
            "Dropped sounds of {} unknown sections",
            by_section.len()
        );
    }
    sections
}
