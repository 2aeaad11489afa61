//! Persistence of the board: generic CRUD over the `sections` and `sounds`
//! tables, with an embedded SQLite adapter and a PostgREST HTTP adapter.

mod models;
mod rest_remote_store;
mod schema;
mod sqlite_remote_store;

pub use models::*;
pub use rest_remote_store::RestRemoteStore;
pub use schema::BOARD_VERSIONED_SCHEMAS;
pub use sqlite_remote_store::SqliteRemoteStore;

use anyhow::Result;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All sections, oldest first.
    async fn select_sections(&self) -> Result<Vec<SectionRow>>;

    /// All sounds, ascending `position`, ties in insertion order.
    async fn select_sounds(&self) -> Result<Vec<SoundRow>>;

    async fn select_section_sounds(&self, section_id: &str) -> Result<Vec<SoundRow>>;

    /// Inserts the rows and returns them with their store-assigned ids, in
    /// the same order.
    async fn insert_sections(&self, rows: Vec<NewSectionRow>) -> Result<Vec<SectionRow>>;
    async fn insert_sounds(&self, rows: Vec<NewSoundRow>) -> Result<Vec<SoundRow>>;

    async fn update_section(&self, id: &str, patch: SectionPatch) -> Result<()>;
    async fn update_sound(&self, id: &str, patch: SoundPatch) -> Result<()>;

    /// Removes the section; its sounds go with it.
    async fn delete_section(&self, id: &str) -> Result<()>;
}
