//! Storage of novels and episodes
//!
//! The codec talks to storage only through [`NovelStore`]. Two stores are
//! provided: [`MemoryStore`] for tests and embedding, and [`JsonFileStore`]
//! which keeps a library in a single JSON file.

mod index;
mod json_file;
mod memory;

pub use index::LibraryIndex;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use crate::types::{Episode, EpisodeId, Novel, NovelId};
use async_trait::async_trait;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence collaborator for novels and their episodes
#[async_trait]
pub trait NovelStore: Send + Sync {
    /// Insert a novel without an id, or replace the stored one
    async fn save_novel(&self, novel: &Novel) -> StorageResult<NovelId>;

    /// Insert an episode without an id, or replace the stored one.
    ///
    /// Fails with [`StorageError::NotFound`] when the novel does not exist and
    /// with [`StorageError::Conflict`] when another episode of the novel
    /// already has the same `order`.
    async fn save_episode(&self, episode: &Episode) -> StorageResult<EpisodeId>;

    async fn get_novel(&self, id: NovelId) -> StorageResult<Novel>;

    /// All novels by id
    async fn list_novels(&self) -> StorageResult<Vec<Novel>>;

    async fn get_episode(&self, id: EpisodeId) -> StorageResult<Episode>;

    /// Episodes of a novel sorted by `order`
    async fn list_episodes(&self, novel_id: NovelId) -> StorageResult<Vec<Episode>>;

    /// Remove an episode; the remaining episodes keep their `order`
    async fn delete_episode(&self, id: EpisodeId) -> StorageResult<()>;

    /// Remove a novel and all of its episodes
    async fn delete_novel(&self, id: NovelId) -> StorageResult<()>;
}
