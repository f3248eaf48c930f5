use super::{LibraryIndex, NovelStore, StorageResult};
use crate::types::{Episode, EpisodeId, Novel, NovelId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{OnceCell, RwLock};

/// Name of the library file inside the data directory
pub const LIBRARY_FILE: &str = "library.json";

/// Store keeping the whole library in `<dir>/library.json`.
///
/// The file is read on first use; concurrent first callers share the same
/// load. Every mutation is written back before it becomes visible.
pub struct JsonFileStore {
    path: PathBuf,
    library: OnceCell<RwLock<LibraryIndex>>,
}

impl JsonFileStore {
    /// Store rooted at `dir`; nothing is read until the first operation
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LIBRARY_FILE),
            library: OnceCell::new(),
        }
    }

    /// Path of the library file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn library(&self) -> StorageResult<&RwLock<LibraryIndex>> {
        self.library
            .get_or_try_init(|| async {
                tracing::debug!("Loading library from {}", self.path.display());
                LibraryIndex::load(&self.path).await.map(RwLock::new)
            })
            .await
    }

    /// Apply `change` to a copy of the library, persist it, then publish it
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut LibraryIndex) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut library = self.library().await?.write().await;
        let mut next = library.clone();
        let value = change(&mut next)?;
        next.save(&self.path).await?;
        *library = next;
        Ok(value)
    }
}

#[async_trait]
impl NovelStore for JsonFileStore {
    async fn save_novel(&self, novel: &Novel) -> StorageResult<NovelId> {
        self.mutate(|library| library.save_novel(novel)).await
    }

    async fn save_episode(&self, episode: &Episode) -> StorageResult<EpisodeId> {
        self.mutate(|library| library.save_episode(episode)).await
    }

    async fn get_novel(&self, id: NovelId) -> StorageResult<Novel> {
        self.library().await?.read().await.get_novel(id)
    }

    async fn list_novels(&self) -> StorageResult<Vec<Novel>> {
        Ok(self.library().await?.read().await.list_novels())
    }

    async fn get_episode(&self, id: EpisodeId) -> StorageResult<Episode> {
        self.library().await?.read().await.get_episode(id)
    }

    async fn list_episodes(&self, novel_id: NovelId) -> StorageResult<Vec<Episode>> {
        Ok(self.library().await?.read().await.list_episodes(novel_id))
    }

    async fn delete_episode(&self, id: EpisodeId) -> StorageResult<()> {
        self.mutate(|library| library.delete_episode(id)).await
    }

    async fn delete_novel(&self, id: NovelId) -> StorageResult<()> {
        self.mutate(|library| library.delete_novel(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let store = JsonFileStore::new(dir.path());
        let id = store.save_novel(&Novel::new("Kept")).await.unwrap();
        store
            .save_episode(&Episode::new(id, "One", "<p>1</p>", 0))
            .await
            .unwrap();
        assert!(store.path().exists());

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get_novel(id).await.unwrap().title, "Kept");
        assert_eq!(reopened.list_episodes(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_mutation_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let id = store.save_novel(&Novel::new("N")).await.unwrap();
        store.save_episode(&Episode::new(id, "a", "", 0)).await.unwrap();

        let clash = store.save_episode(&Episode::new(id, "b", "", 0)).await;
        assert!(matches!(clash, Err(StorageError::Conflict(_))));

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.list_episodes(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LIBRARY_FILE), "{ not json").unwrap();

        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.list_novels().await,
            Err(StorageError::BackendError(_))
        ));
    }
}
