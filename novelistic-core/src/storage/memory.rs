use super::{LibraryIndex, NovelStore, StorageResult};
use crate::types::{Episode, EpisodeId, Novel, NovelId};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    library: RwLock<LibraryIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NovelStore for MemoryStore {
    async fn save_novel(&self, novel: &Novel) -> StorageResult<NovelId> {
        self.library.write().await.save_novel(novel)
    }

    async fn save_episode(&self, episode: &Episode) -> StorageResult<EpisodeId> {
        self.library.write().await.save_episode(episode)
    }

    async fn get_novel(&self, id: NovelId) -> StorageResult<Novel> {
        self.library.read().await.get_novel(id)
    }

    async fn list_novels(&self) -> StorageResult<Vec<Novel>> {
        Ok(self.library.read().await.list_novels())
    }

    async fn get_episode(&self, id: EpisodeId) -> StorageResult<Episode> {
        self.library.read().await.get_episode(id)
    }

    async fn list_episodes(&self, novel_id: NovelId) -> StorageResult<Vec<Episode>> {
        Ok(self.library.read().await.list_episodes(novel_id))
    }

    async fn delete_episode(&self, id: EpisodeId) -> StorageResult<()> {
        self.library.write().await.delete_episode(id)
    }

    async fn delete_novel(&self, id: NovelId) -> StorageResult<()> {
        self.library.write().await.delete_novel(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        let novel_id = store.save_novel(&Novel::new("Stored")).await.unwrap();
        store
            .save_episode(&Episode::new(novel_id, "Second", "<p>2</p>", 1))
            .await
            .unwrap();
        store
            .save_episode(&Episode::new(novel_id, "First", "<p>1</p>", 0))
            .await
            .unwrap();

        let titles: Vec<_> = store
            .list_episodes(novel_id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(store.get_novel(novel_id).await.unwrap().id, Some(novel_id));
    }
}
