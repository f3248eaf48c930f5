use super::StorageResult;
use crate::error::StorageError;
use crate::types::{sort_by_order, Episode, EpisodeId, Novel, NovelId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// In-memory library shared by the stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryIndex {
    last_novel_id: u64,
    last_episode_id: u64,
    novels: Vec<Novel>,
    episodes: Vec<Episode>,
}

impl LibraryIndex {
    pub fn save_novel(&mut self, novel: &Novel) -> StorageResult<NovelId> {
        match novel.id {
            Some(id) => {
                let slot = self
                    .novels
                    .iter_mut()
                    .find(|n| n.id == Some(id))
                    .ok_or_else(|| StorageError::NotFound(format!("novel {}", id)))?;
                *slot = novel.clone();
                Ok(id)
            }
            None => {
                self.last_novel_id += 1;
                let id = NovelId(self.last_novel_id);
                let mut novel = novel.clone();
                novel.id = Some(id);
                self.novels.push(novel);
                Ok(id)
            }
        }
    }

    pub fn save_episode(&mut self, episode: &Episode) -> StorageResult<EpisodeId> {
        if !self.novels.iter().any(|n| n.id == Some(episode.novel_id)) {
            return Err(StorageError::NotFound(format!("novel {}", episode.novel_id)));
        }
        let taken = self.episodes.iter().any(|e| {
            e.novel_id == episode.novel_id && e.order == episode.order && e.id != episode.id
        });
        if taken {
            return Err(StorageError::Conflict(format!(
                "novel {} already has an episode with order {}",
                episode.novel_id, episode.order
            )));
        }

        match episode.id {
            Some(id) => {
                let slot = self
                    .episodes
                    .iter_mut()
                    .find(|e| e.id == Some(id))
                    .ok_or_else(|| StorageError::NotFound(format!("episode {}", id)))?;
                *slot = episode.clone();
                Ok(id)
            }
            None => {
                self.last_episode_id += 1;
                let id = EpisodeId(self.last_episode_id);
                let mut episode = episode.clone();
                episode.id = Some(id);
                self.episodes.push(episode);
                Ok(id)
            }
        }
    }

    pub fn get_novel(&self, id: NovelId) -> StorageResult<Novel> {
        self.novels
            .iter()
            .find(|n| n.id == Some(id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("novel {}", id)))
    }

    pub fn list_novels(&self) -> Vec<Novel> {
        let mut novels = self.novels.clone();
        novels.sort_by_key(|n| n.id);
        novels
    }

    pub fn get_episode(&self, id: EpisodeId) -> StorageResult<Episode> {
        self.episodes
            .iter()
            .find(|e| e.id == Some(id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("episode {}", id)))
    }

    pub fn list_episodes(&self, novel_id: NovelId) -> Vec<Episode> {
        let mut episodes: Vec<Episode> = self
            .episodes
            .iter()
            .filter(|e| e.novel_id == novel_id)
            .cloned()
            .collect();
        sort_by_order(&mut episodes);
        episodes
    }

    pub fn delete_episode(&mut self, id: EpisodeId) -> StorageResult<()> {
        let before = self.episodes.len();
        self.episodes.retain(|e| e.id != Some(id));
        if self.episodes.len() == before {
            return Err(StorageError::NotFound(format!("episode {}", id)));
        }
        Ok(())
    }

    pub fn delete_novel(&mut self, id: NovelId) -> StorageResult<()> {
        let before = self.novels.len();
        self.novels.retain(|n| n.id != Some(id));
        if self.novels.len() == before {
            return Err(StorageError::NotFound(format!("novel {}", id)));
        }
        self.episodes.retain(|e| e.novel_id != id);
        Ok(())
    }

    /// Load from a JSON file; a missing file is an empty library
    pub async fn load(path: &Path) -> StorageResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                StorageError::BackendError(format!("{}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(backend(path, e)),
        }
    }

    /// Save to a JSON file atomically through a temp file and rename
    pub async fn save(&self, path: &Path) -> StorageResult<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| backend(parent, e))?;
        }
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, data)
            .await
            .map_err(|e| backend(&temp_path, e))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| backend(path, e))
    }
}

fn backend(path: &Path, error: std::io::Error) -> StorageError {
    StorageError::BackendError(format!("{}: {}", path.display(), error))
}
