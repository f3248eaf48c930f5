//! Episode type representing a single chapter of a novel

use super::NovelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage identity of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub u64);

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writing notes attached to an episode
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EpisodeNotes {
    pub characters: Vec<String>,
    pub settings: Vec<String>,
    pub plot_points: Vec<String>,
    pub style: String,
}

/// A single episode (chapter) of a novel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EpisodeId>,

    /// Owning novel
    pub novel_id: NovelId,

    pub title: String,

    /// HTML rich text; images are embedded as data URIs
    pub content: String,

    /// Reading rank within the novel, unique per novel
    pub order: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub notes: EpisodeNotes,
}

impl Episode {
    /// Create an unsaved episode
    pub fn new(
        novel_id: NovelId,
        title: impl Into<String>,
        content: impl Into<String>,
        order: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            novel_id,
            title: title.into(),
            content: content.into(),
            order,
            created_at: now,
            updated_at: now,
            notes: EpisodeNotes::default(),
        }
    }

    /// Title to display, falling back to "Chapter N" for a 1-based position
    pub fn display_title(&self, position: usize) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            format!("Chapter {}", position)
        } else {
            title.to_string()
        }
    }
}

/// Sort episodes into reading order
pub fn sort_by_order(episodes: &mut [Episode]) {
    episodes.sort_by_key(|e| e.order);
}
