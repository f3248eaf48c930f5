//! The Novel record - the root of a serialized story

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage identity of a novel, assigned by the store on first save
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NovelId(pub u64);

impl fmt::Display for NovelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NovelId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(NovelId)
    }
}

/// Free-form planning notes attached to a novel
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NovelNotes {
    pub characters: Vec<String>,
    pub settings: Vec<String>,
    pub plot_points: Vec<String>,
}

/// A novel made of ordered episodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    /// Unset until the store saves the novel for the first time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NovelId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    pub title: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub notes: NovelNotes,
}

impl Novel {
    /// Create an unsaved novel with the given title
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            author: None,
            title: title.into(),
            created_at: now,
            updated_at: now,
            notes: NovelNotes::default(),
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Author name, ignoring blank values
    pub fn author(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}
