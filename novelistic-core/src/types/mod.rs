//! Core record types for novels, episodes and their embedded images

mod episode;
mod image;
mod novel;

pub use episode::{sort_by_order, Episode, EpisodeId, EpisodeNotes};
pub use image::{ExtractedImage, ImageIssue};
pub use novel::{Novel, NovelId, NovelNotes};
