//! Embedded image bookkeeping shared by export and import

use crate::error::ImageError;
use serde::Serialize;
use std::fmt;

/// An image pulled out of episode HTML during export
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    /// Archive-wide id, also the file stem under `images/`
    pub id: String,

    /// Id within its own chapter (`image_0`, `image_1`, ...)
    pub local_id: String,

    /// The original `data:image/...` URI
    pub data_uri: String,
}

impl ExtractedImage {
    /// Path of the image relative to the package document
    pub fn href(&self) -> String {
        format!("images/{}.png", self.id)
    }
}

/// A non-fatal image failure, reported alongside export or import results
#[derive(Debug, Clone, PartialEq)]
pub struct ImageIssue {
    /// 1-based chapter position in the spine
    pub chapter: usize,

    /// The image id (export) or the unresolved `src` (import)
    pub reference: String,

    pub error: ImageError,
}

impl ImageIssue {
    pub fn new(chapter: usize, reference: impl Into<String>, error: ImageError) -> Self {
        Self {
            chapter,
            reference: reference.into(),
            error,
        }
    }
}

impl fmt::Display for ImageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chapter {}: {} ({})",
            self.chapter, self.reference, self.error
        )
    }
}

impl Serialize for ImageIssue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
