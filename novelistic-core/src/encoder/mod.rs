//! Export of novels to EPUB 3 archives
//!
//! [`generate_epub`] runs the whole pipeline: per-chapter image extraction
//! and sanitizing, generation of the package and navigation documents, and
//! assembly of the zip container.

mod chapter;
mod epub;
mod navigation;
mod package;

pub use chapter::STYLESHEET;
pub use epub::{EpubEncoder, PublicationContext};

use crate::error::Result;
use crate::types::{Episode, ImageIssue, Novel};
use serde::{Deserialize, Serialize};

/// MIME type of an EPUB archive, also the content of its `mimetype` entry
pub const EPUB_MIME_TYPE: &str = "application/epub+zip";

/// Options for EPUB export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Publication language (BCP 47)
    pub language: String,

    /// Deflate level for every entry but `mimetype`, 0-9
    pub compression_level: i64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            compression_level: 9,
        }
    }
}

/// A generated EPUB archive
#[derive(Debug, Clone)]
pub struct EpubFile {
    /// The zip archive
    pub data: Vec<u8>,

    /// Suggested file name, see [`suggested_file_name`]
    pub file_name: String,

    /// Images that could not be decoded and were left out
    pub issues: Vec<ImageIssue>,
}

impl EpubFile {
    pub fn mime_type(&self) -> &'static str {
        EPUB_MIME_TYPE
    }
}

/// File name for a novel's archive: the title without filesystem-unsafe
/// characters, plus `.epub`
pub fn suggested_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == ' ' || matches!(c, '-' | '_'))
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "novel.epub".to_string()
    } else {
        format!("{}.epub", stem)
    }
}

/// Export a novel with default options.
///
/// Episodes may be given in any order; the spine follows ascending
/// [`Episode::order`].
pub fn generate_epub(novel: &Novel, episodes: &[Episode]) -> Result<EpubFile> {
    EpubEncoder::new().encode(novel, episodes)
}

/// Export a novel with the given options
pub fn generate_epub_with(
    novel: &Novel,
    episodes: &[Episode],
    options: &ExportOptions,
) -> Result<EpubFile> {
    EpubEncoder::new()
        .with_options(options.clone())
        .encode(novel, episodes)
}

/// A chapter as it is written into the archive
#[derive(Debug, Clone)]
pub(crate) struct ChapterEntry {
    /// Manifest id, `chapter<N>`
    pub id: String,
    /// Path relative to the package document
    pub href: String,
    pub title: String,
    /// Sanitized XHTML body
    pub body: String,
}

/// A decoded image as it is written into the archive
#[derive(Debug, Clone)]
pub(crate) struct ImageEntry {
    pub id: String,
    pub href: String,
    pub media_type: &'static str,
    pub data: Vec<u8>,
}
