//! Novelistic Core Library
//!
//! This crate converts novels, stored as ordered episodes of HTML with
//! inline data-URI images, to EPUB 3 archives and back. Export extracts and
//! decodes the images, sanitizes each chapter and assembles the archive;
//! import reads the package document and spine and inlines the images again.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod html;
pub mod library;
pub mod storage;
pub mod types;

pub use decoder::{check_archive, CheckIssue, CheckReport, EpubDecoder, ImportedBook};
pub use encoder::{generate_epub, generate_epub_with, suggested_file_name, EpubFile, ExportOptions};
pub use error::{
    ConversionError, FormatError, ImageError, NovelisticError, Result, StorageError, ValidationError,
};
pub use library::{
    download_novel, export_novel, upload_novel, upload_novel_file, validate_file_name,
    ImportedNovel, SavedEpub,
};
pub use storage::{JsonFileStore, MemoryStore, NovelStore, StorageResult};
pub use types::{Episode, EpisodeId, ImageIssue, Novel, NovelId};
