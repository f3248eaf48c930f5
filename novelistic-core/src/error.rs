//! Error types for Novelistic Core

use thiserror::Error;

/// Result type alias using NovelisticError
pub type Result<T> = std::result::Result<T, NovelisticError>;

/// Top-level error type for all Novelistic operations
#[derive(Debug, Error)]
pub enum NovelisticError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal problems with the structure of an EPUB being imported
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Invalid EPUB archive: {0}")]
    InvalidArchive(String),

    #[error("Invalid EPUB: missing META-INF/container.xml")]
    MissingContainer,

    #[error("Invalid EPUB: container.xml does not name a package document")]
    MissingRootfile,

    #[error("Invalid EPUB: missing package document {0}")]
    MissingPackage(String),

    #[error("Invalid EPUB: unparsable {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Invalid EPUB: package document has no manifest")]
    MissingManifest,

    #[error("Invalid EPUB: package document has no spine")]
    MissingSpine,

    #[error("Invalid EPUB: spine references unknown manifest item {0}")]
    UnknownSpineItem(String),
}

/// Rejections of caller input before any parsing takes place
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid file type: {0} (please upload an EPUB file)")]
    InvalidFileType(String),
}

/// Errors that occur while producing an EPUB archive
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a storage collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// A single image that could not be converted.
///
/// Never fatal: the surrounding chapter is still produced and the failure is
/// reported as an [`ImageIssue`](crate::types::ImageIssue).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageError {
    #[error("not a data URI")]
    NotDataUri,

    #[error("data URI is not base64 encoded")]
    UnsupportedEncoding,

    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("image not found in archive: {0}")]
    Missing(String),

    #[error("failed to read image {path}: {reason}")]
    Unreadable { path: String, reason: String },
}
