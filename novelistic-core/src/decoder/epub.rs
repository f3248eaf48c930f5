//! EPUB decoder implementation

use super::package::{parent_dir, parse_container, parse_package, resolve_path, CONTAINER_PATH};
use super::read_text_entry;
use super::resolver::ArchiveImageResolver;
use crate::error::{FormatError, Result};
use crate::html::{element_name, text_content, write_children, ImageInliner};
use crate::types::ImageIssue;
use ego_tree::NodeRef;
use scraper::{Html, Node};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Author recorded when the package names none
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A chapter recovered from the spine
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedChapter {
    pub title: String,
    /// XHTML with images inlined as data URIs
    pub content: String,
    /// Dense from 0 in spine order
    pub order: u32,
}

/// Everything recovered from an EPUB, before anything is stored
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBook {
    /// `dc:title`, if present
    pub title: Option<String>,
    pub author: String,
    pub chapters: Vec<ImportedChapter>,
    /// Image references left unresolved
    pub issues: Vec<ImageIssue>,
    /// Spine documents missing from the archive
    pub missing_chapters: Vec<String>,
}

/// Decoder for EPUB 2/3 archives
pub struct EpubDecoder;

impl EpubDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode an archive held in memory
    pub fn decode(&self, data: &[u8]) -> Result<ImportedBook> {
        let archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| FormatError::InvalidArchive(e.to_string()))?;
        self.decode_archive(archive)
    }

    /// Decode an opened archive
    pub fn decode_archive<R: Read + Seek>(&self, mut archive: ZipArchive<R>) -> Result<ImportedBook> {
        let container = read_text_entry(&mut archive, CONTAINER_PATH)
            .map_err(invalid_archive)?
            .ok_or(FormatError::MissingContainer)?;
        let package_path = parse_container(&container)?;

        let package_xml = read_text_entry(&mut archive, &package_path)
            .map_err(invalid_archive)?
            .ok_or_else(|| FormatError::MissingPackage(package_path.clone()))?;
        let package = parse_package(&package_xml, &package_path)?;
        let root_dir = parent_dir(&package_path);

        let mut book = ImportedBook {
            title: package.title.clone(),
            author: package
                .creator
                .clone()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            chapters: Vec::new(),
            issues: Vec::new(),
            missing_chapters: Vec::new(),
        };

        for item in package.chapters()? {
            let path = resolve_path(root_dir, &item.href);
            let Some(xhtml) = read_text_entry(&mut archive, &path).map_err(invalid_archive)? else {
                tracing::warn!("Chapter document not found in EPUB: {}", path);
                book.missing_chapters.push(path);
                continue;
            };

            let position = book.chapters.len() + 1;
            let document = Html::parse_document(&xhtml);
            let title = chapter_title(&document, position);
            let body = content_root(&document);

            let mut resolver = ArchiveImageResolver::new(&mut archive, parent_dir(&path), root_dir);
            let mut inliner = ImageInliner::new(&mut resolver).skipping(generated_heading(body, &title));
            let mut content = String::with_capacity(xhtml.len());
            write_children(body, &mut inliner, &mut content);

            for unresolved in inliner.into_unresolved() {
                book.issues
                    .push(ImageIssue::new(position, unresolved.src, unresolved.error));
            }
            tracing::debug!("Imported chapter {}: {}", position, title);

            book.chapters.push(ImportedChapter {
                title,
                content: content.trim().to_string(),
                order: (position - 1) as u32,
            });
        }

        tracing::info!(
            "Decoded EPUB: {} chapter(s), {} unresolved image(s)",
            book.chapters.len(),
            book.issues.len()
        );
        Ok(book)
    }
}

impl Default for EpubDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_archive(error: zip::result::ZipError) -> FormatError {
    FormatError::InvalidArchive(error.to_string())
}

/// `<title>`, else the first `<h1>`, else "Chapter N"
fn chapter_title(document: &Html, position: usize) -> String {
    let root = *document.root_element();
    ["title", "h1"]
        .iter()
        .find_map(|name| {
            let node = root
                .descendants()
                .find(|n| element_name(*n) == Some(*name))?;
            let text = text_content(node);
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .unwrap_or_else(|| format!("Chapter {}", position))
}

/// The first `<section>` inside `<body>`, else `<body>` itself
fn content_root(document: &Html) -> NodeRef<'_, Node> {
    let root = *document.root_element();
    let Some(body) = root.descendants().find(|n| element_name(*n) == Some("body")) else {
        return root;
    };
    body.descendants()
        .skip(1)
        .find(|n| element_name(*n) == Some("section"))
        .unwrap_or(body)
}

/// The heading export writes above the content: a leading `<h1>` that
/// repeats the chapter title
fn generated_heading(content: NodeRef<'_, Node>, title: &str) -> Option<ego_tree::NodeId> {
    let first = content.children().find(|n| n.value().is_element())?;
    (element_name(first) == Some("h1") && text_content(first).trim() == title).then(|| first.id())
}
