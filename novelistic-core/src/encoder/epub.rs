//! EPUB archive assembly

use super::chapter::{chapter_xhtml, STYLESHEET};
use super::navigation::{nav_xhtml, toc_ncx};
use super::package::{content_opf, CONTAINER_XML, PACKAGE_PATH};
use super::{suggested_file_name, ChapterEntry, EpubFile, ExportOptions, ImageEntry, EPUB_MIME_TYPE};
use crate::error::{ConversionError, Result};
use crate::html::{decode_data_uri, extract_chapter_images, sanitize};
use crate::types::{Episode, ImageIssue, Novel};
use chrono::{DateTime, SubsecRound, Utc};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Per-export values that are not derived from the novel
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationContext {
    /// Publication UUID, written as `urn:uuid:<identifier>`
    pub identifier: String,

    /// Publication and modification time
    pub modified: DateTime<Utc>,

    pub language: String,
}

impl PublicationContext {
    /// A fresh random identifier and the current time
    pub fn fresh(language: impl Into<String>) -> Self {
        Self {
            identifier: uuid::Uuid::new_v4().to_string(),
            modified: Utc::now().trunc_subsecs(0),
            language: language.into(),
        }
    }
}

/// Encoder for EPUB 3 archives
pub struct EpubEncoder {
    options: ExportOptions,
}

impl EpubEncoder {
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    /// Set export options
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Export with a fresh publication identifier
    pub fn encode(&self, novel: &Novel, episodes: &[Episode]) -> Result<EpubFile> {
        let context = PublicationContext::fresh(self.options.language.as_str());
        self.encode_with_context(novel, episodes, &context)
    }

    /// Export with an explicit identifier and timestamp
    pub fn encode_with_context(
        &self,
        novel: &Novel,
        episodes: &[Episode],
        context: &PublicationContext,
    ) -> Result<EpubFile> {
        let mut ordered: Vec<&Episode> = episodes.iter().collect();
        ordered.sort_by_key(|e| e.order);

        let mut chapters = Vec::with_capacity(ordered.len());
        let mut images = Vec::new();
        let mut issues = Vec::new();

        for (index, episode) in ordered.into_iter().enumerate() {
            let position = index + 1;
            let extracted = extract_chapter_images(&episode.content, index);
            tracing::debug!(
                "Chapter {}: {} embedded image(s)",
                position,
                extracted.images.len()
            );

            for image in extracted.images {
                match decode_data_uri(&image.data_uri) {
                    Ok(decoded) => images.push(ImageEntry {
                        href: image.href(),
                        media_type: decoded.media_type(),
                        data: decoded.data,
                        id: image.id,
                    }),
                    Err(error) => {
                        tracing::warn!("Skipping image {} in chapter {}: {}", image.id, position, error);
                        issues.push(ImageIssue::new(position, image.id, error));
                    }
                }
            }

            chapters.push(ChapterEntry {
                id: format!("chapter{}", position),
                href: format!("xhtml/chapter{}.xhtml", position),
                title: episode.display_title(position),
                body: sanitize(&extracted.html),
            });
        }

        let data = self.write_archive(novel, &chapters, &images, context)?;
        tracing::info!(
            "Exported \"{}\": {} chapter(s), {} image(s), {} bytes",
            novel.title,
            chapters.len(),
            images.len(),
            data.len()
        );

        Ok(EpubFile {
            data,
            file_name: suggested_file_name(&novel.title),
            issues,
        })
    }

    fn write_archive(
        &self,
        novel: &Novel,
        chapters: &[ChapterEntry],
        images: &[ImageEntry],
        context: &PublicationContext,
    ) -> std::result::Result<Vec<u8>, ConversionError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let stored = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.options.compression_level.clamp(0, 9)))
            .unix_permissions(0o644);

        // Readers sniff the format from the first local header
        zip.start_file("mimetype", stored)?;
        zip.write_all(EPUB_MIME_TYPE.as_bytes())?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        zip.start_file(PACKAGE_PATH, deflated)?;
        zip.write_all(content_opf(novel, chapters, images, context).as_bytes())?;

        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(nav_xhtml(novel, chapters, &context.language).as_bytes())?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(toc_ncx(novel, chapters, context).as_bytes())?;

        zip.start_file("OEBPS/style.css", deflated)?;
        zip.write_all(STYLESHEET.as_bytes())?;

        for image in images {
            zip.start_file(format!("OEBPS/{}", image.href), deflated)?;
            zip.write_all(&image.data)?;
        }

        for chapter in chapters {
            zip.start_file(format!("OEBPS/{}", chapter.href), deflated)?;
            zip.write_all(chapter_xhtml(chapter, &context.language).as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

impl Default for EpubEncoder {
    fn default() -> Self {
        Self::new()
    }
}
