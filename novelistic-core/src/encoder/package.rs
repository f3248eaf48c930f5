//! Container descriptor and package document

use super::epub::PublicationContext;
use super::{ChapterEntry, ImageEntry};
use crate::types::Novel;
use quick_xml::escape::escape;

/// Path of the package document inside the archive
pub(crate) const PACKAGE_PATH: &str = "OEBPS/content.opf";

pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

/// Generate `content.opf`.
///
/// The manifest lists the navigation document, the NCX, the stylesheet, each
/// chapter in spine order and then each image; the spine lists the chapters.
pub(crate) fn content_opf(
    novel: &Novel,
    chapters: &[ChapterEntry],
    images: &[ImageEntry],
    context: &PublicationContext,
) -> String {
    let mut manifest = String::new();
    manifest.push_str(
        "        <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );
    manifest.push_str(
        "        <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    manifest.push_str("        <item id=\"style\" href=\"style.css\" media-type=\"text/css\"/>\n");

    let mut spine = String::new();
    for chapter in chapters {
        manifest.push_str(&format!(
            "        <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            chapter.id, chapter.href
        ));
        spine.push_str(&format!("        <itemref idref=\"{}\"/>\n", chapter.id));
    }
    for image in images {
        manifest.push_str(&format!(
            "        <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
            image.id, image.href, image.media_type
        ));
    }

    let mut guide = String::from(
        "        <reference type=\"toc\" title=\"Table of Contents\" href=\"nav.xhtml\"/>\n",
    );
    if let Some(first) = chapters.first() {
        guide.push_str(&format!(
            "        <reference type=\"text\" title=\"Beginning\" href=\"{}\"/>\n",
            first.href
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="pub-id">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:identifier id="pub-id">urn:uuid:{identifier}</dc:identifier>
        <dc:title>{title}</dc:title>
        <dc:creator id="creator">{creator}</dc:creator>
        <dc:language>{language}</dc:language>
        <dc:date>{date}</dc:date>
        <meta property="dcterms:modified">{modified}</meta>
    </metadata>
    <manifest>
{manifest}    </manifest>
    <spine toc="ncx">
{spine}    </spine>
    <guide>
{guide}    </guide>
</package>"#,
        identifier = context.identifier,
        title = escape(novel.title.as_str()),
        creator = escape(novel.author().unwrap_or("Anonymous")),
        language = escape(context.language.as_str()),
        date = context.modified.format("%Y-%m-%d"),
        modified = context.modified.format("%Y-%m-%dT%H:%M:%SZ"),
    )
}
