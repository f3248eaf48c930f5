//! Container descriptor and package document parsing

use crate::error::FormatError;
use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};

pub(crate) const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Media types read as chapter documents; a missing media type counts too
const DOCUMENT_MEDIA_TYPES: [&str; 2] = ["application/xhtml+xml", "text/html"];

/// One `<item>` of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

impl ManifestItem {
    pub fn is_nav(&self) -> bool {
        self.properties.iter().any(|p| p == "nav")
    }

    /// Whether the item can be read as a chapter document
    pub fn is_document(&self) -> bool {
        let media_type = self.media_type.split(';').next().unwrap_or_default().trim();
        media_type.is_empty()
            || DOCUMENT_MEDIA_TYPES
                .iter()
                .any(|t| media_type.eq_ignore_ascii_case(t))
    }
}

/// One `<itemref>` of the spine
#[derive(Debug, Clone, PartialEq)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
}

/// The parts of a package document the importer uses
#[derive(Debug, Clone, Default)]
pub struct PackageDocument {
    pub title: Option<String>,
    /// First `dc:creator`
    pub creator: Option<String>,
    pub manifest: HashMap<String, ManifestItem>,
    pub spine: Vec<SpineItem>,
    /// Hrefs of guide references with `type="cover"`
    cover_hrefs: HashSet<String>,
}

impl PackageDocument {
    /// Manifest items of the spine that are chapters, in reading order.
    ///
    /// The navigation document, items that are not (X)HTML documents,
    /// non-linear itemrefs and cover pages are skipped. An idref missing from the manifest is an
    /// error.
    pub fn chapters(&self) -> Result<Vec<&ManifestItem>, FormatError> {
        let mut chapters = Vec::with_capacity(self.spine.len());
        for itemref in &self.spine {
            let item = self
                .manifest
                .get(&itemref.idref)
                .ok_or_else(|| FormatError::UnknownSpineItem(itemref.idref.clone()))?;

            if !item.is_document() {
                tracing::warn!(
                    "Skipping spine item {}: {} is not a document",
                    item.id,
                    item.media_type
                );
                continue;
            }

            let skip = if item.is_nav() {
                Some("navigation document")
            } else if !itemref.linear {
                Some("non-linear")
            } else if self.is_cover(item) {
                Some("cover")
            } else {
                None
            };
            match skip {
                Some(reason) => tracing::debug!("Skipping spine item {}: {}", item.id, reason),
                None => chapters.push(item),
            }
        }
        Ok(chapters)
    }

    fn is_cover(&self, item: &ManifestItem) -> bool {
        item.id.eq_ignore_ascii_case("cover") || self.cover_hrefs.contains(strip_fragment(&item.href))
    }
}

/// Package document path named by `container.xml`
pub(crate) fn parse_container(xml: &str) -> Result<String, FormatError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path").filter(|p| !p.trim().is_empty()) {
                    return Ok(path.trim().to_string());
                }
            }
            Ok(Event::Eof) => return Err(FormatError::MissingRootfile),
            Err(e) => return Err(malformed(CONTAINER_PATH, e)),
            _ => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum TextField {
    Title,
    Creator,
}

/// Parse a package document; `path` is only used in error messages
pub(crate) fn parse_package(xml: &str, path: &str) -> Result<PackageDocument, FormatError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut package = PackageDocument::default();
    let mut saw_manifest = false;
    let mut saw_spine = false;
    let mut in_metadata = false;
    let mut field: Option<TextField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                match e.local_name().as_ref() {
                    b"metadata" => in_metadata = true,
                    b"manifest" => saw_manifest = true,
                    b"spine" => saw_spine = true,
                    b"title" if in_metadata => field = Some(TextField::Title),
                    b"creator" if in_metadata => field = Some(TextField::Creator),
                    _ => read_item(&e, &mut package),
                }
                text.clear();
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"manifest" => saw_manifest = true,
                b"spine" => saw_spine = true,
                _ => read_item(&e, &mut package),
            },
            Ok(Event::Text(e)) if field.is_some() => match e.unescape() {
                Ok(unescaped) => text.push_str(&unescaped),
                Err(_) => text.push_str(&String::from_utf8_lossy(&e)),
            },
            Ok(Event::CData(e)) if field.is_some() => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"metadata" {
                    in_metadata = false;
                }
                if let Some(done) = field.take() {
                    let value = text.trim();
                    let slot = match done {
                        TextField::Title => &mut package.title,
                        TextField::Creator => &mut package.creator,
                    };
                    if slot.is_none() && !value.is_empty() {
                        *slot = Some(value.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(path, e)),
            _ => {}
        }
    }

    if !saw_manifest {
        return Err(FormatError::MissingManifest);
    }
    if !saw_spine {
        return Err(FormatError::MissingSpine);
    }
    Ok(package)
}

/// Record manifest items, itemrefs and guide references
fn read_item(e: &BytesStart<'_>, package: &mut PackageDocument) {
    match e.local_name().as_ref() {
        b"item" => {
            let (Some(id), Some(href)) = (attribute(e, b"id"), attribute(e, b"href")) else {
                return;
            };
            let properties = attribute(e, b"properties")
                .map(|p| p.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            package.manifest.insert(
                id.clone(),
                ManifestItem {
                    id,
                    href,
                    media_type: attribute(e, b"media-type").unwrap_or_default(),
                    properties,
                },
            );
        }
        b"itemref" => {
            if let Some(idref) = attribute(e, b"idref") {
                let linear = attribute(e, b"linear").map_or(true, |l| l.trim() != "no");
                package.spine.push(SpineItem { idref, linear });
            }
        }
        b"reference" => {
            let is_cover = attribute(e, b"type").map_or(false, |t| t.eq_ignore_ascii_case("cover"));
            if let Some(href) = attribute(e, b"href").filter(|_| is_cover) {
                package.cover_hrefs.insert(strip_fragment(&href).to_string());
            }
        }
        _ => {}
    }
}

/// Unescaped value of the attribute with local name `name`
fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn malformed(path: &str, error: quick_xml::Error) -> FormatError {
    FormatError::Malformed {
        path: path.to_string(),
        reason: error.to_string(),
    }
}

fn strip_fragment(href: &str) -> &str {
    href.split(['#', '?']).next().unwrap_or(href)
}

/// Directory part of an archive path, empty at the root
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve a (percent-encoded) relative href against an archive directory,
/// normalizing `.` and `..` segments
pub(crate) fn resolve_path(base_dir: &str, href: &str) -> String {
    let decoded = percent_decode_str(strip_fragment(href)).decode_utf8_lossy();
    let mut segments: Vec<&str> = if decoded.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
