//! Moving images between inline data URIs and archive resources

use super::data_uri::{encode_data_uri, is_image_data_uri, sniff_mime_type};
use super::{parse_fragment, write_children, Attrs, Rewrite};
use crate::error::ImageError;
use crate::types::ExtractedImage;
use ego_tree::{NodeId, NodeRef};
use scraper::node::Element;
use scraper::Node;
use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Archive-wide id of the `local_id` image of a 0-based chapter
pub fn global_image_id(chapter_index: usize, local_id: &str) -> String {
    format!("ep{}_{}", chapter_index, local_id)
}

/// HTML with its inline images pulled out
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub html: String,
    /// In document order
    pub images: Vec<ExtractedImage>,
}

/// Replace every inline `data:image/` source with a `../images/<local_id>.png`
/// reference.
///
/// Local ids count extracted images only (`image_0`, `image_1`, ...). Other
/// images are left as they are.
pub fn extract_images(html: &str) -> ExtractedContent {
    extract_with(html, |local_id| local_id.to_string())
}

/// Like [`extract_images`], but references and image ids are namespaced by
/// the chapter's 0-based spine position so they are unique in an archive
pub fn extract_chapter_images(html: &str, chapter_index: usize) -> ExtractedContent {
    extract_with(html, |local_id| global_image_id(chapter_index, local_id))
}

fn extract_with(html: &str, archive_id: impl Fn(&str) -> String) -> ExtractedContent {
    let fragment = parse_fragment(html);
    let mut extractor = Extractor {
        archive_id,
        images: Vec::new(),
    };
    let mut out = String::with_capacity(html.len());
    write_children(*fragment.root_element(), &mut extractor, &mut out);
    ExtractedContent {
        html: out,
        images: extractor.images,
    }
}

struct Extractor<F> {
    archive_id: F,
    images: Vec<ExtractedImage>,
}

impl<'a, F: Fn(&str) -> String> Rewrite<'a> for Extractor<F> {
    fn element(&mut self, _node: NodeRef<'a, Node>, element: &'a Element) -> Option<Attrs<'a>> {
        let src = element.attr("src").filter(|s| is_image_data_uri(s.trim()));
        let Some(src) = src.filter(|_| element.name() == "img") else {
            return Some(element.attrs().map(|(k, v)| (k, Cow::Borrowed(v))).collect());
        };

        let local_id = format!("image_{}", self.images.len());
        let id = (self.archive_id)(&local_id);
        let alt = match element.attr("alt").map(str::trim) {
            Some(alt) if !alt.is_empty() => Cow::Borrowed(alt),
            _ => Cow::Owned(format!("image {}", local_id)),
        };

        let mut attrs: Attrs<'a> = element
            .attrs()
            .filter(|(k, _)| !matches!(*k, "src" | "alt"))
            .map(|(k, v)| (k, Cow::Borrowed(v)))
            .collect();
        attrs.push(("src", Cow::Owned(format!("../images/{}.png", id))));
        attrs.push(("alt", alt));

        self.images.push(ExtractedImage {
            id,
            local_id,
            data_uri: src.trim().to_string(),
        });
        Some(attrs)
    }
}

/// Source of image bytes for relative `<img src>` references
pub trait ImageResolver {
    fn resolve(&mut self, src: &str) -> Result<Vec<u8>, ImageError>;
}

impl<S: BuildHasher> ImageResolver for HashMap<String, Vec<u8>, S> {
    fn resolve(&mut self, src: &str) -> Result<Vec<u8>, ImageError> {
        self.get(src)
            .cloned()
            .ok_or_else(|| ImageError::Missing(src.to_string()))
    }
}

/// An image reference left in place because its bytes were unavailable
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedImage {
    pub src: String,
    pub error: ImageError,
}

/// HTML with relative image references turned back into data URIs
#[derive(Debug, Clone, PartialEq)]
pub struct ReinsertedContent {
    pub html: String,
    pub unresolved: Vec<UnresolvedImage>,
}

/// Inline every relative `<img src>` of `html` as a base64 data URI.
///
/// References the resolver cannot satisfy keep their original `src` and are
/// reported in [`ReinsertedContent::unresolved`].
pub fn reinsert_images<R: ImageResolver + ?Sized>(html: &str, resolver: &mut R) -> ReinsertedContent {
    let fragment = parse_fragment(html);
    let mut inliner = ImageInliner::new(resolver);
    let mut out = String::with_capacity(html.len());
    write_children(*fragment.root_element(), &mut inliner, &mut out);
    ReinsertedContent {
        html: out,
        unresolved: inliner.into_unresolved(),
    }
}

/// Rewrite pass that inlines resolvable images and drops their `class`
pub(crate) struct ImageInliner<'r, R: ?Sized> {
    resolver: &'r mut R,
    skip: Option<NodeId>,
    unresolved: Vec<UnresolvedImage>,
}

impl<'r, R: ImageResolver + ?Sized> ImageInliner<'r, R> {
    pub(crate) fn new(resolver: &'r mut R) -> Self {
        Self {
            resolver,
            skip: None,
            unresolved: Vec::new(),
        }
    }

    /// Leave one element (and its subtree) out of the output
    pub(crate) fn skipping(mut self, node: Option<NodeId>) -> Self {
        self.skip = node;
        self
    }

    pub(crate) fn into_unresolved(self) -> Vec<UnresolvedImage> {
        self.unresolved
    }
}

impl<'a, 'r, R: ImageResolver + ?Sized> Rewrite<'a> for ImageInliner<'r, R> {
    fn element(&mut self, node: NodeRef<'a, Node>, element: &'a Element) -> Option<Attrs<'a>> {
        if self.skip == Some(node.id()) {
            return None;
        }

        let attrs = element.attrs().map(|(k, v)| (k, Cow::Borrowed(v)));
        if element.name() != "img" {
            return Some(attrs.collect());
        }

        let mut attrs: Attrs<'a> = attrs.filter(|(k, _)| *k != "class").collect();
        for (key, value) in attrs.iter_mut() {
            if *key != "src" || !is_archive_reference(value) {
                continue;
            }
            match self.resolver.resolve(value) {
                Ok(bytes) => {
                    *value = Cow::Owned(encode_data_uri(sniff_mime_type(&bytes), &bytes));
                }
                Err(error) => {
                    tracing::warn!("Image not resolved: {} ({})", value, error);
                    self.unresolved.push(UnresolvedImage {
                        src: value.to_string(),
                        error,
                    });
                }
            }
        }
        Some(attrs)
    }
}

/// Relative references only; data URIs and absolute URLs are left alone
fn is_archive_reference(src: &str) -> bool {
    let src = src.trim();
    !src.is_empty() && !src.starts_with('#') && !src.starts_with("//") && !has_scheme(src)
}

fn has_scheme(src: &str) -> bool {
    let Some((scheme, _)) = src.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().map_or(false, |c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::decode_data_uri;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_extract_assigns_sequential_ids() {
        let html = format!(
            r#"<p><img src="{PIXEL}"></p><p><img src="https://example.com/x.png"><img src="{PIXEL}" alt="map"></p>"#
        );
        let extracted = extract_images(&html);

        let ids: Vec<_> = extracted.images.iter().map(|i| i.local_id.as_str()).collect();
        assert_eq!(ids, ["image_0", "image_1"]);
        assert!(extracted
            .html
            .contains(r#"<img alt="image image_0" src="../images/image_0.png"/>"#));
        assert!(extracted
            .html
            .contains(r#"<img alt="map" src="../images/image_1.png"/>"#));
        assert!(extracted.html.contains(r#"src="https://example.com/x.png""#));
        assert_eq!(extracted.images[0].data_uri, PIXEL);
    }

    #[test]
    fn test_chapter_images_are_namespaced() {
        let html = format!(r#"<img src="{PIXEL}"><img src="{PIXEL}">"#);
        let extracted = extract_chapter_images(&html, 3);

        assert_eq!(extracted.images[1].id, "ep3_image_1");
        assert_eq!(extracted.images[1].local_id, "image_1");
        assert_eq!(extracted.images[1].href(), "images/ep3_image_1.png");
        assert!(extracted.html.contains("../images/ep3_image_0.png"));
    }

    #[test]
    fn test_html_without_images_is_unchanged_apart_from_serialization() {
        let extracted = extract_images("<p>Just text.</p>");
        assert!(extracted.images.is_empty());
        assert_eq!(extracted.html, "<p>Just text.</p>");
    }

    #[test]
    fn test_reinsert_resolves_known_images() {
        let mut resolver = HashMap::new();
        resolver.insert("../images/a.png".to_string(), b"GIF89a-bytes".to_vec());

        let reinserted = reinsert_images(
            r#"<p><img class="wide" src="../images/a.png" alt="a"></p>"#,
            &mut resolver,
        );
        assert!(reinserted.unresolved.is_empty());
        assert!(!reinserted.html.contains("class="));

        let src = reinserted
            .html
            .split("src=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let decoded = decode_data_uri(src).unwrap();
        assert_eq!(decoded.mime_type, "image/gif");
        assert_eq!(decoded.data, b"GIF89a-bytes");
    }

    #[test]
    fn test_reinsert_keeps_missing_reference() {
        let mut resolver: HashMap<String, Vec<u8>> = HashMap::new();
        let reinserted = reinsert_images(
            r#"<p>Before</p><p><img src="../images/gone.png"></p><p>After</p>"#,
            &mut resolver,
        );

        assert_eq!(reinserted.unresolved.len(), 1);
        assert_eq!(reinserted.unresolved[0].src, "../images/gone.png");
        assert_eq!(
            reinserted.unresolved[0].error,
            ImageError::Missing("../images/gone.png".to_string())
        );
        assert!(reinserted.html.contains(r#"<img src="../images/gone.png"/>"#));
        assert!(reinserted.html.contains("<p>After</p>"));
    }

    #[test]
    fn test_reinsert_skips_inline_and_remote_sources() {
        let mut resolver: HashMap<String, Vec<u8>> = HashMap::new();
        let html = format!(r#"<img src="{PIXEL}"><img src="http://example.com/a.png">"#);
        let reinserted = reinsert_images(&html, &mut resolver);
        assert!(reinserted.unresolved.is_empty());
        assert!(reinserted.html.contains(PIXEL));
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://x"));
        assert!(has_scheme("data:image/png;base64,"));
        assert!(!has_scheme("../images/a.png"));
        assert!(!has_scheme("images/a:b.png"));
    }
}
