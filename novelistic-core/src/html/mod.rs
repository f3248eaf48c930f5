//! HTML rewriting for episode content
//!
//! Episode HTML is parsed with an HTML5 parser and written back out as XHTML
//! by walking the tree. Each pass (image extraction, sanitizing, image
//! reinsertion) is a [`Rewrite`] that decides per node what gets written, so
//! every pass emits well-formed markup with self-closing void elements.

mod data_uri;
mod images;
mod sanitize;

pub use data_uri::{decode_data_uri, encode_data_uri, is_image_data_uri, sniff_mime_type, DecodedImage};
pub use images::{
    extract_chapter_images, extract_images, global_image_id, reinsert_images, ExtractedContent,
    ImageResolver, ReinsertedContent, UnresolvedImage,
};
pub(crate) use images::ImageInliner;
pub use sanitize::sanitize;

use ego_tree::NodeRef;
use quick_xml::escape::{escape, partial_escape};
use scraper::node::Element;
use scraper::Node;
use std::borrow::Cow;

/// Attributes to write for an element, in order
pub(crate) type Attrs<'a> = Vec<(&'a str, Cow<'a, str>)>;

/// Per-node decisions for one serialization pass
pub(crate) trait Rewrite<'a> {
    /// Attributes to write for `element`, or `None` to drop it with its children
    fn element(&mut self, node: NodeRef<'a, Node>, element: &'a Element) -> Option<Attrs<'a>>;

    /// Whether a text node is written
    fn keep_text(&mut self, _node: NodeRef<'a, Node>, _text: &str) -> bool {
        true
    }
}

/// Elements serialized as `<name/>`
pub(crate) fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Block-level elements; whitespace between them carries no text
pub(crate) fn is_block(name: &str) -> bool {
    matches!(
        name,
        "html"
            | "body"
            | "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "figcaption"
            | "figure"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "tbody"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "ul"
    )
}

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse an HTML fragment; content lives under the fragment's root element
pub(crate) fn parse_fragment(html: &str) -> scraper::Html {
    scraper::Html::parse_fragment(html)
}

/// Element name of a node, if it is an element
pub(crate) fn element_name<'a>(node: NodeRef<'a, Node>) -> Option<&'a str> {
    node.value().as_element().map(|e| e.name())
}

/// Concatenated text of all descendants
pub(crate) fn text_content(node: NodeRef<'_, Node>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        if let Node::Text(t) = descendant.value() {
            text.push_str(t);
        }
    }
    text
}

/// Serialize the children of `parent` through `rewrite`
pub(crate) fn write_children<'a, R: Rewrite<'a>>(
    parent: NodeRef<'a, Node>,
    rewrite: &mut R,
    out: &mut String,
) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => {
                if rewrite.keep_text(child, text) {
                    out.push_str(&partial_escape(&**text));
                }
            }
            Node::Element(element) => {
                if let Some(attrs) = rewrite.element(child, element) {
                    write_element(child, element.name(), &attrs, rewrite, out);
                }
            }
            // Comments, doctypes and processing instructions are not carried over
            _ => {}
        }
    }
}

fn write_element<'a, R: Rewrite<'a>>(
    node: NodeRef<'a, Node>,
    name: &str,
    attrs: &Attrs<'a>,
    rewrite: &mut R,
    out: &mut String,
) {
    out.push('<');
    out.push_str(name);

    // Attribute order from the parser is not stable across versions
    let mut ordered: Vec<&(&str, Cow<'a, str>)> = attrs.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in ordered {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(&**value));
        out.push('"');
    }

    if is_void(name) {
        out.push_str("/>");
        return;
    }
    out.push('>');

    // The HTML parser eats one newline right after these start tags, but
    // not inside SVG or MathML. Check what is written, since the rewrite may
    // have dropped the original first child.
    if matches!(name, "pre" | "textarea" | "listing") && is_html_element(node) {
        let mut body = String::new();
        write_children(node, rewrite, &mut body);
        if body.starts_with('\n') {
            out.push('\n');
        }
        out.push_str(&body);
    } else {
        write_children(node, rewrite, out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_html_element(node: NodeRef<'_, Node>) -> bool {
    node.value()
        .as_element()
        .map_or(false, |e| &*e.name.ns == HTML_NAMESPACE)
}

/// Writes every element and attribute unchanged
pub(crate) struct Passthrough;

impl<'a> Rewrite<'a> for Passthrough {
    fn element(&mut self, _node: NodeRef<'a, Node>, element: &'a Element) -> Option<Attrs<'a>> {
        Some(element.attrs().map(|(k, v)| (k, Cow::Borrowed(v))).collect())
    }
}

/// Re-serialize an HTML fragment as XHTML without other changes
pub fn to_xhtml(html: &str) -> String {
    let fragment = parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(*fragment.root_element(), &mut Passthrough, &mut out);
    out
}
