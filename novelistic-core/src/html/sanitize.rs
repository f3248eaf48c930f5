use super::{element_name, is_block, parse_fragment, write_children, Attrs, Rewrite};
use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::Node;
use std::borrow::Cow;

/// Attributes that survive sanitizing
const KEPT_ATTRIBUTES: [&str; 3] = ["href", "src", "alt"];

/// Reduce episode HTML to the markup a chapter document carries.
///
/// Strips all attributes but `href`, `src` and `alt`, gives every image an
/// `alt`, removes paragraphs with neither text nor an image, drops
/// whitespace-only text between block elements and writes void elements in
/// self-closing form. Text inside paragraphs is never changed, and
/// `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(html: &str) -> String {
    let fragment = parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(*fragment.root_element(), &mut Sanitizer, &mut out);
    out
}

struct Sanitizer;

impl<'a> Rewrite<'a> for Sanitizer {
    fn element(&mut self, node: NodeRef<'a, Node>, element: &'a Element) -> Option<Attrs<'a>> {
        let name = element.name();
        if is_dropped(name) || (name == "p" && !has_content(node)) {
            return None;
        }

        let mut attrs: Attrs<'a> = element
            .attrs()
            .filter(|(k, _)| KEPT_ATTRIBUTES.contains(k))
            .map(|(k, v)| (k, Cow::Borrowed(v)))
            .collect();
        if name == "img" && !attrs.iter().any(|(k, _)| *k == "alt") {
            attrs.push(("alt", Cow::Borrowed("")));
        }
        Some(attrs)
    }

    fn keep_text(&mut self, node: NodeRef<'a, Node>, text: &str) -> bool {
        if !is_blank(text) {
            return true;
        }
        match node.parent().and_then(element_name) {
            Some(parent) if is_block(parent) && parent != "pre" => {}
            _ => return true,
        }

        let before = node.prev_siblings().find(|n| is_significant(*n));
        let after = node.next_siblings().find(|n| is_significant(*n));
        !(is_block_or_absent(before) && is_block_or_absent(after))
    }
}

/// Elements removed together with their contents. Raw-text elements are
/// among them since their bodies would not survive re-parsing as text.
fn is_dropped(name: &str) -> bool {
    matches!(
        name,
        "script"
            | "style"
            | "template"
            | "noscript"
            | "iframe"
            | "xmp"
            | "noembed"
            | "noframes"
            | "plaintext"
    )
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

/// Siblings that still exist after sanitizing and are not blank text
fn is_significant(node: NodeRef<'_, Node>) -> bool {
    match node.value() {
        Node::Text(text) => !is_blank(text),
        Node::Element(element) => !is_dropped(element.name()),
        _ => false,
    }
}

fn is_block_or_absent(node: Option<NodeRef<'_, Node>>) -> bool {
    node.map_or(true, |n| element_name(n).map_or(false, is_block))
}

/// Whether a paragraph holds visible text or an image once sanitized
fn has_content(node: NodeRef<'_, Node>) -> bool {
    node.children().any(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Element(element) => match element.name() {
            "img" => true,
            name if is_dropped(name) => false,
            _ => has_content(child),
        },
        _ => false,
    })
}
