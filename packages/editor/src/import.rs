//! Markup preparation before a document reaches the schema parser.

use quire_codec::{deprecated_style, merge_style};
use quire_dom::{DomNode, Element};

/// Deprecated attributes that are still current HTML on some elements. They
/// are only upgraded outside those elements.
const STILL_VALID_ON: &[(&str, &[&str])] = &[
    (
        "type",
        &[
            "a", "button", "embed", "input", "link", "menu", "object", "script", "source", "style",
        ],
    ),
    (
        "width",
        &["canvas", "embed", "iframe", "img", "input", "object", "source", "svg", "video"],
    ),
    (
        "height",
        &["canvas", "embed", "iframe", "img", "input", "object", "source", "svg", "video"],
    ),
    ("start", &["ol"]),
];

fn still_valid(tag: &str, name: &str) -> bool {
    STILL_VALID_ON
        .iter()
        .any(|(attr, tags)| *attr == name && tags.contains(&tag))
}

/// Move the deprecated presentation attributes of `el` into its `style`.
/// Returns whether anything moved.
pub fn upgrade_element(el: &mut Element) -> bool {
    let mut declarations = Vec::new();
    let tag = el.tag.to_ascii_lowercase();
    el.attributes.retain(|(name, value)| {
        if still_valid(&tag, name) {
            return true;
        }
        match deprecated_style(name, value) {
            Some(decls) => {
                declarations.extend(decls);
                false
            }
            None => true,
        }
    });
    if declarations.is_empty() {
        return false;
    }
    let style = merge_style(el.get_attribute("style").unwrap_or_default(), &declarations);
    el.set_attribute("style", style);
    true
}

/// [`upgrade_element`] over a tree. Returns how many elements changed.
pub fn upgrade_deprecated_attributes(nodes: &mut [DomNode]) -> usize {
    let mut upgraded = 0;
    for node in nodes {
        if let Some(el) = node.as_element_mut() {
            if upgrade_element(el) {
                upgraded += 1;
            }
            upgraded += upgrade_deprecated_attributes(&mut el.children);
        }
    }
    upgraded
}

/// Drop whitespace-only text between elements
pub fn strip_blank_text(nodes: Vec<DomNode>) -> Vec<DomNode> {
    nodes
        .into_iter()
        .filter(|node| !matches!(node, DomNode::Text(text) if text.trim().is_empty()))
        .collect()
}
