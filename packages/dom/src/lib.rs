//! # Quire DOM
//!
//! Minimal markup layer shared by the document model and the editor.
//!
//! ```text
//! HTML text ──lexer──► tokens ──parser──► DomNode tree ──serializer──► HTML text
//! ```
//!
//! The tree is deliberately small: elements with ordered attributes, text and
//! HTML comments. It is what the schema-driven import/export pipeline reads and
//! writes, and what the head synchronization view reconciles against.

pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod serializer;

pub use error::{MarkupError, MarkupResult};
pub use node::{DomNode, Element};
pub use parser::{parse_document, parse_fragment, ParsedDocument};
pub use serializer::{element_to_html, to_html, SerializeOptions};

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text (no markup, no entity decoding).
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose content is text with entities but no markup.
pub const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["title", "textarea"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&tag)
}
