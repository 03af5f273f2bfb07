//! Comment annotation micro-format
//!
//! ```text
//! key₁☛val₁♦key₂☛val₂♦…♦content
//! ```
//!
//! `☛` separates a metadata key from its value, `♦` separates metadata pairs from
//! each other and from the trailing content. Delimiters inside values are escaped
//! with a backslash. Two content-less shapes exist besides regular entries:
//!
//! * opening stub `id☛c-0` (no unescaped `♦`), the anchor of a thread
//! * closing marker `id☛c-0♦♦`, the end of a thread

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const KEY_DELIMITER: char = '☛';
pub const ENTRY_DELIMITER: char = '♦';

/// Where a comment is inserted relative to its anchor element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
}

impl CommentPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentPosition::BeforeBegin => "beforebegin",
            CommentPosition::AfterBegin => "afterbegin",
            CommentPosition::BeforeEnd => "beforeend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beforebegin" => Some(CommentPosition::BeforeBegin),
            "afterbegin" => Some(CommentPosition::AfterBegin),
            "beforeend" => Some(CommentPosition::BeforeEnd),
            _ => None,
        }
    }
}

/// A single review comment
///
/// `content` is `None` for malformed input and for the stub/closing shapes. Metadata
/// keys without a dedicated field (for example `author`) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, String>,
}

impl CommentEntry {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_author(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.name = name;
        self.email = email;
        self
    }

    pub fn with_changed(mut self, changed: i64) -> Self {
        self.changed = Some(changed);
        self
    }

    /// Metadata value by key, covering both dedicated fields and `extra`
    pub fn meta(&self, key: &str) -> Option<String> {
        match key {
            "id" => self.id.clone(),
            "position" => self.position.map(|p| p.as_str().to_string()),
            "changed" => self.changed.map(|c| c.to_string()),
            "name" => self.name.clone(),
            "email" => self.email.clone(),
            _ => self.extra.get(key).cloned(),
        }
    }

    fn set_meta(&mut self, key: &str, value: String) {
        match key {
            "id" => self.id = Some(value),
            "position" => match CommentPosition::parse(&value) {
                Some(position) => self.position = Some(position),
                None => {
                    tracing::debug!(value = %value, "unknown comment position kept as metadata");
                    self.extra.insert(key.to_string(), value);
                }
            },
            "changed" => match value.trim().parse::<i64>() {
                Ok(changed) => self.changed = Some(changed),
                Err(_) => {
                    tracing::debug!(value = %value, "non-numeric comment timestamp ignored");
                }
            },
            "name" => self.name = Some(value),
            "email" => self.email = Some(value),
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Metadata pairs in wire order: dedicated fields first, then extras by key
    fn meta_pairs(&self, strip_id: bool) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for key in ["id", "position", "changed", "name", "email"] {
            if strip_id && key == "id" {
                continue;
            }
            if let Some(value) = self.meta(key) {
                if !value.is_empty() {
                    pairs.push((key.to_string(), value));
                }
            }
        }
        for (key, value) in &self.extra {
            if !value.is_empty() {
                pairs.push((key.clone(), value.clone()));
            }
        }
        pairs
    }
}

/// Typed result of decoding one comment string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentRecord {
    /// `id☛…` with nothing else: anchor of a thread
    Stub { id: String },
    /// `id☛…♦♦`: end of a thread
    Closing { id: String },
    /// Any other shape
    Content(CommentEntry),
}

impl CommentRecord {
    pub fn id(&self) -> Option<&str> {
        match self {
            CommentRecord::Stub { id } | CommentRecord::Closing { id } => Some(id),
            CommentRecord::Content(entry) => entry.id.as_deref(),
        }
    }

    pub fn into_entry(self) -> CommentEntry {
        match self {
            CommentRecord::Stub { id } | CommentRecord::Closing { id } => CommentEntry {
                id: Some(id),
                ..Default::default()
            },
            CommentRecord::Content(entry) => entry,
        }
    }
}

/// Strip an optional `<!--`/`-->` wrapper
fn strip_comment_wrapper(text: &str) -> &str {
    match text.strip_prefix("<!--") {
        Some(inner) => inner.strip_suffix("-->").unwrap_or(inner),
        None => text,
    }
}

/// Split on `delimiter` where it is not preceded by a backslash
pub fn split_unescaped(text: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, ch) in text.char_indices() {
        if ch == delimiter && prev != Some('\\') {
            parts.push(&text[start..i]);
            start = i + ch.len_utf8();
        }
        prev = Some(ch);
    }
    parts.push(&text[start..]);
    parts
}

fn split_once_unescaped(text: &str, delimiter: char) -> Option<(&str, &str)> {
    let mut prev: Option<char> = None;
    for (i, ch) in text.char_indices() {
        if ch == delimiter && prev != Some('\\') {
            return Some((&text[..i], &text[i + ch.len_utf8()..]));
        }
        prev = Some(ch);
    }
    None
}

/// Whether `text` contains `delimiter` not preceded by a backslash
pub fn contains_unescaped(text: &str, delimiter: char) -> bool {
    split_once_unescaped(text, delimiter).is_some()
}

/// Ends an HTML comment early when written inside one
const COMMENT_END: &str = "-->";
const ESCAPED_COMMENT_END: &str = "--\\>";

pub fn escape(value: &str) -> String {
    value
        .replace(KEY_DELIMITER, "\\☛")
        .replace(ENTRY_DELIMITER, "\\♦")
        .replace(COMMENT_END, ESCAPED_COMMENT_END)
}

pub fn unescape(value: &str) -> String {
    value
        .replace(ESCAPED_COMMENT_END, COMMENT_END)
        .replace("\\☛", "☛")
        .replace("\\♦", "♦")
}

/// Decode a comment string into its typed shape.
pub fn decode_comment(text: &str) -> CommentRecord {
    let inner = strip_comment_wrapper(text);
    let id_prefix = format!("id{KEY_DELIMITER}");
    let closing_suffix = format!("{ENTRY_DELIMITER}{ENTRY_DELIMITER}");

    if let Some(rest) = inner.strip_prefix(&id_prefix) {
        if !contains_unescaped(inner, ENTRY_DELIMITER) {
            return CommentRecord::Stub { id: unescape(rest) };
        }
        let escaped_closing = format!("\\{closing_suffix}");
        if inner.ends_with(&closing_suffix) && !inner.ends_with(&escaped_closing) {
            let id_part = split_unescaped(rest, ENTRY_DELIMITER)
                .first()
                .copied()
                .unwrap_or_default();
            return CommentRecord::Closing {
                id: unescape(id_part),
            };
        }
    }

    let mut parts = split_unescaped(inner, ENTRY_DELIMITER);
    let content = parts.pop().map(unescape);
    let mut entry = CommentEntry {
        content,
        ..Default::default()
    };
    for part in parts {
        if part.is_empty() {
            continue;
        }
        match split_once_unescaped(part, KEY_DELIMITER) {
            Some((key, value)) => entry.set_meta(&unescape(key), unescape(value)),
            None => tracing::debug!(part, "comment metadata without value ignored"),
        }
    }
    CommentRecord::Content(entry)
}

/// Parse a comment string into an entry. Stubs and closing markers produce an
/// entry carrying only their `id`.
pub fn parse_comment(text: &str) -> CommentEntry {
    decode_comment(text).into_entry()
}

/// Serialize an entry. With `strip_id` the `id` is left out, for when it is
/// already stored alongside.
pub fn serialize_comment(entry: &CommentEntry, strip_id: bool) -> String {
    let meta: Vec<String> = entry
        .meta_pairs(strip_id)
        .into_iter()
        .map(|(key, value)| format!("{}{KEY_DELIMITER}{}", escape(&key), escape(&value)))
        .collect();

    let mut out = meta.join(&ENTRY_DELIMITER.to_string());
    if !meta.is_empty() {
        out.push(ENTRY_DELIMITER);
    }
    out.push_str(&escape(entry.content.as_deref().unwrap_or_default()));
    out
}

/// Opening stub for a thread id
pub fn serialize_stub(id: &str) -> String {
    format!("id{KEY_DELIMITER}{}", escape(id))
}

/// Closing marker for a thread id
pub fn serialize_closing(id: &str) -> String {
    format!("id{KEY_DELIMITER}{}{ENTRY_DELIMITER}{ENTRY_DELIMITER}", escape(id))
}
