//! Structured attributes and their flat markup form

use crate::comment::{parse_comment, serialize_comment, CommentEntry};
use crate::deprecated::{deprecated_style, merge_style};
use quire_dom::Element;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Reserved attribute holding the comment thread attached to a node
pub const COMMENT_ATTR: &str = "=comment";
/// Flat attribute family the comment thread fans out to
pub const COMMENT_ATTR_PREFIX: &str = "data-ww-comment-";
/// Marks internal editor scaffolding
pub const EDITING_ATTR: &str = "data-ww-editing";
/// Nested map of `data-*` attributes
pub const DATA_ATTR: &str = "data";

/// Value of a structured attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Space separated tokens in markup
    List(Vec<String>),
    Map(BTreeMap<String, AttrValue>),
    Comments(Vec<CommentEntry>),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Values that are never written to markup
    pub fn is_absent(&self) -> bool {
        matches!(self, AttrValue::Null | AttrValue::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_comments(&self) -> Option<&[CommentEntry]> {
        match self {
            AttrValue::Comments(comments) => Some(comments),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            AttrValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Flat markup form of the value
    pub fn to_markup(&self) -> String {
        match self {
            AttrValue::Null | AttrValue::Bool(false) => String::new(),
            AttrValue::Bool(true) => String::new(),
            AttrValue::Int(i) => i.to_string(),
            AttrValue::Float(f) => f.to_string(),
            AttrValue::String(s) => s.clone(),
            AttrValue::List(tokens) => tokens.join(" "),
            AttrValue::Map(_) | AttrValue::Comments(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            other => write!(f, "{}", other.to_markup()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<Vec<CommentEntry>> for AttrValue {
    fn from(value: Vec<CommentEntry>) -> Self {
        AttrValue::Comments(value)
    }
}

pub type Attrs = BTreeMap<String, AttrValue>;

/// Build an attribute map from string pairs
pub fn attrs<I, K, V>(pairs: I) -> Attrs
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Declaration of one attribute on a node or mark type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSpec {
    /// `None` makes the attribute required
    pub default: Option<AttrValue>,
    /// Internal bookkeeping, never written to markup
    pub private: bool,
    /// Space separated token list in markup
    pub tokens: bool,
}

impl AttributeSpec {
    /// Optional attribute defaulting to null (omitted when serializing)
    pub fn optional() -> Self {
        Self::with_default(AttrValue::Null)
    }

    pub fn with_default(default: impl Into<AttrValue>) -> Self {
        Self {
            default: Some(default.into()),
            private: false,
            tokens: false,
        }
    }

    pub fn required() -> Self {
        Self {
            default: None,
            private: false,
            tokens: false,
        }
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn tokens(mut self) -> Self {
        self.tokens = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Attribute declarations in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeSpecs {
    entries: Vec<(String, AttributeSpec)>,
}

impl AttributeSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute. A redeclaration replaces the spec in place.
    pub fn insert(&mut self, name: impl Into<String>, spec: AttributeSpec) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = spec,
            None => self.entries.push((name, spec)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Declare optional attributes with null defaults
    pub fn with_optional<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.insert(name, AttributeSpec::optional());
        }
        self
    }

    pub fn extend(&mut self, other: &AttributeSpecs) {
        for (name, spec) in &other.entries {
            self.insert(name.clone(), spec.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSpec)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attribute map with every declared default filled in. Returns the name of
    /// the first required attribute missing from `given`.
    pub fn compute(&self, given: &Attrs) -> Result<Attrs, String> {
        let mut out = Attrs::new();
        for (name, spec) in &self.entries {
            match given.get(name) {
                Some(value) => {
                    out.insert(name.clone(), value.clone());
                }
                None => match &spec.default {
                    Some(default) => {
                        out.insert(name.clone(), default.clone());
                    }
                    None => return Err(name.clone()),
                },
            }
        }
        Ok(out)
    }
}

/// Flatten structured attributes into markup attributes.
///
/// An attribute is written only when it is not null or `false`, differs from its
/// declared default and is not private. `data` fans out to its `data-*` entries,
/// the comment thread fans out to `data-ww-comment-N` (ids stripped). Declared
/// attributes come first, in declaration order.
pub fn to_attributes(
    attrs: &Attrs,
    specs: Option<&AttributeSpecs>,
    extra: Option<&Attrs>,
) -> Vec<(String, String)> {
    let mut merged = attrs.clone();
    if let Some(extra) = extra {
        for (k, v) in extra {
            merged.insert(k.clone(), v.clone());
        }
    }

    let mut order: Vec<&str> = Vec::new();
    if let Some(specs) = specs {
        order.extend(specs.iter().map(|(k, _)| k).filter(|k| merged.contains_key(*k)));
    }
    for key in merged.keys() {
        if !order.contains(&key.as_str()) {
            order.push(key);
        }
    }

    let mut out: Vec<(String, String)> = Vec::new();
    for key in order {
        let Some(value) = merged.get(key) else {
            continue;
        };
        let spec = specs.and_then(|s| s.get(key));

        if key == COMMENT_ATTR {
            if let AttrValue::Comments(comments) = value {
                for (i, comment) in comments.iter().enumerate() {
                    out.push((format!("{COMMENT_ATTR_PREFIX}{i}"), serialize_comment(comment, true)));
                }
            }
        } else if key == DATA_ATTR {
            if let AttrValue::Map(entries) = value {
                for (data_key, data_value) in entries {
                    if !data_value.is_absent() {
                        out.push((data_key.clone(), data_value.to_markup()));
                    }
                }
            }
        } else {
            if value.is_absent() {
                continue;
            }
            if let Some(spec) = spec {
                if spec.private || spec.default.as_ref() == Some(value) {
                    continue;
                }
            }
            out.push((key.to_string(), value.to_markup()));
        }
    }
    out
}

/// Read structured attributes from an element. Returns `None` for internal
/// bundle scaffolding (`data-ww-editing="bundle"`), which is never document content.
pub fn get_attrs(element: &Element, include_deprecated: bool) -> Option<Attrs> {
    get_attrs_with(element, None, include_deprecated)
}

/// [`get_attrs`] with attribute declarations, which split token list attributes.
pub fn get_attrs_with(
    element: &Element,
    specs: Option<&AttributeSpecs>,
    include_deprecated: bool,
) -> Option<Attrs> {
    if element.get_attribute(EDITING_ATTR) == Some("bundle") {
        return None;
    }

    let mut out = Attrs::new();
    let mut comments: BTreeMap<usize, CommentEntry> = BTreeMap::new();
    let mut data: BTreeMap<String, AttrValue> = BTreeMap::new();
    let mut declarations: Vec<(String, String)> = Vec::new();

    for (key, value) in &element.attributes {
        if let Some(index) = key.strip_prefix(COMMENT_ATTR_PREFIX) {
            let index = index.parse::<usize>().unwrap_or(comments.len());
            comments.insert(index, parse_comment(value));
        } else if key.starts_with("data-") && key != EDITING_ATTR {
            data.insert(key.clone(), AttrValue::String(value.clone()));
        } else if include_deprecated {
            match deprecated_style(key, value) {
                Some(mut decls) => declarations.append(&mut decls),
                None => {
                    out.insert(key.clone(), read_value(key, value, specs));
                }
            }
        } else {
            out.insert(key.clone(), read_value(key, value, specs));
        }
    }

    if !declarations.is_empty() {
        let existing = out.get("style").and_then(AttrValue::as_str).unwrap_or_default();
        out.insert("style".to_string(), AttrValue::String(merge_style(existing, &declarations)));
    }
    if !data.is_empty() {
        out.insert(DATA_ATTR.to_string(), AttrValue::Map(data));
    }
    if !comments.is_empty() {
        out.insert(COMMENT_ATTR.to_string(), AttrValue::Comments(comments.into_values().collect()));
    }
    Some(out)
}

fn read_value(key: &str, value: &str, specs: Option<&AttributeSpecs>) -> AttrValue {
    let tokens = specs.and_then(|s| s.get(key)).map(|s| s.tokens).unwrap_or(false);
    if tokens {
        AttrValue::List(value.split_whitespace().map(str::to_string).collect())
    } else {
        AttrValue::String(value.to_string())
    }
}
