//! # Quire Codec
//!
//! Pure functions converting between structured document data and its flat markup
//! representation:
//!
//! - **comment**: the `key☛value♦…♦content` comment annotation micro-format
//! - **element**: comment threads as `comment-` elements, attributes and HTML comments
//! - **attrs**: structured attribute maps to and from markup attributes
//! - **deprecated**: legacy presentation attributes upgraded to inline style

pub mod attrs;
pub mod comment;
pub mod deprecated;
pub mod element;

pub use attrs::{
    attrs, get_attrs, get_attrs_with, to_attributes, AttrValue, AttributeSpec, AttributeSpecs,
    Attrs, COMMENT_ATTR, COMMENT_ATTR_PREFIX, DATA_ATTR, EDITING_ATTR,
};
pub use comment::{
    decode_comment, parse_comment, serialize_comment, CommentEntry, CommentPosition,
    CommentRecord,
};
pub use deprecated::{deprecated_style, merge_style};
pub use element::{
    comment_element, comment_element_data, comment_element_from_html_comments,
    fold_comment_threads, serialize_comment_element, unfold_comment_threads, COMMENT_TAG,
};
