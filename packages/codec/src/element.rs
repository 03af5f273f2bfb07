//! Comment threads in markup
//!
//! Inside the editor a thread is a `comment-` element carrying `data-id` and one
//! `data-content-N` attribute per entry. On disk threads are plain HTML comments:
//!
//! ```text
//! <!--id☛c-0♦name☛Ann♦First-->
//! <!--id☛c-0♦Reply-->
//! ...commented content...
//! <!--id☛c-0♦♦-->
//! ```
//!
//! Threads attached to a single element (no id) are stored in `data-ww-comment-N`
//! attributes in the editor and as HTML comments right before the element on disk.

use crate::attrs::COMMENT_ATTR_PREFIX;
use crate::comment::{
    contains_unescaped, decode_comment, parse_comment, serialize_closing, serialize_comment,
    serialize_stub, CommentEntry, CommentRecord, ENTRY_DELIMITER, KEY_DELIMITER,
};
use quire_dom::{DomNode, Element};
use std::collections::VecDeque;

pub const COMMENT_TAG: &str = "comment-";
pub const COMMENT_ID_ATTR: &str = "data-id";
pub const COMMENT_CONTENT_PREFIX: &str = "data-content-";

/// Build a `comment-` element for a thread. Entries are written without their id,
/// which is carried by `data-id`. Continuation spans of an already rendered thread
/// pass no entries.
pub fn comment_element(id: Option<&str>, entries: &[CommentEntry]) -> Element {
    let mut el = Element::new(COMMENT_TAG);
    if let Some(id) = id {
        el.set_attribute(COMMENT_ID_ATTR, id);
    }
    for (i, entry) in entries.iter().enumerate() {
        el.set_attribute(format!("{COMMENT_CONTENT_PREFIX}{i}"), serialize_comment(entry, true));
    }
    el
}

fn content_attributes(el: &Element) -> Vec<&str> {
    el.attributes
        .iter()
        .filter(|(k, _)| k.starts_with(COMMENT_CONTENT_PREFIX))
        .map(|(_, v)| v.as_str())
        .collect()
}

/// A `comment-` element with nothing but its id continues a thread rendered elsewhere
fn is_span(el: &Element) -> bool {
    el.attribute_names().all(|k| k == COMMENT_ID_ATTR)
}

/// Entries of a `comment-` element, each carrying the element's id.
///
/// With `root`, a bare continuation span looks up the element of the same thread
/// that carries the entries.
pub fn comment_element_data(el: &Element, root: Option<&Element>) -> Vec<CommentEntry> {
    let id = el.get_attribute(COMMENT_ID_ATTR);
    let source = match (root, id) {
        (Some(root), Some(id)) if is_span(el) => root
            .find(&|candidate| {
                candidate.tag == COMMENT_TAG
                    && candidate.get_attribute(COMMENT_ID_ATTR) == Some(id)
                    && !is_span(candidate)
            })
            .unwrap_or(el),
        _ => el,
    };

    content_attributes(source)
        .into_iter()
        .map(|text| {
            let mut entry = parse_comment(text);
            entry.id = source.get_attribute(COMMENT_ID_ATTR).map(str::to_string);
            entry
        })
        .collect()
}

/// Build a `comment-` element from a run of HTML comment texts. The id comes from
/// the first comment; `open` reports whether the run starts a thread that wraps
/// content up to its closing marker.
pub fn comment_element_from_html_comments(comments: &[String]) -> (Element, bool) {
    let id = comments
        .first()
        .and_then(|first| decode_comment(first).id().map(str::to_string));

    let entries: Vec<CommentEntry> = comments
        .iter()
        .filter_map(|text| match decode_comment(text) {
            CommentRecord::Content(entry) => Some(entry),
            CommentRecord::Stub { .. } | CommentRecord::Closing { .. } => None,
        })
        .collect();

    let open = id.is_some();
    (comment_element(id.as_deref(), &entries), open)
}

/// HTML comment markup for a thread element. `comment-` elements produce one
/// comment per entry prefixed with the thread id, other elements produce one per
/// `data-ww-comment-N` attribute.
pub fn serialize_comment_element(el: &Element) -> String {
    serialize_comment_texts(el)
        .iter()
        .map(|text| format!("<!--{text}-->"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn serialize_comment_texts(el: &Element) -> Vec<String> {
    if el.tag != COMMENT_TAG {
        return el
            .attributes
            .iter()
            .filter(|(k, _)| k.starts_with(COMMENT_ATTR_PREFIX))
            .map(|(_, v)| ensure_thread_shape(v))
            .collect();
    }

    let id = el.get_attribute(COMMENT_ID_ATTR);
    content_attributes(el)
        .into_iter()
        .map(|text| match id {
            Some(id) => format!("{}{ENTRY_DELIMITER}{text}", serialize_stub(id)),
            None => ensure_thread_shape(text),
        })
        .collect()
}

/// Entries with no metadata serialize to bare text. A leading delimiter marks them
/// as thread comments on disk without changing what they parse to.
fn ensure_thread_shape(text: &str) -> String {
    if is_thread_comment(text) {
        text.to_string()
    } else {
        format!("{ENTRY_DELIMITER}{text}")
    }
}

/// Whether an HTML comment body is in the thread format, as opposed to an
/// ordinary authored comment.
pub fn is_thread_comment(text: &str) -> bool {
    text.starts_with(&format!("id{KEY_DELIMITER}")) || contains_unescaped(text, ENTRY_DELIMITER)
}

/// Replace thread elements and comment attributes with HTML comments for saving.
pub fn unfold_comment_threads(nodes: Vec<DomNode>) -> Vec<DomNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            DomNode::Element(mut el) if el.tag == COMMENT_TAG => {
                let id = el.get_attribute(COMMENT_ID_ATTR).map(str::to_string);
                let texts = serialize_comment_texts(&el);
                match &id {
                    Some(id) if texts.is_empty() => out.push(DomNode::comment(serialize_stub(id))),
                    _ => out.extend(texts.into_iter().map(DomNode::Comment)),
                }
                out.extend(unfold_comment_threads(std::mem::take(&mut el.children)));
                if let Some(id) = id {
                    out.push(DomNode::comment(serialize_closing(&id)));
                }
            }
            DomNode::Element(mut el) => {
                let texts = serialize_comment_texts(&el);
                out.extend(texts.into_iter().map(DomNode::Comment));
                el.attributes.retain(|(k, _)| !k.starts_with(COMMENT_ATTR_PREFIX));
                el.children = unfold_comment_threads(std::mem::take(&mut el.children));
                out.push(DomNode::Element(el));
            }
            other => out.push(other),
        }
    }
    out
}

/// Turn thread HTML comments back into thread elements and comment attributes.
///
/// A run starting with an id wraps the following siblings up to its closing marker
/// in a `comment-` element (to the end of the sibling list if the marker is
/// missing). A run without an id is attached to the next element sibling.
/// Ordinary comments are left alone.
pub fn fold_comment_threads(nodes: Vec<DomNode>) -> Vec<DomNode> {
    let mut queue: VecDeque<DomNode> = nodes.into();
    fold_siblings(&mut queue, None)
}

fn fold_siblings(queue: &mut VecDeque<DomNode>, closing_id: Option<&str>) -> Vec<DomNode> {
    let mut out: Vec<DomNode> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    while let Some(node) = queue.pop_front() {
        match node {
            DomNode::Comment(text) if is_thread_comment(&text) => match decode_comment(&text) {
                CommentRecord::Closing { id } => {
                    if pending_thread_id(&pending).as_deref() == Some(id.as_str()) {
                        // Thread around nothing
                        flush_pending(&mut pending, &mut out);
                        continue;
                    }
                    if closing_id == Some(id.as_str()) {
                        flush_pending(&mut pending, &mut out);
                        return out;
                    }
                    tracing::warn!(id = %id, "dropping unmatched comment thread closing marker");
                }
                record => match (record.id(), pending_thread_id(&pending)) {
                    // Another id inside an open run starts a nested thread
                    (Some(id), Some(current)) if id != current => {
                        queue.push_front(DomNode::Comment(text));
                        open_thread(queue, &mut pending, &mut out);
                    }
                    (Some(_), None) if !pending.is_empty() => {
                        flush_pending(&mut pending, &mut out);
                        pending.push(text);
                    }
                    _ => pending.push(text),
                },
            },
            DomNode::Text(text) if text.trim().is_empty() && !pending.is_empty() => {
                if pending_thread_id(&pending).is_some() {
                    queue.push_front(DomNode::Text(text));
                    open_thread(queue, &mut pending, &mut out);
                } else {
                    out.push(DomNode::Text(text));
                }
            }
            DomNode::Element(mut el) => {
                if pending_thread_id(&pending).is_some() {
                    queue.push_front(DomNode::Element(el));
                    open_thread(queue, &mut pending, &mut out);
                    continue;
                }
                for (i, text) in pending.drain(..).enumerate() {
                    let entry = parse_comment(&text);
                    el.attributes
                        .push((format!("{COMMENT_ATTR_PREFIX}{i}"), serialize_comment(&entry, true)));
                }
                el.children = fold_comment_threads(std::mem::take(&mut el.children));
                out.push(DomNode::Element(el));
            }
            other => {
                if pending_thread_id(&pending).is_some() {
                    queue.push_front(other);
                    open_thread(queue, &mut pending, &mut out);
                    continue;
                }
                flush_pending(&mut pending, &mut out);
                out.push(other);
            }
        }
    }

    flush_pending(&mut pending, &mut out);
    if let Some(id) = closing_id {
        tracing::warn!(id, "comment thread without closing marker wraps to end of parent");
    }
    out
}

/// Id of the thread a pending run opens, if it opens one
fn pending_thread_id(pending: &[String]) -> Option<String> {
    pending
        .first()
        .and_then(|first| decode_comment(first).id().map(str::to_string))
}

/// Wrap the following siblings into the thread started by `pending`
fn open_thread(
    queue: &mut VecDeque<DomNode>,
    pending: &mut Vec<String>,
    out: &mut Vec<DomNode>,
) {
    let comments = std::mem::take(pending);
    let (mut el, _) = comment_element_from_html_comments(&comments);
    let id = el.get_attribute(COMMENT_ID_ATTR).map(str::to_string);
    el.children = fold_siblings(queue, id.as_deref());
    out.push(DomNode::Element(el));
}

/// A run without a target element stays as plain comments
fn flush_pending(pending: &mut Vec<String>, out: &mut Vec<DomNode>) {
    if pending_thread_id(pending).is_some() {
        let comments = std::mem::take(pending);
        let (el, _) = comment_element_from_html_comments(&comments);
        out.push(DomNode::Element(el));
        return;
    }
    out.extend(pending.drain(..).map(DomNode::Comment));
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_dom::{parse_fragment, to_html, SerializeOptions};

    fn html(nodes: &[DomNode]) -> String {
        to_html(nodes, &SerializeOptions::default())
    }

    #[test]
    fn test_comment_element_strips_ids() {
        let entries = vec![CommentEntry::new("Hello").with_id("c-0")];
        let el = comment_element(Some("c-0"), &entries);
        assert_eq!(el.get_attribute("data-id"), Some("c-0"));
        assert_eq!(el.get_attribute("data-content-0"), Some("Hello"));

        let data = comment_element_data(&el, None);
        assert_eq!(data, entries);
    }

    #[test]
    fn test_span_backtracks_to_thread_element() {
        let thread = comment_element(Some("c-1"), &[CommentEntry::new("note")]);
        let span = comment_element(Some("c-1"), &[]);
        let root = Element::new("body")
            .with_child(Element::new("p").with_child(thread))
            .with_child(Element::new("p").with_child(span.clone()));

        let data = comment_element_data(&span, Some(&root));
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].content.as_deref(), Some("note"));
        assert_eq!(data[0].id.as_deref(), Some("c-1"));

        assert!(comment_element_data(&span, None).is_empty());
    }

    #[test]
    fn test_element_from_html_comments() {
        let comments = vec!["id☛c-2♦name☛Ann♦First".to_string(), "id☛c-2♦Reply".to_string()];
        let (el, open) = comment_element_from_html_comments(&comments);
        assert!(open);
        assert_eq!(el.get_attribute("data-id"), Some("c-2"));
        assert_eq!(el.get_attribute("data-content-0"), Some("name☛Ann♦First"));
        assert_eq!(el.get_attribute("data-content-1"), Some("Reply"));

        assert_eq!(
            serialize_comment_element(&el),
            "<!--id☛c-2♦name☛Ann♦First-->\n<!--id☛c-2♦Reply-->"
        );
    }

    #[test]
    fn test_serialize_attribute_comments() {
        let el = Element::new("img")
            .with_attr("src", "a.png")
            .with_attr("data-ww-comment-0", "name☛Bo♦Alt text?")
            .with_attr("data-ww-comment-1", "Agreed");
        assert_eq!(
            serialize_comment_element(&el),
            "<!--name☛Bo♦Alt text?-->\n<!--♦Agreed-->"
        );
    }

    #[test]
    fn test_unfold_and_fold_thread() {
        let thread = comment_element(Some("c-0"), &[CommentEntry::new("Check this")])
            .with_text("commented");
        let p = Element::new("p").with_text("a ").with_child(thread).with_text(" b");

        let unfolded = unfold_comment_threads(vec![p.clone().into()]);
        assert_eq!(
            html(&unfolded),
            "<p>a <!--id☛c-0♦Check this-->commented<!--id☛c-0♦♦--> b</p>"
        );

        let reparsed = parse_fragment(&html(&unfolded)).unwrap();
        assert_eq!(fold_comment_threads(reparsed), vec![DomNode::Element(p)]);
    }

    #[test]
    fn test_unfold_and_fold_attribute_thread() {
        let img = Element::new("img")
            .with_attr("src", "a.png")
            .with_attr("data-ww-comment-0", "Needs alt");
        let figure = Element::new("figure").with_child(img);

        let unfolded = unfold_comment_threads(vec![figure.clone().into()]);
        assert_eq!(html(&unfolded), r#"<figure><!--♦Needs alt--><img src="a.png"></figure>"#);

        let folded = fold_comment_threads(parse_fragment(&html(&unfolded)).unwrap());
        assert_eq!(folded, vec![DomNode::Element(figure)]);
    }

    #[test]
    fn test_continuation_span_round_trips() {
        let first = comment_element(Some("c-0"), &[CommentEntry::new("x")]).with_text("one");
        let span = comment_element(Some("c-0"), &[]).with_text("two");
        let body = vec![
            DomNode::Element(Element::new("p").with_child(first)),
            DomNode::Element(Element::new("p").with_child(span)),
        ];

        let unfolded = unfold_comment_threads(body.clone());
        assert_eq!(
            html(&unfolded),
            "<p><!--id☛c-0♦x-->one<!--id☛c-0♦♦--></p><p><!--id☛c-0-->two<!--id☛c-0♦♦--></p>"
        );
        assert_eq!(fold_comment_threads(parse_fragment(&html(&unfolded)).unwrap()), body);
    }

    #[test]
    fn test_plain_comments_are_untouched() {
        let nodes = parse_fragment("<!-- authored note --><p>x</p>").unwrap();
        assert_eq!(fold_comment_threads(nodes.clone()), nodes);
    }
}
