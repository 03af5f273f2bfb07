//! # Comment Threads
//!
//! A thread is either a `_comment` mark spanning inline content, identified
//! by its `id` attribute, or the reserved comment attribute of a node,
//! identified by the node's position.

use crate::errors::{EditorError, EditorResult};
use crate::options::CommentAuthor;
use quire_codec::{AttrValue, CommentEntry, COMMENT_ATTR};
use quire_model::{EditorState, Mark, Node, Selection, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;

pub const COMMENT_MARK: &str = "_comment";

const ID_PREFIX: &str = "c-";

/// Where a thread lives in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentTarget {
    Thread(String),
    Node(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommentAnchor {
    /// Inline range covered by a `_comment` mark
    Range { from: usize, to: usize },
    Node { pos: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub anchor: CommentAnchor,
    pub entries: Vec<CommentEntry>,
}

fn node_comments(node: &Node) -> Option<&[CommentEntry]> {
    node.attr(COMMENT_ATTR)
        .and_then(AttrValue::as_comments)
        .filter(|entries| !entries.is_empty())
}

fn mark_comments(mark: &Mark) -> &[CommentEntry] {
    mark.attr("content").and_then(AttrValue::as_comments).unwrap_or_default()
}

fn mark_id(mark: &Mark) -> Option<&str> {
    mark.attr("id").and_then(AttrValue::as_str)
}

/// Every thread in document order. Mark threads sharing an id are reported
/// once, spanning from their first to their last covered position.
pub fn comment_threads(state: &EditorState) -> Vec<CommentThread> {
    let mut threads: Vec<CommentThread> = Vec::new();
    let mut by_id: BTreeMap<String, usize> = BTreeMap::new();
    state.doc().descendants(&mut |node, pos, _, _| {
        if let Some(entries) = node_comments(node) {
            threads.push(CommentThread {
                id: None,
                anchor: CommentAnchor::Node { pos },
                entries: entries.to_vec(),
            });
        }
        let end = pos + node.node_size();
        for mark in node.marks().iter().filter(|m| m.type_name() == COMMENT_MARK) {
            let key = match mark_id(mark) {
                Some(id) => id.to_string(),
                None => format!("#{}", mark.identity()),
            };
            match by_id.get(&key) {
                Some(&index) => {
                    if let CommentAnchor::Range { to, .. } = &mut threads[index].anchor {
                        *to = end;
                    }
                }
                None => {
                    by_id.insert(key, threads.len());
                    threads.push(CommentThread {
                        id: mark_id(mark).map(str::to_string),
                        anchor: CommentAnchor::Range { from: pos, to: end },
                        entries: mark_comments(mark).to_vec(),
                    });
                }
            }
        }
        true
    });
    threads
}

/// Next free thread id: one past the highest `c-N` in the document
pub fn next_comment_id(state: &EditorState) -> String {
    let highest = comment_threads(state)
        .iter()
        .filter_map(|t| t.id.as_deref()?.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
        .max();
    format!("{ID_PREFIX}{}", highest.map(|n| n + 1).unwrap_or(0))
}

/// Whether the selection can take a new thread: a non-empty text range over
/// content allowing the comment mark, or a selected node with the comment
/// attribute.
pub fn can_add_comment_thread(state: &EditorState) -> bool {
    let doc = state.doc();
    match state.selection() {
        Selection::Node { pos } => doc
            .node_at(*pos)
            .map(|node| node.node_type().spec().attrs.contains(COMMENT_ATTR))
            .unwrap_or(false),
        selection => {
            let (from, to) = selection.range(doc);
            if from == to {
                return false;
            }
            let mut allowed = false;
            doc.nodes_between(from, to, &mut |node, _, parent, _| {
                if node.is_inline() {
                    allowed |= parent
                        .map(|p| p.node_type().allows_mark_type(COMMENT_MARK))
                        .unwrap_or(false);
                    return false;
                }
                !allowed
            });
            allowed
        }
    }
}

fn new_entry(content: &str, author: &CommentAuthor) -> CommentEntry {
    CommentEntry::new(content)
        .with_author(author.name.clone(), author.email.clone())
        .with_changed(chrono::Utc::now().timestamp_millis())
}

/// Start a thread on the selection. A selected node gets the entry appended
/// to its own thread.
pub fn add_comment(state: &EditorState, content: &str, author: &CommentAuthor) -> EditorResult<Transaction> {
    if !can_add_comment_thread(state) {
        return Err(EditorError::NotCommentable);
    }
    let doc = state.doc();
    let entry = new_entry(content, author);
    let mut tr = state.tr();
    match state.selection() {
        Selection::Node { pos } => {
            let mut entries = doc
                .node_at(*pos)
                .as_ref()
                .and_then(node_comments)
                .map(<[CommentEntry]>::to_vec)
                .unwrap_or_default();
            entries.push(entry);
            tr.set_node_attribute(*pos, COMMENT_ATTR, AttrValue::Comments(entries))?;
        }
        selection => {
            let (from, to) = selection.range(doc);
            let id = next_comment_id(state);
            let mut attrs = quire_codec::Attrs::new();
            attrs.insert("id".to_string(), AttrValue::from(id.as_str()));
            attrs.insert("content".to_string(), AttrValue::Comments(vec![entry]));
            let mark = state.schema().mark(COMMENT_MARK, attrs)?;
            tr.add_mark(from, to, mark)?;
            tracing::debug!(%id, from, to, "comment thread added");
        }
    }
    Ok(tr)
}

/// Rewrite the entries of a thread with `edit`. An emptied thread is
/// removed.
fn edit_thread(
    state: &EditorState,
    target: &CommentTarget,
    edit: impl FnOnce(&mut Vec<CommentEntry>) -> EditorResult<()>,
) -> EditorResult<Transaction> {
    let doc = state.doc();
    let mut tr = state.tr();
    match target {
        CommentTarget::Node(pos) => {
            let node = doc.node_at(*pos).ok_or(EditorError::NoCommentAt(*pos))?;
            let mut entries = node_comments(&node)
                .map(<[CommentEntry]>::to_vec)
                .ok_or(EditorError::NoCommentAt(*pos))?;
            edit(&mut entries)?;
            let value = if entries.is_empty() {
                AttrValue::Null
            } else {
                AttrValue::Comments(entries)
            };
            tr.set_node_attribute(*pos, COMMENT_ATTR, value)?;
        }
        CommentTarget::Thread(id) => {
            let mut ranges: Vec<(usize, usize, Mark)> = Vec::new();
            doc.descendants(&mut |node, pos, _, _| {
                let end = pos + node.node_size();
                for mark in node.marks() {
                    if mark.type_name() == COMMENT_MARK && mark_id(mark) == Some(id.as_str()) {
                        ranges.push((pos, end, mark.clone()));
                    }
                }
                true
            });
            let first = ranges
                .first()
                .map(|(_, _, mark)| mark.clone())
                .ok_or_else(|| EditorError::UnknownThread(id.clone()))?;
            let mut entries = mark_comments(&first).to_vec();
            edit(&mut entries)?;

            let replacement = (!entries.is_empty()).then(|| {
                let mut attrs = first.attrs().clone();
                attrs.insert("content".to_string(), AttrValue::Comments(entries));
                first.with_attrs(attrs)
            });
            for (from, to, mark) in &ranges {
                tr.remove_mark(*from, *to, mark)?;
                if let Some(replacement) = &replacement {
                    tr.add_mark(*from, *to, replacement.clone())?;
                }
            }
        }
    }
    Ok(tr)
}

fn check_index(entries: &[CommentEntry], index: usize) -> EditorResult<()> {
    if index < entries.len() {
        Ok(())
    } else {
        Err(EditorError::CommentIndex {
            index,
            len: entries.len(),
        })
    }
}

/// Replace the text of entry `index`, stamping it with the current time
pub fn update_comment(
    state: &EditorState,
    target: &CommentTarget,
    index: usize,
    content: &str,
) -> EditorResult<Transaction> {
    edit_thread(state, target, |entries| {
        check_index(entries, index)?;
        let entry = &mut entries[index];
        entry.content = Some(content.to_string());
        entry.changed = Some(chrono::Utc::now().timestamp_millis());
        Ok(())
    })
}

/// Remove entry `index`. Removing the last entry removes the thread.
pub fn delete_comment(state: &EditorState, target: &CommentTarget, index: usize) -> EditorResult<Transaction> {
    edit_thread(state, target, |entries| {
        check_index(entries, index)?;
        entries.remove(index);
        Ok(())
    })
}

/// Append a reply to an existing thread
pub fn reply_comment(
    state: &EditorState,
    target: &CommentTarget,
    content: &str,
    author: &CommentAuthor,
) -> EditorResult<Transaction> {
    let entry = new_entry(content, author);
    edit_thread(state, target, move |entries| {
        entries.push(entry);
        Ok(())
    })
}
