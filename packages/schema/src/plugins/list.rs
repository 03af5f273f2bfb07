//! Ordered, unordered and description lists
//!
//! Items move between nesting levels with Tab and Shift-Tab. Enter splits an
//! item, and on an empty item lifts it out of the list.

use super::element;
use crate::commands::Command;
use crate::keymap::Keymap;
use crate::plugin::SchemaPlugin;
use quire_codec::Attrs;
use quire_model::{EditorState, Fragment, NodeSpec, ResolvedPos, Schema, Selection, Transaction};

const ITEM: &str = "li";

/// The selection's position and the depth of the closest list item around it.
/// The whole selection must lie inside that item.
fn list_item_at(state: &EditorState) -> Option<(ResolvedPos, usize)> {
    if !matches!(state.selection(), Selection::Text { .. }) {
        return None;
    }
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rp = doc.resolve(from).ok()?;
    let (depth, _) = rp.find_ancestor(|node| node.type_name() == ITEM)?;
    if depth < 2 || to > rp.end(depth) {
        return None;
    }
    Some((rp, depth))
}

/// Move a text selection along with content that moved from `old` to `new`
fn shift_selection(selection: &Selection, old: usize, new: usize) -> Selection {
    let moved = |pos: usize| (pos + new).saturating_sub(old);
    match selection {
        Selection::Text { anchor, head } => Selection::text(moved(*anchor), moved(*head)),
        _ => Selection::cursor(new + 1),
    }
}

/// Enter inside a list item. An empty block lifts the item out of its list,
/// the end of the item's last block starts a new item, anywhere else the
/// item is split at the cursor.
pub fn split_list_item(state: &EditorState) -> Option<Transaction> {
    let (rp, depth) = list_item_at(state)?;
    let block = rp.parent();
    if rp.depth() != depth + 1 || !block.is_textblock() {
        return None;
    }
    let (from, to) = state.selection().range(state.doc());
    if from == to && block.content_size() == 0 {
        return lift_list_item(state);
    }

    let item_before = rp.before(depth);
    let item_after = rp.after(depth);
    let last_block = rp.index(depth) + 1 == rp.node(depth).child_count();
    let mut tr = state.tr();

    if from == to && last_block && rp.parent_offset == block.content_size() {
        let fresh = tr.schema().create_and_fill(ITEM, Attrs::new(), Vec::new()).ok()?;
        tr.insert(item_after, vec![fresh]).ok()?;
        tr.set_selection(Selection::cursor(item_after + 2));
        return Some(tr);
    }

    if from < to {
        tr.delete_range(from, to).ok()?;
    }
    let item = tr.doc().resolve(from).ok()?.node(depth).clone();
    let offset = from - (item_before + 1);
    let left = item.cut(0, offset);
    let right = item.cut(offset, item.content_size());
    let cursor = item_before + left.node_size() + 2;
    tr.replace(item_before, item_before + item.node_size(), vec![left, right])
        .ok()?;
    tr.set_selection(Selection::cursor(cursor));
    Some(tr)
}

/// Nest the item into the item before it, appending to that item's sublist
/// when it ends with one
pub fn sink_list_item(state: &EditorState) -> Option<Transaction> {
    let (rp, depth) = list_item_at(state)?;
    let list = rp.node(depth - 1);
    let index = rp.index(depth - 1);
    if index == 0 {
        return None;
    }
    let prev = list.child(index - 1)?;
    if prev.type_name() != ITEM {
        return None;
    }
    let item = rp.node(depth).clone();
    let item_before = rp.before(depth);
    let prev_before = item_before - prev.node_size();

    let nested = prev
        .last_child()
        .filter(|last| last.type_name() == list.type_name());
    let (grown, new_item_before) = match nested {
        Some(nested) => {
            let sublist = nested.copy(nested.content().append(&Fragment::from_node(item)));
            (
                prev.replace_child(prev.child_count() - 1, sublist),
                prev_before + prev.node_size() - 2,
            )
        }
        None => {
            let sublist = state
                .schema()
                .node(list.type_name(), Attrs::new(), vec![item], Vec::new())
                .ok()?;
            (
                prev.copy(prev.content().append(&Fragment::from_node(sublist))),
                prev_before + prev.node_size(),
            )
        }
    };

    let mut tr = state.tr();
    tr.replace(prev_before, rp.after(depth), vec![grown]).ok()?;
    tr.set_selection(shift_selection(state.selection(), item_before, new_item_before));
    Some(tr)
}

/// Move a nested item out to the level of the item holding its list. Items
/// after it come along as its own sublist.
pub fn lift_list_item_in_list(state: &EditorState) -> Option<Transaction> {
    let (rp, depth) = list_item_at(state)?;
    if depth < 3 || rp.node(depth - 2).type_name() != ITEM {
        return None;
    }
    let item = rp.node(depth);
    let list = rp.node(depth - 1);
    let outer = rp.node(depth - 2);
    let index = rp.index(depth - 1);

    let items = list.content();
    let before = items.cut(0, items.offset_of(index));
    let after = items.cut_from(items.offset_of(index + 1));

    let lifted = if after.is_empty() {
        item.clone()
    } else {
        item.copy(item.content().append(&Fragment::from_node(list.copy(after))))
    };
    let list_index = rp.index(depth - 2);
    let remaining = if before.is_empty() {
        outer.content().remove(list_index)
    } else {
        outer.content().replace_child(list_index, list.copy(before))
    };
    let outer_new = outer.copy(remaining);

    let outer_before = rp.before(depth - 2);
    let new_item_before = outer_before + outer_new.node_size();
    let mut tr = state.tr();
    tr.replace(outer_before, rp.after(depth - 2), vec![outer_new, lifted])
        .ok()?;
    tr.set_selection(shift_selection(state.selection(), rp.before(depth), new_item_before));
    Some(tr)
}

/// Lift the item one level. Nested items move to the outer list, top level
/// items are unwrapped into the list's parent, splitting the list around them.
pub fn lift_list_item(state: &EditorState) -> Option<Transaction> {
    let (rp, depth) = list_item_at(state)?;
    if depth >= 3 && rp.node(depth - 2).type_name() == ITEM {
        return lift_list_item_in_list(state);
    }
    let item = rp.node(depth);
    let list = rp.node(depth - 1);
    let index = rp.index(depth - 1);

    let items = list.content();
    let before = items.cut(0, items.offset_of(index));
    let after = items.cut_from(items.offset_of(index + 1));

    let list_before = rp.before(depth - 1);
    let mut content_start = list_before;
    let mut replacement = Vec::new();
    if !before.is_empty() {
        let head = list.copy(before);
        content_start += head.node_size();
        replacement.push(head);
    }
    replacement.extend(item.content().iter().cloned());
    if !after.is_empty() {
        replacement.push(list.copy(after));
    }

    let mut tr = state.tr();
    tr.replace(list_before, rp.after(depth - 1), replacement).ok()?;
    tr.set_selection(shift_selection(state.selection(), rp.before(depth) + 1, content_start));
    Some(tr)
}

/// `ol`, `ul`, `menu`, `li`, `dl`, `dt` and `dd`
pub struct ListPlugin;

impl SchemaPlugin for ListPlugin {
    fn name(&self) -> &str {
        "list"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            element("ol", NodeSpec::new().group("flow palpable containerblock").content("li+")),
            element("ul", NodeSpec::new().group("flow palpable containerinline").content("li+")),
            element("menu", NodeSpec::new().group("flow palpable containerinline").content("li+")),
            element("li", NodeSpec::new().group("containerblock").content("(p | flow)+")),
            element("dl", NodeSpec::new().group("flow").content("(dt+ dd+)* | div+")),
            element("dt", NodeSpec::new().content("flow*")),
            element("dd", NodeSpec::new().content("flow*")),
        ]
    }

    fn keymap(&self, _schema: &Schema) -> Keymap {
        Keymap::new()
            .bind("Enter", Command::new(split_list_item))
            .bind("Tab", Command::new(sink_list_item))
            .bind("Shift-Tab", Command::new(lift_list_item_in_list))
    }

    fn commands(&self) -> Vec<(String, Command)> {
        vec![
            ("splitListItem".to_string(), Command::new(split_list_item)),
            ("sinkListItem".to_string(), Command::new(sink_list_item)),
            ("liftListItem".to_string(), Command::new(lift_list_item)),
            ("liftListItemInList".to_string(), Command::new(lift_list_item_in_list)),
        ]
    }
}
