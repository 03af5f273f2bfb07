//! Editing commands
//!
//! A command looks at an editor state and either returns the transaction it
//! would apply or `None` when it does not apply. Commands never mutate the
//! state they are given, so a caller can ask whether a command applies by
//! running it and dropping the result.

use quire_codec::Attrs;
use quire_model::{EditorState, Node, Selection, Transaction};
use std::fmt;
use std::sync::Arc;

pub type CommandFn = dyn Fn(&EditorState) -> Option<Transaction> + Send + Sync;

/// A shareable editing command
#[derive(Clone)]
pub struct Command(Arc<CommandFn>);

impl Command {
    pub fn new(f: impl Fn(&EditorState) -> Option<Transaction> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn run(&self, state: &EditorState) -> Option<Transaction> {
        (self.0)(state)
    }

    /// Whether the command applies to `state`
    pub fn can_run(&self, state: &EditorState) -> bool {
        self.run(state).is_some()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Command")
    }
}

/// Try each command in order, stopping at the first that applies
pub fn chain_commands(commands: Vec<Command>) -> Command {
    Command::new(move |state| commands.iter().find_map(|command| command.run(state)))
}

pub fn select_all(state: &EditorState) -> Option<Transaction> {
    let mut tr = state.tr();
    tr.set_selection(Selection::All);
    Some(tr)
}

/// Select the node around the selection. Does nothing directly inside the root.
pub fn select_parent_node(state: &EditorState) -> Option<Transaction> {
    let doc = state.doc();
    let rp = doc.resolve(state.selection().from(doc)).ok()?;
    if rp.depth() == 0 {
        return None;
    }
    let mut tr = state.tr();
    tr.set_selection(Selection::node(rp.before(rp.depth())));
    Some(tr)
}

/// From a selected node, select its first child, or put the cursor inside it
/// when it is a textblock
pub fn select_first_child_node(state: &EditorState) -> Option<Transaction> {
    let Selection::Node { pos } = state.selection() else {
        return None;
    };
    let node = state.doc().node_at(*pos)?;
    let selection = if node.is_textblock() {
        Selection::cursor(pos + 1)
    } else {
        let first = node.first_child()?;
        if first.is_text() {
            return None;
        }
        Selection::node(pos + 1)
    };
    let mut tr = state.tr();
    tr.set_selection(selection);
    Some(tr)
}

pub fn delete_selection(state: &EditorState) -> Option<Transaction> {
    let selection = state.selection();
    if selection.is_empty() {
        return None;
    }
    let doc = state.doc();
    let mut tr = state.tr();
    match selection {
        Selection::All => {
            let schema = state.schema();
            let filled = schema
                .create_and_fill(schema.top_node_name(), doc.attrs().clone(), Vec::new())
                .ok()?;
            tr.replace(0, doc.content_size(), filled.content().to_vec()).ok()?;
            let selection = Selection::at_start(tr.doc());
            tr.set_selection(selection);
        }
        Selection::Node { pos } => {
            let node = doc.node_at(*pos)?;
            tr.delete(*pos, pos + node.node_size()).ok()?;
        }
        Selection::Text { .. } => {
            let (from, to) = selection.range(doc);
            tr.delete_range(from, to).ok()?;
            tr.set_selection(Selection::cursor(from));
        }
    }
    Some(tr)
}

/// Replace the selection with `node` and put the cursor after it
pub fn replace_selection_with(state: &EditorState, node: Node) -> Option<Transaction> {
    let (from, to) = state.selection().range(state.doc());
    let size = node.node_size();
    let mut tr = state.tr();
    if from < to {
        tr.delete_range(from, to).ok()?;
    }
    tr.insert(from, vec![node]).ok()?;
    tr.set_selection(Selection::cursor(from + size));
    Some(tr)
}

fn insert_leaf(state: &EditorState, type_name: &str) -> Option<Transaction> {
    let node = state
        .schema()
        .node(type_name, Attrs::new(), Vec::new(), Vec::new())
        .ok()?;
    replace_selection_with(state, node)
}

/// Insert a line break (`br`)
pub fn insert_break(state: &EditorState) -> Option<Transaction> {
    insert_leaf(state, "br")
}

/// Insert a word break opportunity (`wbr`)
pub fn insert_word_break(state: &EditorState) -> Option<Transaction> {
    insert_leaf(state, "wbr")
}

/// Insert a newline character inside code blocks
pub fn new_line_in_code(state: &EditorState) -> Option<Transaction> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rp = doc.resolve(from).ok()?;
    if !rp.parent().node_type().spec().code || !matches!(state.selection(), Selection::Text { .. }) {
        return None;
    }
    let mut tr = state.tr();
    if from < to {
        tr.delete_range(from, to).ok()?;
    }
    tr.insert_text(from, "\n").ok()?;
    tr.set_selection(Selection::cursor(from + 1));
    Some(tr)
}

/// Split the textblock around the cursor in two. At the end of a block the
/// new block uses the default textblock type when the parent accepts it.
pub fn split_block(state: &EditorState) -> Option<Transaction> {
    split_textblock(state, None)
}

/// Split the textblock around the cursor, turning the part after the cursor
/// into a `type_after` node
pub fn split_block_as(type_after: impl Into<String>) -> Command {
    let type_after = type_after.into();
    Command::new(move |state| split_textblock(state, Some(&type_after)))
}

fn split_textblock(state: &EditorState, type_after: Option<&str>) -> Option<Transaction> {
    let doc = state.doc();
    if !matches!(state.selection(), Selection::Text { .. }) {
        return None;
    }
    let (from, to) = state.selection().range(doc);
    let mut tr = state.tr();
    if from < to {
        tr.delete_range(from, to).ok()?;
    }
    let rp = tr.doc().resolve(from).ok()?;
    let depth = rp.depth();
    let parent = rp.parent().clone();
    if depth == 0 || !parent.is_textblock() || parent.node_type().spec().isolating {
        return None;
    }

    let offset = rp.parent_offset;
    let left = parent.cut(0, offset);
    let right = parent.cut(offset, parent.content_size());
    let start = rp.before(depth);
    let end = rp.after(depth);
    let schema = tr.schema().clone();

    let mut candidates = Vec::new();
    match type_after {
        Some(name) => {
            candidates.push(schema.node(name, Attrs::new(), right.content().to_vec(), Vec::new()).ok()?);
        }
        None => {
            if offset == parent.content_size() {
                if let Some(default) = schema.default_textblock() {
                    if default.name() != parent.type_name() {
                        if let Ok(node) = schema.node(default.name(), Attrs::new(), Vec::new(), Vec::new()) {
                            candidates.push(node);
                        }
                    }
                }
            }
            candidates.push(right);
        }
    }

    let cursor = start + left.node_size() + 1;
    for right in candidates {
        if tr.replace(start, end, vec![left.clone(), right]).is_ok() {
            tr.set_selection(Selection::cursor(cursor));
            return Some(tr);
        }
    }
    None
}

/// Insert an empty default textblock at `end` with the cursor inside it
fn insert_textblock_after(state: &EditorState, end: usize) -> Option<Transaction> {
    let schema = state.schema();
    let block = schema.default_textblock()?;
    let node = schema.node(block.name(), Attrs::new(), Vec::new(), Vec::new()).ok()?;
    let mut tr = state.tr();
    tr.insert(end, vec![node]).ok()?;
    tr.set_selection(Selection::cursor(end + 1));
    Some(tr)
}

/// With a block node selected, add an empty paragraph after it
pub fn create_paragraph_near(state: &EditorState) -> Option<Transaction> {
    let Selection::Node { pos } = state.selection() else {
        return None;
    };
    let node = state.doc().node_at(*pos)?;
    if node.is_inline() || node.is_textblock() {
        return None;
    }
    insert_textblock_after(state, pos + node.node_size())
}

/// Leave a code block: add an empty paragraph after it
pub fn exit_code(state: &EditorState) -> Option<Transaction> {
    let pos = state.selection().cursor_pos()?;
    let rp = state.doc().resolve(pos).ok()?;
    if rp.depth() == 0 || !rp.parent().node_type().spec().code {
        return None;
    }
    insert_textblock_after(state, rp.after(rp.depth()))
}

/// At the start of a textblock, join it with the textblock before it
pub fn join_backward(state: &EditorState) -> Option<Transaction> {
    let pos = state.selection().cursor_pos()?;
    let rp = state.doc().resolve(pos).ok()?;
    let depth = rp.depth();
    if depth == 0 || rp.parent_offset != 0 || !rp.parent().is_textblock() {
        return None;
    }
    let index = rp.index(depth - 1);
    if index == 0 {
        return None;
    }
    let before = rp.node(depth - 1).child(index - 1)?;
    if !before.is_textblock() {
        return None;
    }
    let mut tr = state.tr();
    tr.delete_range(pos - 2, pos).ok()?;
    tr.set_selection(Selection::cursor(pos - 2));
    Some(tr)
}

/// At the end of a textblock, join the textblock after it into it
pub fn join_forward(state: &EditorState) -> Option<Transaction> {
    let pos = state.selection().cursor_pos()?;
    let rp = state.doc().resolve(pos).ok()?;
    let depth = rp.depth();
    if depth == 0 || rp.parent_offset != rp.parent().content_size() || !rp.parent().is_textblock() {
        return None;
    }
    let after = rp.node(depth - 1).child(rp.index(depth - 1) + 1)?;
    if !after.is_textblock() {
        return None;
    }
    let mut tr = state.tr();
    tr.delete_range(pos, pos + 2).ok()?;
    tr.set_selection(Selection::cursor(pos));
    Some(tr)
}

/// At the start of a textblock, select the node before it
pub fn select_node_backward(state: &EditorState) -> Option<Transaction> {
    let pos = state.selection().cursor_pos()?;
    let rp = state.doc().resolve(pos).ok()?;
    let depth = rp.depth();
    if depth == 0 || rp.parent_offset != 0 {
        return None;
    }
    let index = rp.index(depth - 1);
    if index == 0 {
        return None;
    }
    let before = rp.node(depth - 1).child(index - 1)?;
    if before.is_textblock() || !before.node_type().spec().selectable {
        return None;
    }
    let mut tr = state.tr();
    tr.set_selection(Selection::node(rp.before(depth) - before.node_size()));
    Some(tr)
}

/// At the end of a textblock, select the node after it
pub fn select_node_forward(state: &EditorState) -> Option<Transaction> {
    let pos = state.selection().cursor_pos()?;
    let rp = state.doc().resolve(pos).ok()?;
    let depth = rp.depth();
    if depth == 0 || rp.parent_offset != rp.parent().content_size() {
        return None;
    }
    let after = rp.node(depth - 1).child(rp.index(depth - 1) + 1)?;
    if after.is_textblock() || !after.node_type().spec().selectable {
        return None;
    }
    let mut tr = state.tr();
    tr.set_selection(Selection::node(rp.after(depth)));
    Some(tr)
}

/// Add a mark over the selection, or remove it when an equal mark is already
/// active there. An active mark of the same type with other attributes is
/// replaced.
pub fn toggle_mark(type_name: impl Into<String>, attrs: Attrs) -> Command {
    let type_name = type_name.into();
    Command::new(move |state| {
        let doc = state.doc();
        let (from, to) = state.selection().range(doc);
        if from == to {
            return None;
        }
        let mark = state.schema().mark(&type_name, attrs.clone()).ok()?;

        let mut active = None;
        doc.nodes_between(from, to, &mut |node, _, _, _| {
            if active.is_none() {
                active = node.marks().iter().find(|m| m.type_name() == type_name).cloned();
            }
            active.is_none()
        });

        let mut tr = state.tr();
        match active {
            Some(existing) if existing == mark => {
                tr.remove_mark_type(from, to, &type_name).ok()?;
            }
            Some(_) => {
                tr.remove_mark_type(from, to, &type_name).ok()?;
                tr.add_mark(from, to, mark).ok()?;
            }
            None => {
                tr.add_mark(from, to, mark).ok()?;
            }
        }
        tr.doc_changed().then_some(tr)
    })
}

/// Merge `attrs` into the attributes of the root node
pub fn set_doc_attributes(attrs: Attrs) -> Command {
    Command::new(move |state| {
        let mut merged = state.doc().attrs().clone();
        merged.extend(attrs.clone());
        let mut tr = state.tr();
        tr.set_doc_attrs(merged).ok()?;
        Some(tr)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::{attrs, AttributeSpec};
    use quire_model::{MarkSpec, NodeSpec, Schema, SchemaSpec};

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(SchemaSpec {
                nodes: vec![
                    (
                        "doc".to_string(),
                        NodeSpec::new().content("block+").attr("lang", AttributeSpec::optional()),
                    ),
                    ("p".to_string(), NodeSpec::new().content("inline*").group("block")),
                    ("h1".to_string(), NodeSpec::new().content("inline*").group("block")),
                    ("hr".to_string(), NodeSpec::new().group("block")),
                    ("br".to_string(), NodeSpec::new().inline().group("inline")),
                    ("text".to_string(), NodeSpec::new().group("inline")),
                ],
                marks: vec![
                    ("em".to_string(), MarkSpec::new()),
                    ("a".to_string(), MarkSpec::new().attr("href", AttributeSpec::optional())),
                ],
                top_node: None,
            })
            .unwrap(),
        )
    }

    fn block(schema: &Schema, type_name: &str, text: &str) -> Node {
        let content = if text.is_empty() {
            vec![]
        } else {
            vec![schema.text(text, vec![]).unwrap()]
        };
        schema.node(type_name, Attrs::new(), content, vec![]).unwrap()
    }

    fn state(blocks: Vec<Node>, selection: Selection) -> EditorState {
        let schema = schema();
        let doc = schema.node("doc", Attrs::new(), blocks, vec![]).unwrap();
        EditorState::create(schema, Some(doc)).unwrap().with_selection(selection)
    }

    #[test]
    fn test_chain_stops_at_first_applicable() {
        let schema = schema();
        let s = state(vec![block(&schema, "p", "ab")], Selection::cursor(1));
        let chained = chain_commands(vec![Command::new(delete_selection), Command::new(select_all)]);
        let tr = chained.run(&s).unwrap();
        assert_eq!(tr.selection(), Selection::All);
        assert!(!Command::new(delete_selection).can_run(&s));
    }

    #[test]
    fn test_split_block_in_middle() {
        let schema = schema();
        let s = state(vec![block(&schema, "p", "abcd")], Selection::cursor(3));
        let tr = split_block(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(p("ab"), p("cd"))"#);
        assert_eq!(tr.selection(), Selection::cursor(5));
    }

    #[test]
    fn test_split_heading_at_end_creates_paragraph() {
        let schema = schema();
        let s = state(vec![block(&schema, "h1", "Title")], Selection::cursor(6));
        let tr = split_block(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(h1("Title"), p)"#);
    }

    #[test]
    fn test_split_block_as_paragraph() {
        let schema = schema();
        let s = state(vec![block(&schema, "h1", "Title")], Selection::cursor(3));
        let tr = split_block_as("p").run(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(h1("Ti"), p("tle"))"#);
    }

    #[test]
    fn test_create_paragraph_near_selected_leaf() {
        let schema = schema();
        let s = state(vec![block(&schema, "hr", "")], Selection::node(0));
        let tr = create_paragraph_near(&s).unwrap();
        assert_eq!(tr.doc().to_string(), "doc(hr, p)");
        assert_eq!(tr.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_join_backward_merges_textblocks() {
        let schema = schema();
        let s = state(
            vec![block(&schema, "p", "ab"), block(&schema, "p", "cd")],
            Selection::cursor(5),
        );
        let tr = join_backward(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(p("abcd"))"#);
        assert_eq!(tr.selection(), Selection::cursor(3));
        assert!(join_backward(&s.with_selection(Selection::cursor(1))).is_none());
    }

    #[test]
    fn test_join_forward_merges_textblocks() {
        let schema = schema();
        let s = state(
            vec![block(&schema, "p", "ab"), block(&schema, "p", "cd")],
            Selection::cursor(3),
        );
        let tr = join_forward(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(p("abcd"))"#);
    }

    #[test]
    fn test_select_node_backward_selects_leaf() {
        let schema = schema();
        let s = state(
            vec![block(&schema, "hr", ""), block(&schema, "p", "x")],
            Selection::cursor(2),
        );
        let tr = select_node_backward(&s).unwrap();
        assert_eq!(tr.selection(), Selection::node(0));
    }

    #[test]
    fn test_select_parent_and_first_child() {
        let schema = schema();
        let s = state(vec![block(&schema, "p", "ab")], Selection::cursor(2));
        let tr = select_parent_node(&s).unwrap();
        assert_eq!(tr.selection(), Selection::node(0));

        let selected = s.with_selection(Selection::node(0));
        let tr = select_first_child_node(&selected).unwrap();
        assert_eq!(tr.selection(), Selection::cursor(1));
    }

    #[test]
    fn test_delete_selection_variants() {
        let schema = schema();
        let s = state(
            vec![block(&schema, "p", "abc"), block(&schema, "p", "def")],
            Selection::text(2, 7),
        );
        let tr = delete_selection(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(p("aef"))"#);

        let all = s.with_selection(Selection::All);
        let tr = delete_selection(&all).unwrap();
        assert_eq!(tr.doc().to_string(), "doc(p)");
        assert_eq!(tr.selection(), Selection::cursor(1));
    }

    #[test]
    fn test_insert_break_replaces_selection() {
        let schema = schema();
        let s = state(vec![block(&schema, "p", "abc")], Selection::text(2, 3));
        let tr = insert_break(&s).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(p("a", br, "c"))"#);
        assert_eq!(tr.selection(), Selection::cursor(3));
        assert!(insert_word_break(&s).is_none());
    }

    #[test]
    fn test_toggle_mark_adds_updates_and_removes() {
        let schema = schema();
        let s = state(vec![block(&schema, "p", "abc")], Selection::text(1, 3));
        let toggle = toggle_mark("em", Attrs::new());
        let marked = s.apply(&toggle.run(&s).unwrap());
        assert_eq!(marked.doc().child(0).unwrap().child(0).unwrap().marks().len(), 1);
        let unmarked = marked.apply(&toggle.run(&marked).unwrap());
        assert_eq!(unmarked.doc(), s.doc());

        let link = toggle_mark("a", attrs([("href", "x")]));
        let linked = s.apply(&link.run(&s).unwrap());
        let relink = toggle_mark("a", attrs([("href", "y")]));
        let relinked = linked.apply(&relink.run(&linked).unwrap());
        let text = relinked.doc().child(0).unwrap().child(0).unwrap().clone();
        assert_eq!(text.marks()[0].attr("href").and_then(|v| v.as_str()), Some("y"));

        assert!(toggle.run(&s.with_selection(Selection::cursor(1))).is_none());
    }

    #[test]
    fn test_set_doc_attributes_merges() {
        let schema = schema();
        let s = state(vec![block(&schema, "p", "")], Selection::cursor(1));
        let tr = set_doc_attributes(attrs([("lang", "de")])).run(&s).unwrap();
        assert_eq!(tr.doc().attr_str("lang"), Some("de"));
    }
}
