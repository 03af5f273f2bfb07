//! # Head Editing
//!
//! Structural operations on the head sub-document. Every operation takes a
//! snapshot and returns a new one. An operation that does not apply returns
//! the input snapshot unchanged; callers compare documents to tell.
//!
//! Elements are found with a [`Matcher`], called for each node with its
//! position, its parent and its index in the parent.

use quire_codec::{AttrValue, Attrs, DATA_ATTR};
use quire_model::{EditorState, ModelResult, Node, Schema, StepResult, Transaction};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Predicate over `(node, pos, parent, index_in_parent)`
pub type Matcher<'a> = dyn Fn(&Node, usize, Option<&Node>, usize) -> bool + 'a;

/// Elements `noscript` may group
const NOSCRIPT_CHILDREN: &[&str] = &["meta", "link", "style"];

const THEME_ATTR: &str = "data-ww-theme";

/// Stylesheet of the base theme, shipped with every new document
pub const BASE_THEME: &str = "\
:root { font-family: system-ui, sans-serif; line-height: 1.5; }
body { max-width: 80ch; margin: 0 auto; padding: 1rem; }
img, video, svg { max-width: 100%; height: auto; }
";

/// A head element found by a matcher
#[derive(Debug, Clone, PartialEq)]
pub struct HeadMatch {
    pub node: Node,
    /// Position directly before the node
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("expected 'up' or 'down', got '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Matches nodes of type `name`
pub fn by_type(name: &str) -> impl Fn(&Node, usize, Option<&Node>, usize) -> bool + '_ {
    move |node, _, _, _| node.type_name() == name
}

/// Matches nodes whose attribute `attr` is the string `value`
pub fn by_attr<'a>(attr: &'a str, value: &'a str) -> impl Fn(&Node, usize, Option<&Node>, usize) -> bool + 'a {
    move |node, _, _, _| node.attr_str(attr) == Some(value)
}

/// Matches `<meta name="…">`
pub fn meta_named(name: &str) -> impl Fn(&Node, usize, Option<&Node>, usize) -> bool + '_ {
    move |node, _, _, _| node.type_name() == "meta" && node.attr_str("name") == Some(name)
}

/// Matches the top-level element at `index`
pub fn top_level_index(index: usize) -> impl Fn(&Node, usize, Option<&Node>, usize) -> bool {
    move |_, _, parent, i| i == index && parent.map(|p| p.type_name() == "head").unwrap_or(false)
}

/// Whether two heads have the same root attributes and content
pub fn head_equal(a: &Node, b: &Node) -> bool {
    a.ptr_eq(b) || (a.attrs() == b.attrs() && a.children().eq(b.children()))
}

/// A fresh head: charset, generator and the base theme stylesheet. `id`
/// defaults to a time-based identifier.
pub fn initial_head_state(schema: &Arc<Schema>, lang: Option<&str>, id: Option<String>) -> ModelResult<EditorState> {
    let id = id.unwrap_or_else(|| format!("ww-{:x}", chrono::Utc::now().timestamp_millis()));

    let mut html_attrs: BTreeMap<String, AttrValue> = BTreeMap::new();
    html_attrs.insert("id".to_string(), AttrValue::from(id));
    if let Some(lang) = lang {
        html_attrs.insert("lang".to_string(), AttrValue::from(lang));
    }
    let mut head_attrs = Attrs::new();
    head_attrs.insert("htmlAttrs".to_string(), AttrValue::Map(html_attrs));

    let charset = schema.node("meta", quire_codec::attrs([("charset", "utf-8")]), vec![], vec![])?;
    let generator = schema.node(
        "meta",
        quire_codec::attrs([
            ("name", "generator".to_string()),
            ("content", format!("quire@{}", env!("CARGO_PKG_VERSION"))),
        ]),
        vec![],
        vec![],
    )?;
    let mut theme_data = BTreeMap::new();
    theme_data.insert(THEME_ATTR.to_string(), AttrValue::from("base"));
    let mut style_attrs = Attrs::new();
    style_attrs.insert(DATA_ATTR.to_string(), AttrValue::Map(theme_data));
    style_attrs.insert("blocking".to_string(), AttrValue::from("render"));
    let theme = schema.node("style", style_attrs, vec![schema.text(BASE_THEME, vec![])?], vec![])?;

    let head = schema.node("head", head_attrs, vec![charset, generator, theme], vec![])?;
    EditorState::create(schema.clone(), Some(head))
}

/// Apply the steps `build` adds, or keep `state` when a step fails
fn apply_or_keep(
    state: &EditorState,
    operation: &str,
    build: impl FnOnce(&mut Transaction) -> StepResult<()>,
) -> EditorState {
    let mut tr = state.tr();
    match build(&mut tr) {
        Ok(()) => {
            tracing::debug!(operation, steps = tr.steps().len(), "head updated");
            state.apply(&tr)
        }
        Err(err) => {
            tracing::debug!(operation, error = %err, "head operation not applicable");
            state.clone()
        }
    }
}

fn merged(base: &Attrs, update: &Attrs) -> Attrs {
    let mut out = base.clone();
    out.extend(update.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

/// Replace the attributes of the `head` root
pub fn set_head_attributes(state: &EditorState, attrs: Attrs) -> EditorState {
    apply_or_keep(state, "set_head_attributes", |tr| tr.set_doc_attrs(attrs).map(|_| ()))
}

/// First descendant `matcher` accepts, in document order
pub fn get_head_element(state: &EditorState, matcher: &Matcher<'_>) -> Option<HeadMatch> {
    let mut found = None;
    state.doc().descendants(&mut |node, pos, parent, index| {
        if found.is_some() {
            return false;
        }
        if matcher(node, pos, parent, index) {
            found = Some(HeadMatch {
                node: node.clone(),
                pos,
            });
            return false;
        }
        true
    });
    found
}

/// Every descendant `matcher` accepts, in document order
pub fn get_head_element_all(state: &EditorState, matcher: &Matcher<'_>) -> Vec<HeadMatch> {
    let mut found = Vec::new();
    state.doc().descendants(&mut |node, pos, parent, index| {
        if matcher(node, pos, parent, index) {
            found.push(HeadMatch {
                node: node.clone(),
                pos,
            });
        }
        true
    });
    found
}

/// Update the first element `matcher` accepts, or append a new one.
///
/// A matching root only has `attrs` merged into its attributes. A matching
/// element is replaced by a `name` node with the old attributes overlaid by
/// `attrs` and `content` as its children. Without a match, a `name` node is
/// appended to the head.
pub fn upsert_head_element(
    state: &EditorState,
    name: &str,
    attrs: Attrs,
    content: Vec<Node>,
    matcher: &Matcher<'_>,
) -> EditorState {
    let doc = state.doc();
    if matcher(doc, 0, None, 0) {
        let attrs = merged(doc.attrs(), &attrs);
        return apply_or_keep(state, "upsert_head_element", |tr| tr.set_doc_attrs(attrs).map(|_| ()));
    }

    let schema = state.schema();
    match get_head_element(state, matcher) {
        Some(existing) => {
            let node = match schema.node(name, merged(existing.node.attrs(), &attrs), content, vec![]) {
                Ok(node) => node,
                Err(err) => {
                    tracing::debug!(name, error = %err, "invalid head element");
                    return state.clone();
                }
            };
            let end = existing.pos + existing.node.node_size();
            apply_or_keep(state, "upsert_head_element", |tr| {
                tr.replace_with(existing.pos, end, node).map(|_| ())
            })
        }
        None => {
            let node = match schema.node(name, attrs, content, vec![]) {
                Ok(node) => node,
                Err(err) => {
                    tracing::debug!(name, error = %err, "invalid head element");
                    return state.clone();
                }
            };
            let end = doc.content_size();
            apply_or_keep(state, "upsert_head_element", |tr| tr.insert(end, vec![node]).map(|_| ()))
        }
    }
}

/// Remove the first element `matcher` accepts. Without a match the head is
/// left as it is.
pub fn delete_head_element(state: &EditorState, matcher: &Matcher<'_>) -> EditorState {
    match get_head_element(state, matcher) {
        Some(existing) => {
            let end = existing.pos + existing.node.node_size();
            apply_or_keep(state, "delete_head_element", |tr| tr.delete(existing.pos, end).map(|_| ()))
        }
        None => {
            tracing::debug!("delete_head_element matched nothing");
            state.clone()
        }
    }
}

/// Swap the element at `pos` with its neighbor in `direction`.
///
/// Inside a `noscript`, elements swap with their siblings and leave the group
/// when moved past its first or last child. A `meta`, `link` or `style` moved
/// onto a `noscript` joins the group at the near edge. Moving past either end
/// of the head is a no-op.
pub fn move_head_element(state: &EditorState, pos: usize, direction: Direction) -> EditorState {
    let doc = state.doc();
    let Some(node) = doc.node_at(pos) else {
        return state.clone();
    };
    let Ok(rp) = doc.resolve(pos) else {
        return state.clone();
    };
    let top: Vec<Node> = doc.children().cloned().collect();

    let rebuilt = match rp.depth() {
        0 => move_top_level(state, &top, rp.index(0), &node, direction),
        1 if rp.parent().type_name() == "noscript" => {
            move_in_noscript(state, &top, rp.index(0), rp.index(1), &node, direction)
        }
        _ => None,
    };
    let Some(nodes) = rebuilt else {
        return state.clone();
    };
    let end = doc.content_size();
    apply_or_keep(state, "move_head_element", |tr| tr.replace(0, end, nodes).map(|_| ()))
}

fn neighbor(index: usize, len: usize, direction: Direction) -> Option<usize> {
    match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => (index + 1 < len).then_some(index + 1),
    }
}

fn regroup(state: &EditorState, group: &Node, children: Vec<Node>) -> Option<Node> {
    state
        .schema()
        .node(group.type_name(), group.attrs().clone(), children, group.marks().to_vec())
        .ok()
}

fn move_top_level(
    state: &EditorState,
    top: &[Node],
    index: usize,
    node: &Node,
    direction: Direction,
) -> Option<Vec<Node>> {
    let next_index = neighbor(index, top.len(), direction)?;
    let next = &top[next_index];
    let (start, end) = (index.min(next_index), index.max(next_index));

    let middle = if next.type_name() == "noscript" && NOSCRIPT_CHILDREN.contains(&node.type_name()) {
        let mut children: Vec<Node> = next.children().cloned().collect();
        match direction {
            Direction::Down => children.insert(0, node.clone()),
            Direction::Up => children.push(node.clone()),
        }
        vec![regroup(state, next, children)?]
    } else {
        match direction {
            Direction::Up => vec![node.clone(), next.clone()],
            Direction::Down => vec![next.clone(), node.clone()],
        }
    };

    let mut nodes = top[..start].to_vec();
    nodes.extend(middle);
    nodes.extend_from_slice(&top[end + 1..]);
    Some(nodes)
}

fn move_in_noscript(
    state: &EditorState,
    top: &[Node],
    group_index: usize,
    child_index: usize,
    node: &Node,
    direction: Direction,
) -> Option<Vec<Node>> {
    let group = &top[group_index];
    let children: Vec<Node> = group.children().cloned().collect();

    let middle = match neighbor(child_index, children.len(), direction) {
        None => {
            let mut rest = children;
            rest.remove(child_index);
            let group = regroup(state, group, rest)?;
            match direction {
                Direction::Up => vec![node.clone(), group],
                Direction::Down => vec![group, node.clone()],
            }
        }
        Some(next_index) => {
            let mut swapped = children;
            swapped.swap(child_index, next_index);
            vec![regroup(state, group, swapped)?]
        }
    };

    let mut nodes = top[..group_index].to_vec();
    nodes.extend(middle);
    nodes.extend_from_slice(&top[group_index + 1..]);
    Some(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::attrs;
    use quire_schema::head_schema;

    fn schema() -> Arc<Schema> {
        head_schema().unwrap().schema
    }

    fn meta(schema: &Schema, name: &str) -> Node {
        schema.node("meta", attrs([("name", name)]), vec![], vec![]).unwrap()
    }

    fn head(schema: &Arc<Schema>, children: Vec<Node>) -> EditorState {
        let doc = schema.node("head", Attrs::new(), children, vec![]).unwrap();
        EditorState::create(schema.clone(), Some(doc)).unwrap()
    }

    fn names(state: &EditorState) -> Vec<String> {
        state
            .doc()
            .children()
            .map(|n| match n.attr_str("name") {
                Some(name) => format!("{}:{}", n.type_name(), name),
                None => n.type_name().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_initial_head() {
        let state = initial_head_state(&schema(), Some("de"), Some("ww-1".to_string())).unwrap();
        assert_eq!(names(&state), vec!["meta", "meta:generator", "style"]);
        let html_attrs = state.doc().attr("htmlAttrs").and_then(AttrValue::as_map).unwrap();
        assert_eq!(html_attrs.get("lang"), Some(&AttrValue::from("de")));
        assert_eq!(html_attrs.get("id"), Some(&AttrValue::from("ww-1")));
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let schema = schema();
        let state = head(&schema, vec![meta(&schema, "a")]);
        let matcher = meta_named("description");

        let added = upsert_head_element(
            &state,
            "meta",
            attrs([("name", "description"), ("content", "first")]),
            vec![],
            &matcher,
        );
        assert_eq!(names(&added), vec!["meta:a", "meta:description"]);

        let updated = upsert_head_element(&added, "meta", attrs([("content", "second")]), vec![], &matcher);
        let found = get_head_element(&updated, &matcher).unwrap();
        assert_eq!(found.node.attr_str("content"), Some("second"));
        assert_eq!(found.node.attr_str("name"), Some("description"));
        assert_eq!(found.pos, 1);
    }

    #[test]
    fn test_upsert_is_idempotent_on_match() {
        let schema = schema();
        let state = head(&schema, vec![]);
        let matcher = by_type("title");
        let title = vec![schema.text("Notes", vec![]).unwrap()];
        let once = upsert_head_element(&state, "title", Attrs::new(), title.clone(), &matcher);
        let twice = upsert_head_element(&once, "title", Attrs::new(), title, &matcher);
        assert_eq!(once.doc(), twice.doc());
    }

    #[test]
    fn test_upsert_on_root_merges_attributes() {
        let schema = schema();
        let state = head(&schema, vec![meta(&schema, "a")]);
        let updated = upsert_head_element(&state, "head", attrs([("id", "top")]), vec![], &by_type("head"));
        assert_eq!(updated.doc().attr_str("id"), Some("top"));
        assert_eq!(names(&updated), vec!["meta:a"]);
    }

    #[test]
    fn test_get_all_in_document_order() {
        let schema = schema();
        let noscript = schema
            .node("noscript", Attrs::new(), vec![meta(&schema, "b")], vec![])
            .unwrap();
        let state = head(&schema, vec![meta(&schema, "a"), noscript]);
        let metas = get_head_element_all(&state, &by_type("meta"));
        let positions: Vec<usize> = metas.iter().map(|m| m.pos).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn test_delete_without_match_keeps_head() {
        let schema = schema();
        let state = head(&schema, vec![meta(&schema, "a")]);
        let same = delete_head_element(&state, &meta_named("missing"));
        assert_eq!(same.doc(), state.doc());

        let emptied = delete_head_element(&state, &meta_named("a"));
        assert_eq!(emptied.doc().child_count(), 0);
    }

    #[test]
    fn test_move_boundaries_are_no_ops() {
        let schema = schema();
        let state = head(&schema, vec![meta(&schema, "a"), meta(&schema, "b")]);
        assert_eq!(move_head_element(&state, 0, Direction::Up).doc(), state.doc());
        assert_eq!(move_head_element(&state, 1, Direction::Down).doc(), state.doc());

        let swapped = move_head_element(&state, 0, Direction::Down);
        assert_eq!(names(&swapped), vec!["meta:b", "meta:a"]);
    }

    #[test]
    fn test_move_down_joins_noscript_at_front() {
        let schema = schema();
        let noscript = schema
            .node("noscript", Attrs::new(), vec![meta(&schema, "b")], vec![])
            .unwrap();
        let state = head(&schema, vec![meta(&schema, "a"), noscript]);

        let moved = move_head_element(&state, 0, Direction::Down);
        assert_eq!(names(&moved), vec!["noscript"]);
        let group = moved.doc().child(0).unwrap();
        let grouped: Vec<&str> = group.children().filter_map(|n| n.attr_str("name")).collect();
        assert_eq!(grouped, vec!["a", "b"]);
    }

    #[test]
    fn test_move_up_out_of_noscript() {
        let schema = schema();
        let noscript = schema
            .node("noscript", Attrs::new(), vec![meta(&schema, "b"), meta(&schema, "c")], vec![])
            .unwrap();
        let state = head(&schema, vec![meta(&schema, "a"), noscript]);

        // first child of the group, just inside it
        let moved = move_head_element(&state, 2, Direction::Up);
        assert_eq!(names(&moved), vec!["meta:a", "meta:b", "noscript"]);

        let swapped = move_head_element(&state, 2, Direction::Down);
        let group = swapped.doc().child(1).unwrap();
        let grouped: Vec<&str> = group.children().filter_map(|n| n.attr_str("name")).collect();
        assert_eq!(grouped, vec!["c", "b"]);
    }

    #[test]
    fn test_title_never_joins_noscript() {
        let schema = schema();
        let title = schema
            .node("title", Attrs::new(), vec![schema.text("T", vec![]).unwrap()], vec![])
            .unwrap();
        let noscript = schema.node("noscript", Attrs::new(), vec![], vec![]).unwrap();
        let state = head(&schema, vec![title, noscript]);
        let moved = move_head_element(&state, 0, Direction::Down);
        assert_eq!(names(&moved), vec!["noscript", "title"]);
    }

    #[test]
    fn test_head_equal_ignores_history() {
        let schema = schema();
        let a = head(&schema, vec![meta(&schema, "a")]);
        let b = head(&schema, vec![meta(&schema, "a")]);
        assert!(head_equal(a.doc(), b.doc()));
        let c = set_head_attributes(&a, attrs([("id", "x")]));
        assert!(!head_equal(a.doc(), c.doc()));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Up));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
