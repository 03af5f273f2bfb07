use crate::error::{ModelError, ModelResult};
use crate::fragment::{char_slice, Fragment};
use crate::mark::{same_mark_set, Mark};
use crate::resolve::ResolvedPos;
use crate::schema::NodeType;
use quire_codec::{AttrValue, Attrs};
use std::fmt;
use std::sync::Arc;

/// Immutable document node. Clones share structure.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

struct NodeData {
    node_type: Arc<NodeType>,
    attrs: Attrs,
    content: Fragment,
    marks: Vec<Mark>,
    /// Set for text nodes only
    text: Option<String>,
    /// Text length in characters
    text_len: usize,
}

impl Node {
    pub(crate) fn new(node_type: Arc<NodeType>, attrs: Attrs, content: Fragment, marks: Vec<Mark>) -> Self {
        Node(Arc::new(NodeData {
            node_type,
            attrs,
            content,
            marks,
            text: None,
            text_len: 0,
        }))
    }

    pub(crate) fn new_text(node_type: Arc<NodeType>, text: String, marks: Vec<Mark>) -> Self {
        let text_len = text.chars().count();
        Node(Arc::new(NodeData {
            node_type,
            attrs: Attrs::new(),
            content: Fragment::empty(),
            marks,
            text: Some(text),
            text_len,
        }))
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.0.node_type
    }

    pub fn type_name(&self) -> &str {
        self.0.node_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.0.attrs.get(name)
    }

    /// String value of an attribute, if it is one
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_str)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    /// Text of a text node, empty for other nodes
    pub fn text(&self) -> &str {
        self.0.text.as_deref().unwrap_or("")
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.node_type.is_leaf()
    }

    pub fn is_inline(&self) -> bool {
        self.0.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.node_type.is_textblock()
    }

    pub fn is_atom(&self) -> bool {
        self.0.node_type.is_atom()
    }

    pub fn inline_content(&self) -> bool {
        self.0.node_type.inline_content()
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.0.content.child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last_child()
    }

    pub fn children(&self) -> std::slice::Iter<'_, Node> {
        self.0.content.iter()
    }

    /// Size in the parent's coordinates
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.0.text_len
        } else if self.is_leaf() {
            1
        } else {
            self.0.content.size() + 2
        }
    }

    pub fn content_size(&self) -> usize {
        self.0.content.size()
    }

    pub fn same_markup(&self, other: &Node) -> bool {
        self.type_name() == other.type_name()
            && self.attrs() == other.attrs()
            && same_mark_set(self.marks(), other.marks())
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Same node with new content
    pub fn copy(&self, content: Fragment) -> Node {
        Node(Arc::new(NodeData {
            node_type: self.0.node_type.clone(),
            attrs: self.0.attrs.clone(),
            content,
            marks: self.0.marks.clone(),
            text: None,
            text_len: 0,
        }))
    }

    pub fn mark(&self, marks: Vec<Mark>) -> Node {
        Node(Arc::new(NodeData {
            node_type: self.0.node_type.clone(),
            attrs: self.0.attrs.clone(),
            content: self.0.content.clone(),
            marks,
            text: self.0.text.clone(),
            text_len: self.0.text_len,
        }))
    }

    pub fn with_attrs(&self, attrs: Attrs) -> Node {
        Node(Arc::new(NodeData {
            node_type: self.0.node_type.clone(),
            attrs,
            content: self.0.content.clone(),
            marks: self.0.marks.clone(),
            text: self.0.text.clone(),
            text_len: self.0.text_len,
        }))
    }

    pub fn with_text(&self, text: String) -> Node {
        Node::new_text(self.0.node_type.clone(), text, self.0.marks.clone())
    }

    /// Part of the node between two content positions. For text nodes these
    /// are character offsets.
    pub fn cut(&self, from: usize, to: usize) -> Node {
        if self.is_text() {
            if from == 0 && to >= self.0.text_len {
                return self.clone();
            }
            return self.with_text(char_slice(self.text(), from, to));
        }
        if from == 0 && to >= self.content_size() {
            return self.clone();
        }
        self.copy(self.0.content.cut(from, to))
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Node {
        self.copy(self.0.content.replace_child(index, node))
    }

    /// Visit every descendant in document order with its position. Returning
    /// `false` skips the node's children.
    pub fn descendants(&self, f: &mut dyn FnMut(&Node, usize, Option<&Node>, usize) -> bool) {
        self.nodes_between(0, self.content_size(), f);
    }

    pub fn nodes_between(
        &self,
        from: usize,
        to: usize,
        f: &mut dyn FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    ) {
        self.0.content.nodes_between(from, to, 0, Some(self), f);
    }

    /// Node starting at `pos`, if any
    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut node = self.clone();
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos);
            let child = node.child(index)?.clone();
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        if pos > self.content_size() {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.content_size(),
            });
        }
        Ok(ResolvedPos::resolve(self, pos))
    }

    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        self.0.content.text_between(from, to, block_separator, "")
    }

    pub fn text_content(&self) -> String {
        if self.is_text() {
            return self.text().to_string();
        }
        self.text_between(0, self.content_size(), "")
    }

    /// Check the whole subtree against the schema
    pub fn check(&self) -> ModelResult<()> {
        if !self.is_text() && !self.0.node_type.valid_content(&self.0.content) {
            return Err(ModelError::InvalidContent {
                type_name: self.type_name().to_string(),
            });
        }
        for child in self.children() {
            child.check()?;
        }
        Ok(())
    }
}

/// Structural equality
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.same_markup(other) && self.0.text == other.0.text && self.0.content == other.0.content)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut inner = if self.is_text() {
            format!("{:?}", self.text())
        } else if self.content().is_empty() {
            self.type_name().to_string()
        } else {
            format!("{}({})", self.type_name(), self.content())
        };
        for mark in self.marks().iter().rev() {
            inner = format!("{:?}({})", mark, inner);
        }
        write!(f, "{}", inner)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
