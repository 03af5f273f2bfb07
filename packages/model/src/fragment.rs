use crate::mark::same_mark_set;
use crate::node::Node;
use std::fmt;

/// Ordered child list of a node, with its cached size
#[derive(Clone, Default, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fragment, dropping empty text and merging adjacent text nodes
    /// that carry the same marks.
    pub fn from_vec(nodes: Vec<Node>) -> Self {
        let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if node.is_text() {
                if node.text().is_empty() {
                    continue;
                }
                if let Some(last) = out.last_mut() {
                    if last.is_text() && same_mark_set(last.marks(), node.marks()) {
                        let joined = format!("{}{}", last.text(), node.text());
                        *last = last.with_text(joined);
                        continue;
                    }
                }
            }
            out.push(node);
        }
        let size = out.iter().map(Node::node_size).sum();
        Self { nodes: out, size }
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_vec(vec![node])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.nodes.iter().map(Node::type_name).collect()
    }

    /// Index of the child containing `pos` and the offset where it starts. A
    /// position on a boundary belongs to the child after it.
    pub fn find_index(&self, pos: usize) -> (usize, usize) {
        if pos == 0 {
            return (0, 0);
        }
        if pos >= self.size {
            return (self.nodes.len(), self.size);
        }
        let mut cur = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos {
                    return (i + 1, end);
                }
                return (i, cur);
            }
            cur = end;
        }
        (self.nodes.len(), self.size)
    }

    /// Offset of the child at `index`
    pub fn offset_of(&self, index: usize) -> usize {
        self.nodes.iter().take(index).map(Node::node_size).sum()
    }

    /// Content between two positions. Partially covered children are cut too.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to >= self.size {
            return self.clone();
        }
        let mut out = Vec::new();
        if to > from {
            let mut pos = 0;
            for child in &self.nodes {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let piece = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), (to - pos).min(child.node_size()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to.saturating_sub(pos + 1)).min(child.content_size()),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    out.push(piece);
                }
                pos = end;
            }
        }
        Fragment::from_vec(out)
    }

    pub fn cut_from(&self, from: usize) -> Fragment {
        self.cut(from, self.size)
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        let mut nodes = self.nodes.clone();
        nodes.extend(other.nodes.iter().cloned());
        Fragment::from_vec(nodes)
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.nodes.clone();
        if index < nodes.len() {
            nodes[index] = node;
        }
        Fragment::from_vec(nodes)
    }

    pub fn insert(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.nodes.clone();
        nodes.insert(index.min(nodes.len()), node);
        Fragment::from_vec(nodes)
    }

    pub fn remove(&self, index: usize) -> Fragment {
        let mut nodes = self.nodes.clone();
        if index < nodes.len() {
            nodes.remove(index);
        }
        Fragment::from_vec(nodes)
    }

    /// Call `f` for every node touching `from..to`. `pos` is the offset of this
    /// fragment's start. Returning `false` skips a node's children.
    pub fn nodes_between(
        &self,
        from: usize,
        to: usize,
        pos: usize,
        parent: Option<&Node>,
        f: &mut dyn FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    ) {
        let mut cur = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            if cur >= to {
                break;
            }
            let end = cur + child.node_size();
            if end > from {
                let start = cur + 1;
                if f(child, pos + cur, parent, i) && !child.content().is_empty() {
                    child.content().nodes_between(
                        from.saturating_sub(start),
                        to.saturating_sub(start).min(child.content_size()),
                        pos + start,
                        Some(child),
                        f,
                    );
                }
            }
            cur = end;
        }
    }

    /// Text of the range, with `block_separator` between block nodes and
    /// `leaf_text` for non-text leaves.
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str, leaf_text: &str) -> String {
        let mut text = String::new();
        let mut separated = true;
        self.nodes_between(from, to, 0, None, &mut |node, pos, _, _| {
            if node.is_text() {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(node.node_size());
                text.push_str(&char_slice(node.text(), start, end));
                separated = block_separator.is_empty();
            } else if node.is_leaf() {
                if let Some(f) = &node.node_type().spec().leaf_text {
                    text.push_str(&f(node));
                } else {
                    text.push_str(leaf_text);
                }
                separated = block_separator.is_empty();
            } else if !separated && node.is_block() {
                text.push_str(block_separator);
                separated = true;
            }
            true
        });
        text
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", child)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Slice of `s` by character offsets
pub(crate) fn char_slice(s: &str, from: usize, to: usize) -> String {
    s.chars().skip(from).take(to.saturating_sub(from)).collect()
}
