use crate::mark::Mark;
use crate::node::Node;

#[derive(Debug, Clone)]
struct PathEntry {
    node: Node,
    index: usize,
    /// Absolute position where the child at `index` starts
    offset: usize,
}

/// A position with its context: the chain of ancestors from the root down to
/// the node holding the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pub pos: usize,
    path: Vec<PathEntry>,
    /// Offset inside the parent node
    pub parent_offset: usize,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> Self {
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset);
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let Some(child) = node.child(index).cloned() else {
                break;
            };
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }
        Self {
            pos,
            path,
            parent_offset,
        }
    }

    /// Depth of the parent node, the root being 0
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth.min(self.depth())].node
    }

    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &Node {
        self.node(0)
    }

    /// Index into the ancestor at `depth`
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth.min(self.depth())].index
    }

    pub fn index_after(&self, depth: usize) -> usize {
        let depth = depth.min(self.depth());
        if depth == self.depth() && self.text_offset() == 0 {
            self.index(depth)
        } else {
            self.index(depth) + 1
        }
    }

    /// Start of the content of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position before the ancestor at `depth`. Undefined for the root.
    pub fn before(&self, depth: usize) -> usize {
        if depth == 0 {
            return 0;
        }
        if depth == self.depth() + 1 {
            return self.pos;
        }
        self.path[depth - 1].offset
    }

    pub fn after(&self, depth: usize) -> usize {
        if depth == 0 {
            return self.doc().content_size();
        }
        if depth == self.depth() + 1 {
            return self.pos + self.node_after().map(|n| n.node_size()).unwrap_or(0);
        }
        self.path[depth - 1].offset + self.node(depth).node_size()
    }

    /// Offset into the text node the position points into, 0 between nodes
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.child(index)?;
        let offset = self.text_offset();
        if offset > 0 {
            Some(child.cut(offset, child.node_size()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return parent.child(index).map(|child| child.cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            parent.child(index - 1).cloned()
        }
    }

    /// Marks a character inserted here would get. Non-inclusive marks are not
    /// extended past their end.
    pub fn marks(&self) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content().is_empty() {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).map(|c| c.marks().to_vec()).unwrap_or_default();
        }
        let before = if index > 0 { parent.child(index - 1) } else { None };
        let after = parent.child(index);
        let (main, other) = match before {
            Some(before) => (Some(before), after),
            None => (after, None),
        };
        let Some(main) = main else {
            return Vec::new();
        };
        main.marks()
            .iter()
            .filter(|mark| {
                mark.mark_type().spec().inclusive
                    || other.map(|o| mark.is_in_set(o.marks())).unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Deepest depth whose node contains both this position and `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|d| self.start(*d) <= pos && self.end(*d) >= pos)
            .unwrap_or(0)
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }

    /// Deepest ancestor matching `pred`, with its depth
    pub fn find_ancestor(&self, pred: impl Fn(&Node) -> bool) -> Option<(usize, &Node)> {
        (0..=self.depth()).rev().map(|d| (d, self.node(d))).find(|(_, n)| pred(n))
    }
}
