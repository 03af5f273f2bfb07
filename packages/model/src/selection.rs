use crate::node::Node;
use crate::transform::Mapping;

/// Editor selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Text range. `anchor` stays put, `head` moves.
    Text { anchor: usize, head: usize },
    /// A single node, starting at `pos`
    Node { pos: usize },
    /// The whole document
    All,
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Selection::Text { anchor: pos, head: pos }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    pub fn node(pos: usize) -> Self {
        Selection::Node { pos }
    }

    /// Cursor at the start of the first textblock, or the whole document
    pub fn at_start(doc: &Node) -> Self {
        let mut found = None;
        doc.descendants(&mut |node, pos, _, _| {
            if found.is_some() {
                return false;
            }
            if node.is_textblock() {
                found = Some(pos + 1);
                return false;
            }
            true
        });
        found.map(Selection::cursor).unwrap_or(Selection::All)
    }

    /// Cursor at the end of the last textblock, or the whole document
    pub fn at_end(doc: &Node) -> Self {
        let mut found = None;
        doc.descendants(&mut |node, pos, _, _| {
            if node.is_textblock() {
                found = Some(pos + 1 + node.content_size());
            }
            true
        });
        found.map(Selection::cursor).unwrap_or(Selection::All)
    }

    /// Start and end of the selected range in `doc`
    pub fn range(&self, doc: &Node) -> (usize, usize) {
        match self {
            Selection::Text { anchor, head } => ((*anchor).min(*head), (*anchor).max(*head)),
            Selection::Node { pos } => {
                let size = doc.node_at(*pos).map(|n| n.node_size()).unwrap_or(0);
                (*pos, pos + size)
            }
            Selection::All => (0, doc.content_size()),
        }
    }

    pub fn from(&self, doc: &Node) -> usize {
        self.range(doc).0
    }

    pub fn to(&self, doc: &Node) -> usize {
        self.range(doc).1
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Text { anchor, head } if anchor == head)
    }

    /// Cursor position, if the selection is collapsed
    pub fn cursor_pos(&self) -> Option<usize> {
        match self {
            Selection::Text { anchor, head } if anchor == head => Some(*head),
            _ => None,
        }
    }

    /// Selected node, for node selections
    pub fn selected_node(&self, doc: &Node) -> Option<Node> {
        match self {
            Selection::Node { pos } => doc.node_at(*pos),
            _ => None,
        }
    }

    /// Map through document changes. `doc` is the changed document.
    pub fn map(&self, mapping: &Mapping, doc: &Node) -> Selection {
        let size = doc.content_size();
        match self {
            Selection::Text { anchor, head } => Selection::Text {
                anchor: mapping.map(*anchor, 1).min(size),
                head: mapping.map(*head, 1).min(size),
            },
            Selection::Node { pos } => {
                let (mapped, deleted) = mapping.map_result(*pos, 1);
                if deleted || doc.node_at(mapped).is_none() {
                    Selection::cursor(mapped.min(size))
                } else {
                    Selection::Node { pos: mapped }
                }
            }
            Selection::All => Selection::All,
        }
    }
}
