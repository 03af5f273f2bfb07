use crate::error::{ModelError, ModelResult};
use crate::history::{History, StepBatch, DEFAULT_DEPTH};
use crate::node::Node;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::transform::Transaction;
use quire_codec::Attrs;
use std::sync::Arc;

/// Immutable editor snapshot: document, selection and history
#[derive(Debug, Clone)]
pub struct EditorState {
    schema: Arc<Schema>,
    doc: Node,
    selection: Selection,
    history: History,
}

impl EditorState {
    /// State for `doc`, or for a freshly filled top node when `doc` is `None`
    pub fn create(schema: Arc<Schema>, doc: Option<Node>) -> ModelResult<Self> {
        Self::with_history_depth(schema, doc, DEFAULT_DEPTH)
    }

    pub fn with_history_depth(schema: Arc<Schema>, doc: Option<Node>, depth: usize) -> ModelResult<Self> {
        let doc = match doc {
            Some(doc) => {
                if doc.type_name() != schema.top_node_name() {
                    return Err(ModelError::InvalidContent {
                        type_name: doc.type_name().to_string(),
                    });
                }
                doc
            }
            None => schema.create_and_fill(schema.top_node_name(), Attrs::new(), Vec::new())?,
        };
        let selection = Selection::at_start(&doc);
        Ok(Self {
            schema,
            doc,
            selection,
            history: History::with_depth(depth),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Start a transaction on this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(self.schema.clone(), self.doc.clone(), self.selection.clone())
    }

    /// The state after `tr`. Document changes kept out of history invalidate
    /// the positions stored in it, so history is cleared for those.
    pub fn apply(&self, tr: &Transaction) -> EditorState {
        let mut history = self.history.clone();
        if tr.doc_changed() {
            if tr.is_add_to_history() {
                history.push(StepBatch::from_transaction(tr));
            } else {
                tracing::debug!("untracked document change, clearing history");
                history.clear();
            }
        }
        EditorState {
            schema: self.schema.clone(),
            doc: tr.doc().clone(),
            selection: tr.selection(),
            history,
        }
    }

    pub fn with_selection(&self, selection: Selection) -> EditorState {
        EditorState {
            selection,
            ..self.clone()
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// State with the last change undone, or `None` if there is none or it no
    /// longer applies
    pub fn undo(&self) -> Option<EditorState> {
        let mut history = self.history.clone();
        match history.undo(&self.doc) {
            Ok(Some((doc, selection))) => Some(self.restored(doc, selection, history)),
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(%err, "undo failed");
                None
            }
        }
    }

    pub fn redo(&self) -> Option<EditorState> {
        let mut history = self.history.clone();
        match history.redo(&self.doc) {
            Ok(Some((doc, selection))) => Some(self.restored(doc, selection, history)),
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(%err, "redo failed");
                None
            }
        }
    }

    fn restored(&self, doc: Node, selection: Selection, history: History) -> EditorState {
        let size = doc.content_size();
        let selection = match selection {
            Selection::Text { anchor, head } => Selection::Text {
                anchor: anchor.min(size),
                head: head.min(size),
            },
            other => other,
        };
        EditorState {
            schema: self.schema.clone(),
            doc,
            selection,
            history,
        }
    }
}
