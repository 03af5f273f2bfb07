//! # Quire Model
//!
//! Immutable document trees and the machinery to change them:
//!
//! - **schema**: node and mark types compiled from declarative specs
//! - **content**: content expressions compiled to matchers
//! - **node** / **fragment** / **mark**: shared, immutable document values
//! - **transform**: invertible steps grouped into transactions
//! - **state** / **history**: editor snapshots with bounded undo/redo
//! - **markup**: schema-driven import from and export to markup trees
//!
//! Positions count tokens: a text node counts its characters, a leaf node
//! counts 1 and any other node counts its content plus its two boundaries.

pub mod content;
pub mod error;
pub mod fragment;
pub mod history;
pub mod mark;
pub mod markup;
pub mod node;
pub mod resolve;
pub mod schema;
pub mod selection;
pub mod spec;
pub mod state;
pub mod transform;

pub use content::ContentMatch;
pub use error::{ModelError, ModelResult, StepError};
pub use fragment::Fragment;
pub use history::{History, StepBatch, DEFAULT_DEPTH};
pub use mark::{same_mark_set, Mark};
pub use markup::{DomParser, DomSerializer, MarkRenderer, RuleTarget};
pub use node::Node;
pub use resolve::ResolvedPos;
pub use schema::{MarkType, NodeType, Schema, SchemaSpec, TEXT_TYPE};
pub use selection::Selection;
pub use spec::{DomSpec, MarkSpec, NodeSpec, ParseRule, Selector, Whitespace};
pub use state::EditorState;
pub use transform::{Mapping, Step, StepMap, StepResult, Transaction};
