//! # Quire Editor
//!
//! Editing operations on top of the document model and the composed schemas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: plugins → body schema, head schema  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: sessions over immutable snapshots   │
//! │  - Import/export whole HTML documents       │
//! │  - Structural head editing                  │
//! │  - Comment threads and their rendering      │
//! │  - Live head synchronization                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ dom: element trees and HTML text            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are values**: every operation returns a new state
//! 2. **No partial edits**: a failing step leaves the state as it was
//! 3. **Markup survives**: unknown elements and comments round-trip
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_editor::{meta_named, EditorOptions, EditorSession};
//!
//! let mut session = EditorSession::open(&html, EditorOptions::default())?;
//! session.upsert_head_element(
//!     "meta",
//!     quire_codec::attrs([("name", "description"), ("content", "Notes")]),
//!     vec![],
//!     &meta_named("description"),
//! );
//! let html = session.export_html(&Default::default());
//! ```

mod comments;
mod errors;
mod head;
mod import;
mod options;
mod render;
mod session;
mod sync;

pub use comments::{
    add_comment, can_add_comment_thread, comment_threads, delete_comment, next_comment_id, reply_comment,
    update_comment, CommentAnchor, CommentTarget, CommentThread, COMMENT_MARK,
};
pub use errors::{EditorError, EditorResult};
pub use head::{
    by_attr, by_type, delete_head_element, get_head_element, get_head_element_all, head_equal,
    initial_head_state, meta_named, move_head_element, set_head_attributes, top_level_index,
    upsert_head_element, Direction, HeadMatch, Matcher, BASE_THEME,
};
pub use import::{strip_blank_text, upgrade_deprecated_attributes, upgrade_element};
pub use options::{CommentAuthor, EditorOptions};
pub use render::CommentRenderPass;
pub use session::EditorSession;
pub use sync::{apply_patch, diff_children, owned_nodes, HeadPatch, HeadSyncView, NodePath, OWNED_MARKER};
