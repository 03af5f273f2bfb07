//! Error types for the editor

use quire_dom::MarkupError;
use quire_model::{ModelError, StepError};
use quire_schema::ComposeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Step failed: {0}")]
    Step(#[from] StepError),

    #[error("Schema error: {0}")]
    Compose(#[from] ComposeError),

    #[error("No comment thread '{0}'")]
    UnknownThread(String),

    #[error("No commented node at position {0}")]
    NoCommentAt(usize),

    #[error("Comment {index} out of range for thread of {len}")]
    CommentIndex { index: usize, len: usize },

    #[error("Selection cannot hold a comment thread")]
    NotCommentable,
}

pub type EditorResult<T> = Result<T, EditorError>;
