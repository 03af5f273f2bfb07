//! Error types for schema composition

use quire_model::ModelError;
use thiserror::Error;

/// Configuration errors found while composing plugins. None of them is
/// recoverable: an editor cannot start with an inconsistent schema.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("node type '{name}' is defined by both '{first}' and '{second}'")]
    DuplicateNode {
        name: String,
        first: String,
        second: String,
    },

    #[error("mark type '{name}' is defined by both '{first}' and '{second}'")]
    DuplicateMark {
        name: String,
        first: String,
        second: String,
    },

    #[error("command '{name}' is defined by both '{first}' and '{second}'")]
    DuplicateCommand {
        name: String,
        first: String,
        second: String,
    },

    #[error("no plugin declares a top node")]
    MissingTopNode,

    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("invalid input rule '{rule}': {message}")]
    InvalidInputRule { rule: String, message: String },

    #[error("schema error: {0}")]
    Schema(#[from] ModelError),
}

pub type ComposeResult<T> = Result<T, ComposeError>;
