use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Schema construction and node creation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid content expression '{expr}': {message}")]
    InvalidContentExpression { expr: String, message: String },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Top node type '{0}' is not defined")]
    MissingTopNode(String),

    #[error("Type '{0}' is defined twice")]
    DuplicateType(String),

    #[error("Schema must define a text node type")]
    MissingTextType,

    #[error("Missing required attribute '{attr}' on {type_name}")]
    MissingAttribute { type_name: String, attr: String },

    #[error("Invalid content for node {type_name}")]
    InvalidContent { type_name: String },

    #[error("Position {pos} out of range (document size {size})")]
    PositionOutOfRange { pos: usize, size: usize },
}

/// A step that cannot be applied. The document is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("Position {pos} out of range")]
    OutOfRange { pos: usize },

    #[error("Replace range {from}..{to} does not share a parent")]
    CrossParent { from: usize, to: usize },

    #[error("Replacement yields invalid content for {type_name}")]
    InvalidContent { type_name: String },

    #[error("No node at position {pos}")]
    NoNode { pos: usize },

    #[error("Mark {mark} is not allowed in {type_name}")]
    MarkNotAllowed { mark: String, type_name: String },

    #[error("{0}")]
    Model(#[from] ModelError),
}

impl StepError {
    pub fn invalid_content(type_name: impl Into<String>) -> Self {
        Self::InvalidContent {
            type_name: type_name.into(),
        }
    }
}
