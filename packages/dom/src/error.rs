use thiserror::Error;

pub type MarkupResult<T> = Result<T, MarkupError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("Unterminated comment starting at {pos}")]
    UnterminatedComment { pos: usize },

    #[error("Unterminated <{tag}> content starting at {pos}")]
    UnterminatedRawText { tag: String, pos: usize },
}

impl MarkupError {
    pub fn unterminated_comment(pos: usize) -> Self {
        Self::UnterminatedComment { pos }
    }

    pub fn unterminated_raw_text(tag: impl Into<String>, pos: usize) -> Self {
        Self::UnterminatedRawText {
            tag: tag.into(),
            pos,
        }
    }
}
