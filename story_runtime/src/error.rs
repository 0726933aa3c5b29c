//! Runtime errors.
//!
//! None of these end a session: the player logs them and leaves the current
//! view, state and history as they were.

use crate::model::SnippetRef;
use crate::template::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("malformed story document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("snippet {0} not found in the story")]
    SnippetNotFound(SnippetRef),

    #[error("no starting snippet found in the story")]
    NoStartingSnippet,

    /// A load or restore had no landing snippet and nothing in history.
    #[error("history is empty, no snippet to show")]
    EmptyHistory,

    #[error("failed to render snippet \"{snippet}\": {source}")]
    Render { snippet: String, source: RenderError },
}

pub type Result<T> = std::result::Result<T, StoryError>;
