use thiserror::Error;
use tutorbot_core::{Feature, ProfileError, ShapeError, TemplateError};
use tutorbot_history::HistoryError;

use crate::document::DocumentError;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Model call failed: {0}")]
    Model(anyhow::Error),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("Chat mode is not available for {0}")]
    ChatUnsupported(Feature),

    #[error("Conversation history is disabled")]
    HistoryDisabled,
}

impl FeatureError {
    /// Splits an adapter failure into template and model errors.
    pub(crate) fn from_invoke(err: anyhow::Error) -> Self {
        match err.downcast::<TemplateError>() {
            Ok(template) => Self::Template(template),
            Err(other) => Self::Model(other),
        }
    }
}
