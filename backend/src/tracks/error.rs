//! Error types for the track engine.

/// Result type for track engine operations.
pub type TrackResult<T> = Result<T, TrackError>;

/// Error type for track parsing, merging and validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackError {
    /// Input is empty or structurally inconsistent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A file's bytes are not a readable track document.
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
}

impl TrackError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
