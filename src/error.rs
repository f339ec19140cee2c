//! Error types shared across the quiz library.

use thiserror::Error;

/// Errors emitted by the key-value progress backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("progress store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode progress: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors emitted while loading quiz data or resolving a result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    /// Fatal: the scoring configuration or category registry is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The caller handed over input the engine refuses to coerce.
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuizError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Returns true for the only error class a caller should paper over
    /// with a fallback category.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configuration() {
        assert!(QuizError::config("no categories").is_configuration());
        assert!(!QuizError::validation("length").is_configuration());
    }

    #[test]
    fn test_display() {
        let err = QuizError::validation("expected 14 answers, got 13");
        assert_eq!(
            err.to_string(),
            "validation error: expected 14 answers, got 13"
        );
    }
}
