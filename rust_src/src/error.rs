//! Engine error types.
//!
//! Numeric degeneracies (no responses, zero information, an exhausted pool)
//! are reported through fallback values and `Option`s, not through this type.
//! `EngineError` covers caller precondition violations and loading failures.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Percentile lookup against a normative distribution with no scores.
    #[error("normative distribution is empty")]
    EmptyDistribution,

    /// An answer referenced an item that is not in the pool.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The selected option index does not exist on the item.
    #[error("option {selected} out of range for item {item_id} ({options} options)")]
    OptionOutOfRange {
        item_id: String,
        selected: usize,
        options: usize,
    },

    /// The item has already been answered in this session.
    #[error("item already answered: {0}")]
    AlreadyAnswered(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// An answer arrived after the session already terminated.
    #[error("session already finished")]
    SessionFinished,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse norms: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Returns `true` if the error came from a malformed answer event rather
    /// than from engine setup.
    pub fn is_answer_error(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownItem(_)
                | EngineError::OptionOutOfRange { .. }
                | EngineError::AlreadyAnswered(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_errors_are_classified() {
        assert!(EngineError::UnknownItem("q1".into()).is_answer_error());
        assert!(EngineError::AlreadyAnswered("q1".into()).is_answer_error());
        assert!(!EngineError::EmptyDistribution.is_answer_error());
        assert!(!EngineError::InvalidConfig("x".into()).is_answer_error());
    }

    #[test]
    fn display_includes_context() {
        let err = EngineError::OptionOutOfRange {
            item_id: "q7".into(),
            selected: 5,
            options: 4,
        };
        assert_eq!(
            err.to_string(),
            "option 5 out of range for item q7 (4 options)"
        );
    }
}
