//! Error types for the Glimpse engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Incomplete vote set: missing {missing:?}, unexpected {unexpected:?}")]
    IncompleteVoteSet {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Invalid vote encoding for slot '{slot}': {value}")]
    InvalidVoteEncoding { slot: String, value: String },

    #[error("Unrecognized risk tier: '{0}'")]
    UnrecognizedRiskTier(String),

    #[error("Unexpected prediction response: {0}")]
    UnexpectedResponse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn code(&self) -> i32 {
        match self {
            EngineError::IncompleteVoteSet { .. } => -32010,
            EngineError::InvalidVoteEncoding { .. } => -32011,
            EngineError::UnrecognizedRiskTier(_) => -32012,
            EngineError::UnexpectedResponse(_) => -32013,
            EngineError::Config(_) => -32020,
            EngineError::Store(_) => -32021,
            EngineError::Io(_) => -32006,
            EngineError::Json(_) => -32700,
        }
    }

    /// Errors that only abort the one prediction being classified.
    pub fn is_classification_error(&self) -> bool {
        matches!(
            self,
            EngineError::IncompleteVoteSet { .. }
                | EngineError::InvalidVoteEncoding { .. }
                | EngineError::UnrecognizedRiskTier(_)
                | EngineError::UnexpectedResponse(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
