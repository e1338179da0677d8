//! NLP-specific error types

use thiserror::Error;

/// NLP-specific error types
#[derive(Error, Debug)]
pub enum NlpError {
    #[error("Invalid LLM fallback threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f64),

    #[error("Pattern configuration error: {0}")]
    PatternConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM fallback error: {0}")]
    Fallback(String),
}

impl NlpError {
    pub fn pattern_config(msg: impl Into<String>) -> Self {
        Self::PatternConfig(msg.into())
    }

    pub fn fallback(msg: impl Into<String>) -> Self {
        Self::Fallback(msg.into())
    }
}

/// Result type for NLP operations
pub type Result<T> = std::result::Result<T, NlpError>;

// Convert to datapilot_core AppError
impl From<NlpError> for datapilot_core::AppError {
    fn from(err: NlpError) -> Self {
        match err {
            NlpError::InvalidThreshold(_) => datapilot_core::AppError::validation(err.to_string()),
            NlpError::PatternConfig(msg) => datapilot_core::AppError::configuration(msg),
            NlpError::Io(e) => datapilot_core::AppError::configuration(e.to_string()),
            NlpError::Fallback(msg) => datapilot_core::AppError::internal(msg),
        }
    }
}
