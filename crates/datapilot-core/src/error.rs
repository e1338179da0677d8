//! Application-wide error types

use thiserror::Error;

/// Top-level error shared by every DataPilot crate.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true when the error was caused by caller input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::validation("threshold out of range");
        assert_eq!(err.to_string(), "Validation error: threshold out of range");
        assert!(err.is_client_error());

        let err = AppError::internal("boom");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_from_config_error() {
        let err: AppError = config::ConfigError::Message("bad key".to_string()).into();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
