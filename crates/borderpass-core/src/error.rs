use thiserror::Error;

/// Core error type for BorderPass operations.
#[derive(Error, Debug)]
pub enum BorderpassError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BorderpassError {
    /// Whether the caller can act on this error (as opposed to a server fault).
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Internal(_) | Self::Database(_) | Self::Sql(_) | Self::Io(_) | Self::Config(_)
        )
    }
}

impl From<serde_json::Error> for BorderpassError {
    fn from(e: serde_json::Error) -> Self {
        BorderpassError::Serialization(e.to_string())
    }
}

/// Result type alias using BorderpassError.
pub type Result<T> = std::result::Result<T, BorderpassError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BorderpassError::InvalidTransition("process 3 is not under review".into());
        assert_eq!(
            err.to_string(),
            "Invalid transition: process 3 is not under review"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(BorderpassError::NotFound("x".into()).is_recoverable());
        assert!(BorderpassError::AccessDenied("x".into()).is_recoverable());
        assert!(BorderpassError::Validation("x".into()).is_recoverable());
        assert!(!BorderpassError::Internal("x".into()).is_recoverable());
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BorderpassError = parse_err.into();
        assert!(matches!(err, BorderpassError::Serialization(_)));
    }
}
