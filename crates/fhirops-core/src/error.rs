use thiserror::Error;

/// Core error types for fhirops value handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid Parameters resource: {message}")]
    InvalidParameters { message: String },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidParameters error
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new InvalidReference error
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Self::InvalidReference(reference.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidParameters { .. } | Self::InvalidReference(_) => ErrorCategory::Validation,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
