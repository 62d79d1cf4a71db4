//! Error taxonomy for registration, resolution, binding, and invocation.
//!
//! Callers need to tell apart "operation does not exist", "operation exists
//! but not for this request shape", and "operation ran but failed" — each
//! variant carries enough context to do so without string matching.

use thiserror::Error;

use crate::descriptor::OperationScope;

/// Error type for operation registration and dispatch failures.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Registration-time: a descriptor declares an unusable parameter list.
    #[error("Invalid signature for operation ${operation}: {message}")]
    InvalidSignature { operation: String, message: String },

    /// Registration-time: a provider exposes no operations.
    #[error("No operations found on provider '{provider}'")]
    NoOperationsFound { provider: String },

    /// Dispatch-time: nothing registered under the requested name.
    #[error("Unknown operation: ${operation}")]
    UnknownOperation { operation: String },

    /// Dispatch-time: the name is registered, but not at the request's scope.
    #[error("Operation ${operation} is not defined at {scope} level")]
    NoOperationForScope {
        operation: String,
        scope: OperationScope,
    },

    /// Dispatch-time: the name and scope match, but not the resource type.
    #[error("Operation ${operation} is not defined for type {resource_type}")]
    NoOperationForType {
        operation: String,
        resource_type: String,
    },

    /// Dispatch-time: more than one registration matches name, scope and type.
    #[error("Operation ${operation} has {count} registrations matching the request")]
    AmbiguousOperation { operation: String, count: usize },

    /// Binding-time: a required named parameter has no matching entry.
    #[error("Missing required parameter '{parameter}' for operation ${operation}")]
    MissingParameter {
        operation: String,
        parameter: String,
    },

    /// Binding-time: a single-valued parameter was supplied more than once.
    #[error("Parameter '{parameter}' supplied more than once for operation ${operation}")]
    DuplicateParameter {
        operation: String,
        parameter: String,
    },

    /// Binding-time: entries remain after every declared binder has run.
    #[error("Unexpected parameters for operation ${operation}: {}", .names.join(", "))]
    UnconsumedParameters {
        operation: String,
        names: Vec<String>,
    },

    /// The handler itself failed; the underlying cause is preserved.
    #[error("Operation ${operation} failed")]
    InvocationFailed {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
}

impl OperationError {
    /// Create a new InvalidSignature error
    pub fn invalid_signature(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSignature {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new NoOperationsFound error
    pub fn no_operations_found(provider: impl Into<String>) -> Self {
        Self::NoOperationsFound {
            provider: provider.into(),
        }
    }

    /// Create a new UnknownOperation error
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Create a new NoOperationForScope error
    pub fn no_operation_for_scope(operation: impl Into<String>, scope: OperationScope) -> Self {
        Self::NoOperationForScope {
            operation: operation.into(),
            scope,
        }
    }

    /// Create a new NoOperationForType error
    pub fn no_operation_for_type(
        operation: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self::NoOperationForType {
            operation: operation.into(),
            resource_type: resource_type.into(),
        }
    }

    /// Create a new MissingParameter error
    pub fn missing_parameter(operation: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            operation: operation.into(),
            parameter: parameter.into(),
        }
    }

    /// Create a new DuplicateParameter error
    pub fn duplicate_parameter(operation: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::DuplicateParameter {
            operation: operation.into(),
            parameter: parameter.into(),
        }
    }

    /// Create a new InvocationFailed error wrapping the handler's cause
    pub fn invocation_failed(operation: impl Into<String>, source: anyhow::Error) -> Self {
        Self::InvocationFailed {
            operation: operation.into(),
            source,
        }
    }

    /// Get error kind for logging/monitoring
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSignature { .. } | Self::NoOperationsFound { .. } => {
                ErrorKind::Registration
            }
            Self::UnknownOperation { .. }
            | Self::NoOperationForScope { .. }
            | Self::NoOperationForType { .. }
            | Self::AmbiguousOperation { .. } => ErrorKind::Resolution,
            Self::MissingParameter { .. }
            | Self::DuplicateParameter { .. }
            | Self::UnconsumedParameters { .. } => ErrorKind::Binding,
            Self::InvocationFailed { .. } => ErrorKind::Invocation,
        }
    }

    /// True for errors the caller fixes by changing the request.
    pub fn is_request_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Resolution | ErrorKind::Binding)
    }

    /// True for errors that indicate a registration defect.
    pub fn is_registration_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Registration)
            || matches!(self, Self::AmbiguousOperation { .. })
    }
}

/// Error kinds for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Registration,
    Resolution,
    Binding,
    Invocation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Resolution => write!(f, "resolution"),
            Self::Binding => write!(f, "binding"),
            Self::Invocation => write!(f, "invocation"),
        }
    }
}

/// Convenience result type for engine operations
pub type Result<T> = std::result::Result<T, OperationError>;
