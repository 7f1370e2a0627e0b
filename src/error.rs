//! Error types for the backend pool provider.
//!
//! This module provides the error hierarchy for every stage of a lifecycle
//! callback: configuration, ARM API calls, provisioning-state polling,
//! the lifecycle operations themselves, and the local state file.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// ARM management API errors.
    #[error("ARM API error: {0}")]
    Arm(#[from] ArmError),

    /// Provisioning-state polling errors.
    #[error("Polling error: {0}")]
    Poll(#[from] PollError),

    /// Lifecycle operation errors.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Local state file errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// ARM management API errors.
#[derive(Debug, Error)]
pub enum ArmError {
    /// Authentication failed.
    #[error("ARM authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed.
    #[error("ARM request failed: {status} {code} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// ARM error code (e.g. `InvalidResourceReference`).
        code: String,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited.
    #[error("ARM API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with ARM: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response from ARM: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// A resource identifier could not be parsed.
    #[error("Invalid resource ID {id:?}: {reason}")]
    InvalidResourceId {
        /// The offending identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The resource disappeared while an operation was in flight.
    #[error("Resource not found: {id}")]
    ResourceNotFound {
        /// Identifier of the missing resource.
        id: String,
    },
}

/// Provisioning-state polling errors.
#[derive(Debug, Error)]
pub enum PollError {
    /// The observed state is neither pending nor a target state.
    #[error("Unexpected state '{state}' for {resource}, wanted one of: {}", .expected.join(", "))]
    UnexpectedState {
        /// Resource being waited on.
        resource: String,
        /// State that was observed.
        state: String,
        /// Target states.
        expected: Vec<String>,
    },

    /// The deadline elapsed while the state was still pending.
    #[error("Timeout after {elapsed:?} waiting for {resource} (last state: {last_state})")]
    Timeout {
        /// Resource being waited on.
        resource: String,
        /// Time spent waiting.
        elapsed: Duration,
        /// Last observed pending state.
        last_state: String,
    },

    /// The wait was cancelled by the caller.
    #[error("Cancelled while waiting for {resource}")]
    Cancelled {
        /// Resource being waited on.
        resource: String,
    },
}

/// Lifecycle operation errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The API accepted an update but did not return a usable identifier.
    #[error("Cannot read {resource} (resource group {resource_group}) ID: {reason}")]
    InconsistentResponse {
        /// Resource that should have been identified.
        resource: String,
        /// Resource group of the resource.
        resource_group: String,
        /// What was missing.
        reason: String,
    },

    /// A remote call failed during an operation.
    #[error("Error {operation} {resource} (resource group {resource_group}): {source}")]
    Operation {
        /// What the operation was doing (e.g. "making Read request on").
        operation: &'static str,
        /// Resource name.
        resource: String,
        /// Resource group.
        resource_group: String,
        /// Underlying error.
        #[source]
        source: Box<ProviderError>,
    },

    /// A required configuration field was not set.
    #[error("Field '{field}' is required for {resource}")]
    MissingField {
        /// Field name.
        field: &'static str,
        /// Resource type.
        resource: String,
    },
}

/// Local state file errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Writing the state file failed.
    #[error("Failed to write state: {message}")]
    WriteFailed {
        /// Description of the failure.
        message: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// State version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state version.
        expected: String,
        /// Found state version.
        found: String,
    },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is transient.
    ///
    /// The lifecycle handler never retries on its own; this is for callers
    /// that choose to.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Arm(ArmError::RateLimited { .. } | ArmError::NetworkError { .. }) => true,
            Self::Lifecycle(LifecycleError::Operation { source, .. }) => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Arm(ArmError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            Self::Arm(ArmError::NetworkError { .. }) => Some(5),
            Self::Lifecycle(LifecycleError::Operation { source, .. }) => source.retry_delay_secs(),
            _ => None,
        }
    }

    /// Returns true if this error is a cancelled wait.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Poll(PollError::Cancelled { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl ArmError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid resource ID error.
    #[must_use]
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl LifecycleError {
    /// Wraps an error with the resource it was raised for.
    #[must_use]
    pub fn operation(
        operation: &'static str,
        resource: impl Into<String>,
        resource_group: impl Into<String>,
        source: ProviderError,
    ) -> Self {
        Self::Operation {
            operation,
            resource: resource.into(),
            resource_group: resource_group.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_carries_context() {
        let err = ProviderError::Lifecycle(LifecycleError::operation(
            "making Read request on",
            "lb1",
            "rg1",
            ProviderError::Arm(ArmError::network("connection reset")),
        ));

        let message = err.to_string();
        assert!(message.contains("lb1"));
        assert!(message.contains("rg1"));
        assert!(message.contains("connection reset"));
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay_secs(), Some(5));
    }

    #[test]
    fn test_poll_errors_are_not_retryable() {
        let err = ProviderError::Poll(PollError::UnexpectedState {
            resource: String::from("lb1"),
            state: String::from("Failed"),
            expected: vec![String::from("Succeeded")],
        });

        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Failed"));
        assert!(!err.is_cancelled());
    }
}
