//! Protocol error taxonomy.
//!
//! Every failure that crosses the tool-protocol boundary is one of these
//! kinds. Raw store errors never leave the execution engine; they are
//! classified here first. Only `Connectivity` and `Timeout` are retryable —
//! everything else requires the caller to change its input.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the neobridge tool protocol.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Duplicate operation: {0}")]
    DuplicateOperation(String),

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Invalid label or property key: {0}")]
    InvalidLabel(String),

    #[error("Write not permitted: {0}")]
    WriteNotPermitted(String),

    #[error("Connectivity failure: {0}")]
    Connectivity(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Query syntax error: {0}")]
    Syntax(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Stable wire identifier for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "unknown_operation",
            Self::DuplicateOperation(_) => "duplicate_operation",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::InvalidLabel(_) => "invalid_label",
            Self::WriteNotPermitted(_) => "write_not_permitted",
            Self::Connectivity(_) => "connectivity_failure",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Syntax(_) => "syntax_error",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the caller may retry the same invocation unchanged.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Timeout(_))
    }

    /// The offending field, for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ToolError::UnknownOperation("x".into()).kind(), "unknown_operation");
        assert_eq!(
            ToolError::InvalidArgument {
                field: "limit".into(),
                reason: "must be positive".into()
            }
            .kind(),
            "invalid_argument"
        );
        assert_eq!(ToolError::Timeout(Duration::from_secs(30)).kind(), "timeout");
    }

    #[test]
    fn only_connectivity_and_timeout_are_retryable() {
        assert!(ToolError::Connectivity("pool exhausted".into()).retryable());
        assert!(ToolError::Timeout(Duration::from_secs(1)).retryable());

        assert!(!ToolError::UnknownOperation("x".into()).retryable());
        assert!(!ToolError::ConstraintViolation("dup".into()).retryable());
        assert!(!ToolError::Syntax("bad".into()).retryable());
        assert!(!ToolError::WriteNotPermitted("CREATE".into()).retryable());
        assert!(!ToolError::InvalidLabel("9bad".into()).retryable());
    }

    #[test]
    fn invalid_argument_exposes_field() {
        let err = ToolError::InvalidArgument {
            field: "labels".into(),
            reason: "required".into(),
        };
        assert_eq!(err.field(), Some("labels"));
        assert_eq!(ToolError::Syntax("x".into()).field(), None);
    }
}
