//! Error types for the scrubbing engine.
//!
//! Only [`RuleError`] ever reaches a caller: it is returned while rules are
//! being built. Everything raised while scrubbing an event is contained by
//! the [`Scrubber`](crate::Scrubber) and surfaces through the error handler
//! and the log instead.

use thiserror::Error;

/// Result type for rule construction.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Errors raised while building a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The path text could not be parsed.
    #[error("invalid rule path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The transform text is neither a built-in name nor a dotted reference.
    #[error("{0} is not a built-in scrub function or a module.function reference")]
    UnknownTransform(String),

    /// The module part of an external reference is not registered.
    #[error("module {module:?} is not registered")]
    UnknownModule { module: String },

    /// The module exists but does not export the function.
    #[error("{module}.{function} does not exist")]
    UnknownFunction { module: String, function: String },
}

/// A wildcard segment met something that is not an array.
///
/// Raised during traversal and always caught at the rule boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("path '{partial_path}' doesn't match event structure")]
pub struct PathMismatchError {
    /// The path consumed so far, up to and including the wildcard.
    pub partial_path: String,
}

/// A scrub function failed on a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MaskError {
    message: String,
}

impl MaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned by an error handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_mismatch_message() {
        let err = PathMismatchError {
            partial_path: "request.[]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "path 'request.[]' doesn't match event structure"
        );
    }

    #[test]
    fn test_unknown_function_message() {
        let err = RuleError::UnknownFunction {
            module: "myapp.scrubbers".to_string(),
            function: "hide".to_string(),
        };
        assert_eq!(err.to_string(), "myapp.scrubbers.hide does not exist");
    }

    #[test]
    fn test_mask_error_message() {
        let err = MaskError::new("scruberror");
        assert_eq!(err.to_string(), "scruberror");
        assert_eq!(err.message(), "scruberror");
    }
}
