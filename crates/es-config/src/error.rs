//! Errors raised while loading a rules file.

use crate::validate::ValidationError;
use es_scrub::RuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading rules.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Rules file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {format} in rules file {path}: {message}")]
    ParseError {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Rules validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Rule {index} ({rule_path:?}) could not be built: {source}")]
    RuleError {
        index: usize,
        rule_path: String,
        #[source]
        source: RuleError,
    },
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 50,
            ConfigError::IoError { .. } => 51,
            ConfigError::ParseError { .. } => 52,
            ConfigError::ValidationError(inner) => inner.code(),
            ConfigError::RuleError { .. } => 53,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ConfigError::NotFound {
                path: PathBuf::from("rules.json"),
            },
            ConfigError::ParseError {
                path: PathBuf::from("rules.toml"),
                format: "TOML",
                message: "bad".to_string(),
            },
            ConfigError::RuleError {
                index: 0,
                rule_path: "a".to_string(),
                source: RuleError::UnknownTransform("x".to_string()),
            },
            ConfigError::ValidationError(ValidationError::SemanticError("x".to_string())),
        ];
        let mut codes: Vec<u32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_rule_error_message() {
        let err = ConfigError::RuleError {
            index: 2,
            rule_path: "request".to_string(),
            source: RuleError::UnknownTransform("nope".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Rule 2 (\"request\") could not be built: nope is not a built-in scrub function or a module.function reference"
        );
    }
}
