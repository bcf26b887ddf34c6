//! Rules validation errors and semantic validation.

use crate::rules::{KeysConfig, RulesFile, StructuredTransform, TransformConfig};
use es_scrub::RulePath;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rules validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: String, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        message: message.into(),
    }
}

/// Validate a rules file semantically.
///
/// Returns the warnings found; duplicate names are a warning because they are
/// collapsed when the rule is built.
pub fn validate_rules(file: &RulesFile) -> ValidationResult<Vec<String>> {
    if file.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: file.schema_version.clone(),
        });
    }

    if file.rules.is_empty() && !file.include_defaults {
        return Err(ValidationError::SemanticError(
            "no rules configured and include_defaults is false".to_string(),
        ));
    }

    let mut warnings = Vec::new();

    for (index, rule) in file.rules.iter().enumerate() {
        if let Err(err) = RulePath::parse(&rule.path) {
            return Err(invalid(format!("rules[{index}].path"), err.to_string()));
        }

        validate_names(
            &format!("rules[{index}].keys"),
            &rule.keys,
            &mut warnings,
        )?;

        match &rule.transform {
            TransformConfig::Named(name) if name.is_empty() => {
                return Err(invalid(
                    format!("rules[{index}].transform"),
                    "transform name must not be empty",
                ));
            }
            TransformConfig::Named(_) => {}
            TransformConfig::Structured(
                StructuredTransform::Cookies(keys) | StructuredTransform::QueryString(keys),
            ) => {
                if let KeysConfig::Named(names) = keys {
                    validate_names(
                        &format!("rules[{index}].transform"),
                        names,
                        &mut warnings,
                    )?;
                }
            }
        }
    }

    for warning in &warnings {
        tracing::warn!(target: "es_config::validate", "{}", warning);
    }

    Ok(warnings)
}

fn validate_names(field: &str, names: &[String], warnings: &mut Vec<String>) -> ValidationResult<()> {
    if names.is_empty() {
        return Err(invalid(field.to_string(), "at least one name is required"));
    }

    for (position, name) in names.iter().enumerate() {
        if name.is_empty() {
            return Err(invalid(
                field.to_string(),
                format!("name {position} is empty"),
            ));
        }
        if names[..position].contains(name) {
            warnings.push(format!("{field}: duplicate name {name:?} ignored"));
        }
    }

    Ok(())
}
