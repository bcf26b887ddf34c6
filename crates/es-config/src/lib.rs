//! Scrub rule configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for JSON and TOML rules files
//! - Rules file resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Provenance (source and content hash) for the loaded rules

pub mod error;
pub mod load;
pub mod resolve;
pub mod rules;
pub mod validate;

pub use error::ConfigError;
pub use load::{load_rules, read_rules_file, LoadOptions, LoadedRules};
pub use resolve::{resolve_rules_path, ConfigSource, ResolvedPath};
pub use rules::{KeysConfig, RuleSpec, RulesFile, RulesFormat, StructuredTransform, TransformConfig};
pub use validate::{validate_rules, ValidationError, ValidationResult};

/// Schema version for rules files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
