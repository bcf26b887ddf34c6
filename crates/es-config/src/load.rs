//! Loading rules with provenance.

use crate::error::ConfigError;
use crate::resolve::{resolve_rules_path, ConfigSource};
use crate::rules::{RulesFile, RulesFormat};
use crate::validate::validate_rules;
use es_scrub::{ExternalRegistry, Scrubber};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A scrubber built from configuration, with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedRules {
    pub scrubber: Scrubber,
    /// Path to the rules file (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// SHA-256 hash of the rules file content (None if using defaults).
    pub sha256: Option<String>,
    /// Validation warnings.
    pub warnings: Vec<String>,
}

/// Options for [`load_rules`].
#[derive(Debug, Default)]
pub struct LoadOptions {
    /// Explicit rules file (highest priority).
    pub rules_path: Option<PathBuf>,
    /// Scrub functions that `module.function` transforms may name.
    pub registry: ExternalRegistry,
}

/// Load rules using the standard resolution order.
///
/// With nothing configured the built-in rules apply.
pub fn load_rules(options: &LoadOptions) -> Result<LoadedRules, ConfigError> {
    let resolved = resolve_rules_path(options.rules_path.as_deref());

    let Some(path) = resolved.path else {
        tracing::debug!(source = %resolved.source, "using built-in scrub rules");
        return Ok(LoadedRules {
            scrubber: Scrubber::default(),
            path: None,
            source: resolved.source,
            sha256: None,
            warnings: Vec::new(),
        });
    };

    let (file, sha256) = read_rules_file(&path)?;
    let warnings = validate_rules(&file)?;
    let scrubber = file.build(&options.registry)?;

    tracing::debug!(
        path = %path.display(),
        source = %resolved.source,
        rules = scrubber.rules().len(),
        sha256 = %sha256,
        "loaded scrub rules"
    );

    Ok(LoadedRules {
        scrubber,
        path: Some(path),
        source: resolved.source,
        sha256: Some(sha256),
        warnings,
    })
}

/// Read and parse a rules file, returning it with the hash of its content.
pub fn read_rules_file(path: &Path) -> Result<(RulesFile, String), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let hash = compute_hash(&content);

    let format = RulesFormat::from_path(path);
    let file = RulesFile::parse(&content, format).map_err(|message| ConfigError::ParseError {
        path: path.to_path_buf(),
        format: format.name(),
        message,
    })?;

    Ok((file, hash))
}

/// Compute SHA-256 hash of a string.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
