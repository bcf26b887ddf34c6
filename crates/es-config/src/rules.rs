//! Rules file model.
//!
//! A rules file is JSON or TOML:
//!
//! ```toml
//! schema_version = "1.0.0"
//! include_defaults = true
//!
//! [[rules]]
//! path = "request.headers"
//! keys = ["Auth-Token", "Cookie"]
//! transform = "scrub"
//!
//! [[rules]]
//! path = "request"
//! keys = ["cookies"]
//! transform = { cookies = ["code", "state"] }
//! ```

use crate::error::ConfigError;
use es_scrub::{
    default_rules, scrub_cookies, scrub_query_string, ExternalRegistry, KeySelection, Rule,
    Scrubber, TransformSpec,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    /// Schema version for compatibility checking.
    pub schema_version: String,

    /// Run the built-in rules before the ones listed here.
    #[serde(default = "default_true")]
    pub include_defaults: bool,

    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_true() -> bool {
    true
}

impl Default for RulesFile {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            include_defaults: true,
            rules: Vec::new(),
        }
    }
}

/// One configured rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Dotted path; `[]` fans out over arrays, empty means the event root.
    #[serde(default)]
    pub path: String,

    pub keys: Vec<String>,

    #[serde(default)]
    pub transform: TransformConfig,
}

/// How a rule scrubs its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformConfig {
    /// Built-in name or `module.function` reference.
    Named(String),
    /// Structured mask limited to some names.
    Structured(StructuredTransform),
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig::Named("scrub".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredTransform {
    Cookies(KeysConfig),
    QueryString(KeysConfig),
}

/// Names a structured mask scrubs: a list, or `"*"` for all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KeysRepr", into = "KeysRepr")]
pub enum KeysConfig {
    All,
    Named(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum KeysRepr {
    Wildcard(String),
    Names(Vec<String>),
}

impl TryFrom<KeysRepr> for KeysConfig {
    type Error = String;

    fn try_from(repr: KeysRepr) -> Result<Self, Self::Error> {
        match repr {
            KeysRepr::Wildcard(text) if text == "*" => Ok(KeysConfig::All),
            KeysRepr::Wildcard(text) => Err(format!(
                "expected a list of names or \"*\", got {text:?}"
            )),
            KeysRepr::Names(names) => Ok(KeysConfig::Named(names)),
        }
    }
}

impl From<KeysConfig> for KeysRepr {
    fn from(keys: KeysConfig) -> Self {
        match keys {
            KeysConfig::All => KeysRepr::Wildcard("*".to_string()),
            KeysConfig::Named(names) => KeysRepr::Names(names),
        }
    }
}

impl KeysConfig {
    pub fn selection(&self) -> KeySelection {
        match self {
            KeysConfig::All => KeySelection::All,
            KeysConfig::Named(names) => KeySelection::named(names.iter().cloned()),
        }
    }
}

impl TransformConfig {
    /// Convert into the library's transform form.
    pub fn to_spec(&self) -> Result<TransformSpec, es_scrub::RuleError> {
        match self {
            TransformConfig::Named(text) => TransformSpec::parse(text),
            TransformConfig::Structured(StructuredTransform::Cookies(keys)) => {
                Ok(TransformSpec::Direct(scrub_cookies(keys.selection())))
            }
            TransformConfig::Structured(StructuredTransform::QueryString(keys)) => {
                Ok(TransformSpec::Direct(scrub_query_string(keys.selection())))
            }
        }
    }
}

/// File formats a rules file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesFormat {
    Json,
    Toml,
}

impl RulesFormat {
    /// Pick the format from the file extension. Anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => RulesFormat::Toml,
            _ => RulesFormat::Json,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RulesFormat::Json => "JSON",
            RulesFormat::Toml => "TOML",
        }
    }
}

impl RulesFile {
    /// Parse file content in the given format.
    pub fn parse(content: &str, format: RulesFormat) -> Result<Self, String> {
        match format {
            RulesFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            RulesFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Build the configured scrubber.
    ///
    /// External references resolve against `registry`. The file should have
    /// passed [`validate_rules`](crate::validate_rules) first.
    pub fn build(&self, registry: &ExternalRegistry) -> Result<Scrubber, ConfigError> {
        let mut rules: Vec<Rule> = if self.include_defaults {
            default_rules()
        } else {
            Vec::new()
        };

        for (index, spec) in self.rules.iter().enumerate() {
            let to_error = |source| ConfigError::RuleError {
                index,
                rule_path: spec.path.clone(),
                source,
            };
            let transform = spec.transform.to_spec().map_err(to_error)?;
            let rule = Rule::with_registry(&spec.path, spec.keys.iter().cloned(), transform, registry)
                .map_err(to_error)?;
            rules.push(rule);
        }

        Ok(Scrubber::new(rules))
    }
}
