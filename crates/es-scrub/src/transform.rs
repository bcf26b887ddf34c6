//! Resolution of configured transforms into scrub functions.
//!
//! A rule's transform is given as a [`Mask`], as the name of a built-in, or
//! as a `module.function` reference to a mask the application registered in
//! an [`ExternalRegistry`]. Resolution happens once, when the rule is built,
//! so scrubbing never looks anything up.

use crate::error::{MaskError, RuleError};
use crate::mask::{scrub, scrub_cookies, scrub_query_string, KeySelection, Mask};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Built-in scrub functions by name.
static BUILTINS: &[(&str, fn() -> Mask)] = &[
    ("scrub", builtin_scrub),
    ("scrub_cookies", builtin_scrub_cookies),
    ("scrub_query_string", builtin_scrub_query_string),
];

fn builtin_scrub() -> Mask {
    Mask::new("scrub", scrub)
}

fn builtin_scrub_cookies() -> Mask {
    scrub_cookies(KeySelection::All)
}

fn builtin_scrub_query_string() -> Mask {
    scrub_query_string(KeySelection::All)
}

/// Dotted identifier with at least one dot.
static EXTERNAL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)+$").unwrap()
});

/// Look up a built-in scrub function.
pub fn builtin(name: &str) -> Option<Mask> {
    BUILTINS
        .iter()
        .find(|(builtin_name, _)| *builtin_name == name)
        .map(|(_, build)| build())
}

/// Names of the built-in scrub functions.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// A transform as configured, before resolution.
#[derive(Debug, Clone)]
pub enum TransformSpec {
    /// Name of a built-in.
    BuiltIn(String),
    /// `module.function` reference into an [`ExternalRegistry`].
    External { module: String, function: String },
    /// A function given directly.
    Direct(Mask),
}

impl TransformSpec {
    /// Parse transform text.
    ///
    /// Built-in names win over references; anything else must be a dotted
    /// identifier, split at its last dot.
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        if builtin_names().any(|name| name == text) {
            return Ok(TransformSpec::BuiltIn(text.to_string()));
        }

        if EXTERNAL_REFERENCE.is_match(text) {
            if let Some((module, function)) = text.rsplit_once('.') {
                return Ok(TransformSpec::External {
                    module: module.to_string(),
                    function: function.to_string(),
                });
            }
        }

        Err(RuleError::UnknownTransform(text.to_string()))
    }

    /// Resolve into a callable mask.
    pub fn resolve(self, registry: &ExternalRegistry) -> Result<Mask, RuleError> {
        match self {
            TransformSpec::BuiltIn(name) => {
                builtin(&name).ok_or(RuleError::UnknownTransform(name))
            }
            TransformSpec::External { module, function } => registry.lookup(&module, &function),
            TransformSpec::Direct(mask) => Ok(mask),
        }
    }
}

impl From<Mask> for TransformSpec {
    fn from(mask: Mask) -> Self {
        TransformSpec::Direct(mask)
    }
}

/// Anything a rule accepts as its transform.
pub trait IntoTransform {
    fn into_transform(self) -> Result<TransformSpec, RuleError>;
}

impl IntoTransform for TransformSpec {
    fn into_transform(self) -> Result<TransformSpec, RuleError> {
        Ok(self)
    }
}

impl IntoTransform for Mask {
    fn into_transform(self) -> Result<TransformSpec, RuleError> {
        Ok(TransformSpec::Direct(self))
    }
}

impl IntoTransform for &str {
    fn into_transform(self) -> Result<TransformSpec, RuleError> {
        TransformSpec::parse(self)
    }
}

impl IntoTransform for String {
    fn into_transform(self) -> Result<TransformSpec, RuleError> {
        TransformSpec::parse(&self)
    }
}

/// Scrub functions the application exposes to rules by reference.
///
/// Functions are grouped by module, so a reference can fail on either half:
/// an unknown module or a module without that function.
#[derive(Debug, Clone, Default)]
pub struct ExternalRegistry {
    modules: HashMap<String, HashMap<String, Mask>>,
}

impl ExternalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module.function`.
    pub fn register<F>(&mut self, module: &str, function: &str, func: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value, MaskError> + Send + Sync + 'static,
    {
        let mask = Mask::new(format!("{module}.{function}"), func);
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(function.to_string(), mask);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, module: &str, function: &str, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, MaskError> + Send + Sync + 'static,
    {
        self.register(module, function, func);
        self
    }

    pub fn lookup(&self, module: &str, function: &str) -> Result<Mask, RuleError> {
        let functions = self
            .modules
            .get(module)
            .ok_or_else(|| RuleError::UnknownModule {
                module: module.to_string(),
            })?;

        functions
            .get(function)
            .cloned()
            .ok_or_else(|| RuleError::UnknownFunction {
                module: module.to_string(),
                function: function.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hide_letter_a(value: Value) -> Result<Value, MaskError> {
        match value {
            Value::String(s) => Ok(Value::String(s.replace('a', "*"))),
            _ => Err(MaskError::new("expected a string")),
        }
    }

    #[test]
    fn test_builtin_lookup() {
        let mask = builtin("scrub").unwrap();
        assert_eq!(mask.apply(json!("x")).unwrap(), json!("[Scrubbed]"));
        assert!(builtin("scrub_cookies").is_some());
        assert!(builtin("scrub_query_string").is_some());
        assert!(builtin("nope").is_none());
    }

    #[test]
    fn test_builtin_names() {
        let names: Vec<_> = builtin_names().collect();
        assert_eq!(names, vec!["scrub", "scrub_cookies", "scrub_query_string"]);
    }

    #[test]
    fn test_parse_builtin() {
        assert!(matches!(
            TransformSpec::parse("scrub").unwrap(),
            TransformSpec::BuiltIn(name) if name == "scrub"
        ));
    }

    #[test]
    fn test_parse_external_splits_at_last_dot() {
        match TransformSpec::parse("myapp.scrubbers.hide_letter_a").unwrap() {
            TransformSpec::External { module, function } => {
                assert_eq!(module, "myapp.scrubbers");
                assert_eq!(function, "hide_letter_a");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_text() {
        for text in ["nope", "", "a.", ".a", "a b.c", "a..b"] {
            assert!(
                matches!(
                    TransformSpec::parse(text),
                    Err(RuleError::UnknownTransform(_))
                ),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_external() {
        let registry = ExternalRegistry::new().with("myapp.scrubbers", "hide_letter_a", hide_letter_a);
        let mask = TransformSpec::parse("myapp.scrubbers.hide_letter_a")
            .unwrap()
            .resolve(&registry)
            .unwrap();
        assert_eq!(mask.name(), "myapp.scrubbers.hide_letter_a");
        assert_eq!(mask.apply(json!("banana")).unwrap(), json!("b*n*n*"));
    }

    #[test]
    fn test_resolve_unknown_module() {
        let registry = ExternalRegistry::new();
        let err = TransformSpec::parse("missing.func")
            .unwrap()
            .resolve(&registry)
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::UnknownModule {
                module: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_unknown_function() {
        let registry = ExternalRegistry::new().with("myapp", "hide", hide_letter_a);
        let err = TransformSpec::parse("myapp.show")
            .unwrap()
            .resolve(&registry)
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::UnknownFunction {
                module: "myapp".to_string(),
                function: "show".to_string()
            }
        );
    }

    #[test]
    fn test_direct_passes_through() {
        let mask = Mask::new("custom", |_| Ok(json!("x")));
        let resolved = mask
            .into_transform()
            .unwrap()
            .resolve(&ExternalRegistry::new())
            .unwrap();
        assert_eq!(resolved.name(), "custom");
    }
}
