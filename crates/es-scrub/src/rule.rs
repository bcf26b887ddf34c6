//! Scrub rules.

use crate::error::Result;
use crate::mask::{scrub, Mask};
use crate::path::{RulePath, Segment};
use crate::transform::{ExternalRegistry, IntoTransform};
use std::fmt;

/// Path to the frame-local variables of every stack frame of every exception.
pub const FRAME_VARS_PATH: &str = "exception.values.[].stacktrace.frames.[].vars";

/// One unit of scrubbing configuration: where to look, which keys to scrub
/// there, and how.
///
/// Rules are immutable once built. The transform is resolved at
/// construction, so a rule that exists can always run.
#[derive(Debug, Clone)]
pub struct Rule {
    path: RulePath,
    keys: Vec<String>,
    mask: Mask,
}

impl Rule {
    /// Build a rule from path text, keys, and a transform.
    ///
    /// Transform text may only name built-ins; use
    /// [`with_registry`](Self::with_registry) for `module.function`
    /// references.
    ///
    /// ```
    /// use es_scrub::Rule;
    ///
    /// let rule = Rule::new("request.headers", ["Auth-Token"], "scrub").unwrap();
    /// assert_eq!(rule.keys(), ["Auth-Token"]);
    /// ```
    pub fn new<I, S, T>(path: &str, keys: I, transform: T) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: IntoTransform,
    {
        Self::with_registry(path, keys, transform, &ExternalRegistry::default())
    }

    /// Build a rule, resolving external references against `registry`.
    pub fn with_registry<I, S, T>(
        path: &str,
        keys: I,
        transform: T,
        registry: &ExternalRegistry,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: IntoTransform,
    {
        let path = RulePath::parse(path)?;
        let mask = transform.into_transform()?.resolve(registry)?;
        Ok(Self::from_parts(path, keys, mask))
    }

    /// Build a rule from parsed parts. Duplicate keys are dropped.
    pub fn from_parts<I, S>(path: RulePath, keys: I, mask: Mask) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !unique.contains(&key) {
                unique.push(key);
            }
        }

        Self {
            path,
            keys: unique,
            mask,
        }
    }

    pub fn path(&self) -> &RulePath {
        &self.path
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] -> {}",
            self.path,
            self.keys.join(", "),
            self.mask.name()
        )
    }
}

/// Rules applied when nothing else is configured: hide `username` and
/// `password` in stack frame local variables.
pub fn default_rules() -> Vec<Rule> {
    let frame_vars = RulePath::from_segments(vec![
        Segment::Key("exception".to_string()),
        Segment::Key("values".to_string()),
        Segment::EachItem,
        Segment::Key("stacktrace".to_string()),
        Segment::Key("frames".to_string()),
        Segment::EachItem,
        Segment::Key("vars".to_string()),
    ]);

    vec![Rule::from_parts(
        frame_vars,
        ["username", "password"],
        Mask::new("scrub", scrub),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use serde_json::json;

    #[test]
    fn test_rule_from_builtin_name() {
        let rule = Rule::new("foo", ["bar"], "scrub").unwrap();
        assert_eq!(rule.path().to_string(), "foo");
        assert_eq!(rule.keys(), ["bar"]);
        assert_eq!(rule.mask().name(), "scrub");
    }

    #[test]
    fn test_rule_from_mask() {
        let mask = Mask::new("upper", |v| Ok(json!(v.to_string().to_uppercase())));
        let rule = Rule::new("a.[].b", ["k"], mask).unwrap();
        assert_eq!(rule.mask().name(), "upper");
    }

    #[test]
    fn test_rule_dedups_keys_in_order() {
        let rule = Rule::new("foo", ["b", "a", "b"], "scrub").unwrap();
        assert_eq!(rule.keys(), ["b", "a"]);
    }

    #[test]
    fn test_rule_rejects_bad_path() {
        let err = Rule::new("foo..bar", ["k"], "scrub").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPath { .. }));
    }

    #[test]
    fn test_rule_rejects_unknown_transform() {
        let err = Rule::new("foo", ["k"], "not_a_function").unwrap_err();
        assert_eq!(
            err,
            RuleError::UnknownTransform("not_a_function".to_string())
        );
    }

    #[test]
    fn test_rule_external_without_registry_fails() {
        let err = Rule::new("foo", ["k"], "myapp.hide").unwrap_err();
        assert!(matches!(err, RuleError::UnknownModule { .. }));
    }

    #[test]
    fn test_rule_external_with_registry() {
        let registry = ExternalRegistry::new().with("myapp", "hide", |_| Ok(json!("hidden")));
        let rule = Rule::with_registry("foo", ["k"], "myapp.hide", &registry).unwrap();
        assert_eq!(rule.mask().name(), "myapp.hide");
    }

    #[test]
    fn test_default_rules_path() {
        let rules = default_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].path().to_string(), FRAME_VARS_PATH);
        assert_eq!(rules[0].keys(), ["username", "password"]);
    }

    #[test]
    fn test_display() {
        let rule = Rule::new("request.headers", ["Auth-Token", "Cookie"], "scrub").unwrap();
        assert_eq!(
            rule.to_string(),
            "request.headers [Auth-Token, Cookie] -> scrub"
        );
    }
}
