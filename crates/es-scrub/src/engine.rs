//! Main scrubbing engine.
//!
//! The [`Scrubber`] applies every rule to an event and contains every
//! failure at the narrowest boundary it can:
//!
//! - a path that does not fit the event aborts that rule only,
//! - a scrub function that fails replaces that one field with
//!   [`SCRUB_ERROR_TEXT`] rather than keeping the original value,
//! - an error handler that fails is logged and ignored.
//!
//! Nothing escapes [`Scrubber::scrub`].

use crate::error::{MaskError, PathMismatchError};
use crate::handler::{ErrorHandler, ErrorReport};
use crate::mask::Mask;
use crate::rule::{default_rules, Rule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Value written in place of a field whose scrub function failed.
pub const SCRUB_ERROR_TEXT: &str = "ERROR WHEN SCRUBBING";

/// Log target for contained failures.
pub const LOG_TARGET: &str = "es_scrub::scrubber";

/// Outcome counts for one scrub pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubSummary {
    /// Fields replaced by their rule's scrub function.
    pub fields_scrubbed: usize,
    /// Fields replaced by [`SCRUB_ERROR_TEXT`].
    pub field_errors: usize,
    /// Rules aborted because their path did not fit the event.
    pub rule_errors: usize,
}

impl ScrubSummary {
    /// True when nothing was reported.
    pub fn is_clean(&self) -> bool {
        self.field_errors == 0 && self.rule_errors == 0
    }

    pub fn merge(&mut self, other: &ScrubSummary) {
        self.fields_scrubbed += other.fields_scrubbed;
        self.field_errors += other.field_errors;
        self.rule_errors += other.rule_errors;
    }
}

/// Applies an ordered list of rules to events.
///
/// Suitable as a pre-send hook: see [`apply`](Self::apply).
#[derive(Clone)]
pub struct Scrubber {
    rules: Vec<Rule>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl Scrubber {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            error_handler: None,
        }
    }

    /// Report failures to `handler` in addition to the log.
    pub fn with_error_handler<H>(mut self, handler: H) -> Self
    where
        H: ErrorHandler + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Replace or remove the error handler.
    pub fn set_error_handler(&mut self, handler: Option<Arc<dyn ErrorHandler>>) {
        self.error_handler = handler;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Scrub an event and hand it back.
    ///
    /// `hint` is whatever metadata the caller passes alongside events; it is
    /// never inspected.
    pub fn apply<H: ?Sized>(&self, mut event: Value, _hint: &H) -> Value {
        self.scrub(&mut event);
        event
    }

    /// Scrub an event in place.
    pub fn scrub(&self, event: &mut Value) -> ScrubSummary {
        let mut summary = ScrubSummary::default();

        for rule in &self.rules {
            if let Err(err) = self.apply_rule(rule, event, &mut summary) {
                summary.rule_errors += 1;
                self.report(format!("rule '{}' failed: {err}", rule.path()));
            }
        }

        tracing::debug!(
            target: LOG_TARGET,
            rules = self.rules.len(),
            fields_scrubbed = summary.fields_scrubbed,
            field_errors = summary.field_errors,
            rule_errors = summary.rule_errors,
            "scrubbed event"
        );
        summary
    }

    fn apply_rule(
        &self,
        rule: &Rule,
        event: &mut Value,
        summary: &mut ScrubSummary,
    ) -> Result<(), PathMismatchError> {
        for target in rule.path().targets(event) {
            let map = target?;

            for key in rule.keys() {
                let Some(slot) = map.get_mut(key.as_str()) else {
                    continue;
                };

                let original = std::mem::take(slot);
                *slot = match run_mask(rule.mask(), original) {
                    Ok(scrubbed) => {
                        summary.fields_scrubbed += 1;
                        tracing::trace!(
                            target: LOG_TARGET,
                            path = %rule.path(),
                            key = %key,
                            "scrubbed field"
                        );
                        scrubbed
                    }
                    Err(err) => {
                        summary.field_errors += 1;
                        self.report(format!(
                            "scrub function {} failed: {err}",
                            rule.mask().name()
                        ));
                        Value::String(SCRUB_ERROR_TEXT.to_string())
                    }
                };
            }
        }

        Ok(())
    }

    fn report(&self, message: String) {
        tracing::error!(target: LOG_TARGET, "{}", message);

        let Some(handler) = &self.error_handler else {
            return;
        };

        let report = ErrorReport { message };
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&report))) {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        tracing::error!(
            target: LOG_TARGET,
            "error handler {} failed: {}",
            handler.name(),
            failure
        );
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl fmt::Debug for Scrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scrubber")
            .field("rules", &self.rules)
            .field("error_handler", &self.error_handler.as_ref().map(|h| h.name()))
            .finish()
    }
}

/// Run a scrub function, turning a panic into an error.
fn run_mask(mask: &Mask, value: Value) -> Result<Value, MaskError> {
    match panic::catch_unwind(AssertUnwindSafe(|| mask.apply(value))) {
        Ok(result) => result,
        Err(payload) => Err(MaskError::new(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ErrorCollector;
    use serde_json::json;

    fn bad_scrub() -> Mask {
        Mask::new("bad_scrub", |_| Err(MaskError::new("scruberror")))
    }

    #[test]
    fn test_no_rules_is_identity() {
        let scrubber = Scrubber::new(Vec::new());
        let event = json!({"a": {"b": [1, 2, {"c": "d"}]}});
        assert_eq!(scrubber.apply(event.clone(), &()), event);
    }

    #[test]
    fn test_scrub_by_path() {
        let scrubber = Scrubber::new(vec![Rule::new("foo", ["bar"], "scrub").unwrap()]);
        let event = json!({"foo": {"bar": "somevalue"}, "foo2": "othervalue"});
        assert_eq!(
            scrubber.apply(event, &()),
            json!({"foo": {"bar": "[Scrubbed]"}, "foo2": "othervalue"})
        );
    }

    #[test]
    fn test_scrub_through_arrays() {
        let scrubber = Scrubber::new(vec![
            Rule::new("frames.[].vars", ["code_id", "state"], "scrub").unwrap(),
        ]);
        let mut event = json!({
            "frames": [
                {"vars": {"foo": "bar"}},
                {"vars": {"index": 4, "code_id": "abcd", "state": "def"}},
            ],
            "function": "somefunc",
        });
        let summary = scrubber.scrub(&mut event);

        assert_eq!(
            event,
            json!({
                "frames": [
                    {"vars": {"foo": "bar"}},
                    {"vars": {"index": 4, "code_id": "[Scrubbed]", "state": "[Scrubbed]"}},
                ],
                "function": "somefunc",
            })
        );
        assert_eq!(summary.fields_scrubbed, 2);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_target_not_a_map_is_skipped() {
        let scrubber = Scrubber::new(vec![Rule::new("request.data", ["bar"], "scrub").unwrap()]);
        let event = json!({"request": {"data": "abcde"}});
        assert_eq!(scrubber.apply(event.clone(), &()), event);

        let event = json!({"request": {"data": {"bar": "abcde"}}});
        assert_eq!(
            scrubber.apply(event, &()),
            json!({"request": {"data": {"bar": "[Scrubbed]"}}})
        );
    }

    #[test]
    fn test_failing_mask_writes_sentinel() {
        let collector = ErrorCollector::new();
        let scrubber = Scrubber::new(vec![Rule::new("request", ["data"], bad_scrub()).unwrap()])
            .with_error_handler(collector.clone());

        let mut event = json!({"request": {"data": {"foo": "bar"}}});
        let summary = scrubber.scrub(&mut event);

        assert_eq!(event, json!({"request": {"data": "ERROR WHEN SCRUBBING"}}));
        assert_eq!(summary.field_errors, 1);
        assert_eq!(
            collector.messages(),
            vec!["scrub function bad_scrub failed: scruberror"]
        );
    }

    #[test]
    fn test_panicking_mask_writes_sentinel() {
        let collector = ErrorCollector::new();
        let panicky = Mask::new("panicky", |_| panic!("kaboom"));
        let scrubber = Scrubber::new(vec![Rule::new("request", ["data"], panicky).unwrap()])
            .with_error_handler(collector.clone());

        let event = scrubber.apply(json!({"request": {"data": "secret"}}), &());

        assert_eq!(event, json!({"request": {"data": "ERROR WHEN SCRUBBING"}}));
        assert_eq!(
            collector.messages(),
            vec!["scrub function panicky failed: panicked: kaboom"]
        );
    }

    #[test]
    fn test_path_mismatch_reported_and_skipped() {
        let collector = ErrorCollector::new();
        let scrubber = Scrubber::new(vec![
            Rule::new("request.[].data", ["foo"], "scrub").unwrap(),
        ])
        .with_error_handler(collector.clone());

        let mut event = json!({"request": {"data": {"foo": "bar"}}});
        let summary = scrubber.scrub(&mut event);

        assert_eq!(event, json!({"request": {"data": {"foo": "bar"}}}));
        assert_eq!(summary.rule_errors, 1);
        assert_eq!(
            collector.messages(),
            vec!["rule 'request.[].data' failed: path 'request.[]' doesn't match event structure"]
        );
    }

    #[test]
    fn test_failures_do_not_stop_other_rules() {
        let collector = ErrorCollector::new();
        let scrubber = Scrubber::new(vec![
            Rule::new("request.[]", ["x"], "scrub").unwrap(),
            Rule::new("request", ["data"], bad_scrub()).unwrap(),
            Rule::new("request", ["token", "data2"], "scrub").unwrap(),
        ])
        .with_error_handler(collector.clone());

        let mut event = json!({"request": {"data": 1, "token": "t", "data2": "d"}});
        let summary = scrubber.scrub(&mut event);

        assert_eq!(
            event,
            json!({"request": {
                "data": "ERROR WHEN SCRUBBING",
                "token": "[Scrubbed]",
                "data2": "[Scrubbed]",
            }})
        );
        assert_eq!(
            summary,
            ScrubSummary {
                fields_scrubbed: 2,
                field_errors: 1,
                rule_errors: 1,
            }
        );
        assert_eq!(collector.reports().len(), 2);
    }

    #[test]
    fn test_failing_handler_is_contained() {
        let scrubber = Scrubber::new(vec![Rule::new("request", ["data"], bad_scrub()).unwrap()])
            .with_error_handler(|_: &ErrorReport| -> Result<(), crate::HandlerError> {
                Err("handlererror".into())
            });

        let event = scrubber.apply(json!({"request": {"data": {"foo": "bar"}}}), &());
        assert_eq!(event, json!({"request": {"data": "ERROR WHEN SCRUBBING"}}));
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let scrubber = Scrubber::new(vec![Rule::new("request.[]", ["x"], "scrub").unwrap()])
            .with_error_handler(|_: &ErrorReport| -> Result<(), crate::HandlerError> {
                panic!("handler down")
            });

        let event = json!({"request": {"x": 1}});
        assert_eq!(scrubber.apply(event.clone(), &()), event);
    }

    #[test]
    fn test_set_error_handler_swaps() {
        let first = ErrorCollector::new();
        let second = ErrorCollector::new();
        let mut scrubber = Scrubber::new(vec![Rule::new("a.[]", ["x"], "scrub").unwrap()])
            .with_error_handler(first.clone());

        scrubber.scrub(&mut json!({"a": {}}));
        scrubber.set_error_handler(Some(Arc::new(second.clone())));
        scrubber.scrub(&mut json!({"a": {}}));
        scrubber.set_error_handler(None);
        scrubber.scrub(&mut json!({"a": {}}));

        assert_eq!(first.reports().len(), 1);
        assert_eq!(second.reports().len(), 1);
    }

    #[test]
    fn test_default_scrubber_hides_frame_credentials() {
        let scrubber = Scrubber::default();
        let event = json!({
            "exception": {"values": [{
                "stacktrace": {"frames": [
                    {"vars": {"username": "alice", "password": "hunter2", "n": 1}},
                    {"vars": {"other": true}},
                ]}
            }]}
        });
        assert_eq!(
            scrubber.apply(event, &()),
            json!({
                "exception": {"values": [{
                    "stacktrace": {"frames": [
                        {"vars": {"username": "[Scrubbed]", "password": "[Scrubbed]", "n": 1}},
                        {"vars": {"other": true}},
                    ]}
                }]}
            })
        );
    }

    #[test]
    fn test_summary_merge() {
        let mut total = ScrubSummary::default();
        total.merge(&ScrubSummary {
            fields_scrubbed: 2,
            field_errors: 1,
            rule_errors: 0,
        });
        total.merge(&ScrubSummary {
            fields_scrubbed: 1,
            field_errors: 0,
            rule_errors: 3,
        });
        assert_eq!(total.fields_scrubbed, 3);
        assert_eq!(total.field_errors, 1);
        assert_eq!(total.rule_errors, 3);
        assert!(!total.is_clean());
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
