//! Rule-driven scrubbing of sensitive fields in JSON event payloads.
//!
//! Error reports carry request headers, cookies, query strings and stack
//! frame locals, any of which may hold credentials. This crate rewrites such
//! fields in place before an event leaves the process.
//!
//! # Key Features
//!
//! - **Declarative rules**: a rule names a dotted path (with `[]` fanning out
//!   over arrays), the keys to scrub in the maps it reaches, and a scrub
//!   function.
//! - **Shape-aware masks**: cookies and query strings keep their shape
//!   (map, list of pairs, or header text) with only the selected values
//!   replaced.
//! - **Fail-closed**: a scrub function that fails replaces its field with
//!   [`SCRUB_ERROR_TEXT`]; the original value is never kept.
//! - **Contained failures**: broken rules and panicking functions are logged
//!   and reported, never propagated to the caller.
//!
//! # Example
//!
//! ```
//! use es_scrub::{Rule, Scrubber};
//! use serde_json::json;
//!
//! let scrubber = Scrubber::new(vec![
//!     Rule::new("request.headers", ["Authorization"], "scrub").unwrap(),
//!     Rule::new("request", ["cookies"], "scrub_cookies").unwrap(),
//! ]);
//!
//! let event = scrubber.apply(
//!     json!({"request": {
//!         "headers": {"Authorization": "Bearer abc"},
//!         "cookies": "session=xyz; theme=dark",
//!     }}),
//!     &(),
//! );
//! assert_eq!(event["request"]["headers"]["Authorization"], "[Scrubbed]");
//! assert_eq!(event["request"]["cookies"], "session=[Scrubbed]; theme=[Scrubbed]");
//! ```

pub mod engine;
pub mod error;
pub mod handler;
pub mod mask;
pub mod path;
pub mod rule;
pub mod transform;

pub use engine::{ScrubSummary, Scrubber, LOG_TARGET, SCRUB_ERROR_TEXT};
pub use error::{HandlerError, MaskError, PathMismatchError, Result, RuleError};
pub use handler::{ErrorCollector, ErrorHandler, ErrorReport};
pub use mask::{scrub, scrub_cookies, scrub_query_string, KeySelection, Mask, MASK_TEXT};
pub use path::{resolve, RulePath, Segment, Targets, WILDCARD};
pub use rule::{default_rules, Rule, FRAME_VARS_PATH};
pub use transform::{builtin, builtin_names, ExternalRegistry, IntoTransform, TransformSpec};
