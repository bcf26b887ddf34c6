//! Rule paths and event traversal.
//!
//! A path is a dotted list of map keys. The segment `[]` fans out over every
//! item of the array found at that point, so
//! `exception.values.[].stacktrace.frames.[].vars` reaches the `vars` map of
//! every frame of every exception.

use crate::error::{PathMismatchError, RuleError};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Path segment that fans out over array items.
pub const WILDCARD: &str = "[]";

/// One step of a [`RulePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Descend into the value stored under this key.
    Key(String),
    /// Descend into every item of an array.
    EachItem,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::EachItem => f.write_str(WILDCARD),
        }
    }
}

/// Parsed location of the maps a rule scrubs.
///
/// The empty path addresses the event root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RulePath {
    segments: Vec<Segment>,
}

impl RulePath {
    /// Path addressing the event root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already split segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse dotted path text.
    ///
    /// Empty text is the root path. Any other text must not contain empty
    /// segments (`a..b`, `.a`, `a.`).
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        if text.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for (index, part) in text.split('.').enumerate() {
            if part.is_empty() {
                return Err(RuleError::InvalidPath {
                    path: text.to_string(),
                    reason: format!("segment {} is empty", index + 1),
                });
            }
            segments.push(if part == WILDCARD {
                Segment::EachItem
            } else {
                Segment::Key(part.to_string())
            });
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate over the maps this path reaches inside `event`.
    pub fn targets<'a>(&'a self, event: &'a mut Value) -> Targets<'a> {
        Targets {
            path: self,
            stack: vec![(event, 0)],
            failed: false,
        }
    }

    /// Dotted text of the first `len` segments.
    fn prefix(&self, len: usize) -> String {
        join(&self.segments[..len.min(self.segments.len())])
    }
}

fn join(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.segments))
    }
}

impl FromStr for RulePath {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resolve `path` against `event`. Same as [`RulePath::targets`].
pub fn resolve<'a>(event: &'a mut Value, path: &'a RulePath) -> Targets<'a> {
    path.targets(event)
}

/// Lazy iterator over the maps a path reaches, in document order.
///
/// A missing key or a non-map node ends that branch quietly: paths are not
/// expected to fit every event. A wildcard that lands on anything other than
/// an array yields one [`PathMismatchError`] and ends the iteration; maps
/// yielded before it stay valid.
pub struct Targets<'a> {
    path: &'a RulePath,
    stack: Vec<(&'a mut Value, usize)>,
    failed: bool,
}

impl<'a> Iterator for Targets<'a> {
    type Item = Result<&'a mut Map<String, Value>, PathMismatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let path: &'a RulePath = self.path;
        while let Some((mut node, mut depth)) = self.stack.pop() {
            loop {
                match path.segments.get(depth) {
                    None => {
                        if let Value::Object(map) = node {
                            return Some(Ok(map));
                        }
                        break;
                    }
                    Some(Segment::Key(key)) => match node {
                        Value::Object(map) => match map.get_mut(key.as_str()) {
                            Some(child) => {
                                node = child;
                                depth += 1;
                            }
                            None => break,
                        },
                        _ => break,
                    },
                    Some(Segment::EachItem) => match node {
                        Value::Array(items) => {
                            // Reversed so the stack pops items in document order.
                            self.stack
                                .extend(items.iter_mut().rev().map(|item| (item, depth + 1)));
                            break;
                        }
                        _ => {
                            self.failed = true;
                            self.stack.clear();
                            return Some(Err(PathMismatchError {
                                partial_path: path.prefix(depth + 1),
                            }));
                        }
                    },
                }
            }
        }

        None
    }
}
