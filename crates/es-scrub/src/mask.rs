//! Scrub functions.
//!
//! A [`Mask`] maps an original value to its replacement. [`scrub`] replaces
//! anything with [`MASK_TEXT`]. The structured masks built by
//! [`scrub_cookies`] and [`scrub_query_string`] understand the three shapes
//! an HTTP cookie or query string value can take in an event (an object, an
//! array of `[name, value]` pairs, or the raw header text) and return the
//! shape they were given with only the selected values replaced.

use crate::error::MaskError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::form_urlencoded;

/// Replacement text for scrubbed values.
pub const MASK_TEXT: &str = "[Scrubbed]";

/// Signature shared by all scrub functions.
pub type MaskFn = dyn Fn(Value) -> Result<Value, MaskError> + Send + Sync;

/// A named scrub function.
///
/// The name identifies the function in error reports.
#[derive(Clone)]
pub struct Mask {
    name: String,
    func: Arc<MaskFn>,
}

impl Mask {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, MaskError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the function on a value.
    pub fn apply(&self, value: Value) -> Result<Value, MaskError> {
        (self.func)(value)
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask").field("name", &self.name).finish()
    }
}

/// Replace any value with [`MASK_TEXT`].
pub fn scrub(_value: Value) -> Result<Value, MaskError> {
    Ok(mask_value())
}

fn mask_value() -> Value {
    Value::String(MASK_TEXT.to_string())
}

/// Which names a structured mask scrubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection {
    /// Every name.
    All,
    /// Only these names, in declaration order.
    Named(Vec<String>),
}

impl KeySelection {
    /// Build a named selection, dropping duplicates.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        KeySelection::Named(unique)
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            KeySelection::All => true,
            KeySelection::Named(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Build a mask for cookie values.
///
/// For header text (`name=value` pairs joined by `;`), only non-empty values
/// of selected names are replaced. Text with nothing to replace comes back
/// unchanged; otherwise pairs are trimmed and rejoined with `"; "`.
pub fn scrub_cookies(keys: KeySelection) -> Mask {
    Mask::new("scrub_cookies", move |value| {
        scrub_structured(value, &keys, "cookies", scrub_cookie_header)
    })
}

/// Build a mask for query string values.
///
/// Header text is form-urlencoded. Text with nothing to replace comes back
/// unchanged; otherwise every pair is decoded and re-encoded, so unrelated
/// values may change their percent-encoding.
pub fn scrub_query_string(keys: KeySelection) -> Mask {
    Mask::new("scrub_query_string", move |value| {
        scrub_structured(value, &keys, "query_string", scrub_query)
    })
}

type TextScrubber = fn(&str, &KeySelection) -> Result<Option<String>, MaskError>;

fn scrub_structured(
    value: Value,
    keys: &KeySelection,
    kind: &str,
    scrub_text: TextScrubber,
) -> Result<Value, MaskError> {
    if is_falsy(&value) {
        return Ok(value);
    }

    match value {
        Value::Object(mut map) => {
            match keys {
                KeySelection::All => {
                    for slot in map.values_mut() {
                        *slot = mask_value();
                    }
                }
                KeySelection::Named(names) => {
                    for name in names {
                        if let Some(slot) = map.get_mut(name.as_str()) {
                            *slot = mask_value();
                        }
                    }
                }
            }
            Ok(Value::Object(map))
        }
        Value::Array(mut pairs) => {
            for (index, pair) in pairs.iter_mut().enumerate() {
                scrub_pair(pair, index, keys, kind)?;
            }
            Ok(Value::Array(pairs))
        }
        Value::String(text) => match scrub_text(&text, keys)? {
            Some(scrubbed) => Ok(Value::String(scrubbed)),
            None => Ok(Value::String(text)),
        },
        other => Err(MaskError::new(format!(
            "{kind} must be an object, an array of pairs, or a string, got {}",
            type_name(&other)
        ))),
    }
}

fn scrub_pair(
    pair: &mut Value,
    index: usize,
    keys: &KeySelection,
    kind: &str,
) -> Result<(), MaskError> {
    let items = match pair {
        Value::Array(items) if items.len() == 2 => items,
        _ => {
            return Err(MaskError::new(format!(
                "{kind} item {index} is not a [name, value] pair"
            )))
        }
    };

    let selected = match &items[0] {
        Value::String(name) => keys.matches(name),
        _ => {
            return Err(MaskError::new(format!(
                "{kind} item {index} has a non-string name"
            )))
        }
    };
    if selected {
        items[1] = mask_value();
    }
    Ok(())
}

fn scrub_cookie_header(header: &str, keys: &KeySelection) -> Result<Option<String>, MaskError> {
    let mut scrubbed = false;
    let mut pairs = Vec::new();

    for (index, cookie) in header.split(';').enumerate() {
        let (name, value) = cookie
            .split_once('=')
            .ok_or_else(|| MaskError::new(format!("cookie {index} has no '='")))?;
        let name = name.trim();
        let mut value = value.trim();

        if keys.matches(name) && !value.is_empty() {
            value = MASK_TEXT;
            scrubbed = true;
        }
        pairs.push(format!("{name}={value}"));
    }

    if !scrubbed {
        return Ok(None);
    }
    Ok(Some(pairs.join("; ")))
}

fn scrub_query(query: &str, keys: &KeySelection) -> Result<Option<String>, MaskError> {
    let mut scrubbed = false;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if keys.matches(&name) {
            scrubbed = true;
            pairs.push((name.into_owned(), MASK_TEXT.to_string()));
        } else {
            pairs.push((name.into_owned(), value.into_owned()));
        }
    }

    if !scrubbed {
        return Ok(None);
    }
    Ok(Some(
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish(),
    ))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
