//! Global neutralization of untrusted request data.
//!
//! The [`Sanitizer`] owns no request state: it takes a value tree and
//! returns a cleaned one, and the caller decides what gets sanitized and
//! when. Value cleaning never fails; key cleaning fails hard, because a
//! spoofed key is an attack on the data structure itself, not on a field.

use std::rc::Rc;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Error;
use crate::value::Value;
use crate::xss::{xss_clean_value, xss_filter_default};

lazy_static! {
    /// ASCII control codes, except `\t`, `\n`, and `\r` which carry meaning
    /// for newline handling
    static ref CONTROL_CHARS: Regex = Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]+").unwrap();

    /// The full allowed alphabet for input keys
    static ref VALID_KEY: Regex = Regex::new(r"^[\pL0-9:_.-]+$").unwrap();
}

/// A pluggable string-level XSS defusal strategy.
pub type XssFilter = Rc<dyn Fn(&str) -> String>;

/// Recursive cleaner for untrusted request data.
///
/// # Examples
///
/// ```
/// use validation_core::{Sanitizer, Value};
///
/// let sanitizer = Sanitizer::new();
/// let cleaned = sanitizer.clean(&Value::from("hi\u{0}there"));
/// assert_eq!(cleaned.as_str(), Some("hithere"));
/// ```
pub struct Sanitizer {
    global_xss: bool,
    strategy: Option<String>,
    strategies: IndexMap<String, XssFilter>,
}

impl Sanitizer {
    /// Creates a sanitizer with XSS defusal off for `clean_input` and no
    /// named strategies registered; the built-in pipeline is always
    /// available as the fallback.
    pub fn new() -> Self {
        Self {
            global_xss: false,
            strategy: None,
            strategies: IndexMap::new(),
        }
    }

    /// Enables XSS defusal inside [`clean_input`](Self::clean_input),
    /// optionally selecting a named strategy.
    pub fn with_global_xss(mut self, strategy: Option<&str>) -> Self {
        self.global_xss = true;
        self.strategy = strategy.map(str::to_string);
        self
    }

    /// Registers a named defusal strategy that callers can select in
    /// [`xss_clean`](Self::xss_clean).
    pub fn register_strategy(&mut self, name: &str, filter: XssFilter) {
        self.strategies.insert(name.to_string(), filter);
    }

    /// Recursively cleans a value tree: strips ASCII control codes from
    /// every scalar, and cleans map keys with the same function as values.
    ///
    /// Pure and infallible: malformed input is repaired, never rejected.
    pub fn clean(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::Str(s) => Value::Str(strip_control(s)),
            Value::List(items) => Value::List(items.iter().map(|v| self.clean(v)).collect()),
            Value::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (strip_control(k), self.clean(v)))
                    .collect(),
            ),
        }
    }

    /// Validates a field key against the allowed alphabet: letters, digits,
    /// `:`, `_`, `.`, `-`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DisallowedKey`] for any other character. This is
    /// fatal: the caller must abort request processing, not log and carry
    /// on, because a crafted key desynchronizes trusted and untrusted data.
    pub fn clean_key<'a>(&self, key: &'a str) -> Result<&'a str, Error> {
        if VALID_KEY.is_match(key) {
            Ok(key)
        } else {
            Err(Error::DisallowedKey {
                key: key.to_string(),
            })
        }
    }

    /// Full request-data pass: validates every map key, strips control
    /// codes, standardizes newlines to `\n`, and applies XSS defusal when
    /// the sanitizer was built with [`with_global_xss`](Self::with_global_xss).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DisallowedKey`] if any key at any depth fails
    /// [`clean_key`](Self::clean_key).
    pub fn clean_input(&self, value: &Value) -> Result<Value, Error> {
        let cleaned = self.clean_input_data(value)?;
        debug!("input data sanitized");
        if self.global_xss {
            Ok(self.xss_clean(&cleaned, self.strategy.as_deref()))
        } else {
            Ok(cleaned)
        }
    }

    fn clean_input_data(&self, value: &Value) -> Result<Value, Error> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Str(s) => Ok(Value::Str(standardize_newlines(&strip_control(s)))),
            Value::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|v| self.clean_input_data(v))
                    .collect::<Result<_, _>>()?,
            )),
            Value::Map(entries) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (k, v) in entries {
                    self.clean_key(k)?;
                    out.insert(k.clone(), self.clean_input_data(v)?);
                }
                Ok(Value::Map(out))
            }
        }
    }

    /// Defuses XSS vectors across a value tree.
    ///
    /// `strategy` selects a registered strategy by name; `None` or an
    /// unknown name uses the built-in pipeline. Unknown names are a
    /// reportable misconfiguration, logged and degraded, never fatal.
    pub fn xss_clean(&self, value: &Value, strategy: Option<&str>) -> Value {
        match strategy {
            None => xss_clean_value(value, &xss_filter_default),
            Some(name) => match self.strategies.get(name) {
                Some(filter) => {
                    let filter = Rc::clone(filter);
                    xss_clean_value(value, &move |s: &str| filter(s))
                }
                None => {
                    warn!(strategy = name, "unknown xss strategy, using default");
                    xss_clean_value(value, &xss_filter_default)
                }
            },
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_control(s: &str) -> String {
    CONTROL_CHARS.replace_all(s, "").into_owned()
}

fn standardize_newlines(s: &str) -> String {
    if s.contains('\r') {
        s.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        s.to_string()
    }
}

/// Decodes bytes as UTF-8, silently discarding invalid sequences instead
/// of failing.
///
/// # Examples
///
/// ```
/// use validation_core::clean_bytes;
///
/// assert_eq!(clean_bytes(b"caf\xc3\xa9"), "café");
/// assert_eq!(clean_bytes(b"bad\xff\xfebytes"), "badbytes");
/// ```
pub fn clean_bytes(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                // valid_up_to guarantees this slice parses
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = err.error_len().unwrap_or(rest.len());
                bytes = &rest[skip.min(rest.len())..];
                if bytes.is_empty() {
                    return out;
                }
            }
        }
    }
}

/// Extracts the client address from header candidates in priority order.
///
/// `candidates` is typically `[x-forwarded-for, client-ip, remote-addr]`
/// values. A comma-delimited forwarded-for list yields its first address
/// (the originating client; later entries are proxies). Anything that does
/// not parse as an IP address collapses to `0.0.0.0`.
///
/// # Examples
///
/// ```
/// use validation_core::client_ip;
///
/// assert_eq!(client_ip(&["203.0.113.7, 10.0.0.1"]), "203.0.113.7");
/// assert_eq!(client_ip(&["", "not-an-ip"]), "0.0.0.0");
/// ```
pub fn client_ip(candidates: &[&str]) -> String {
    let found = candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or("");

    let first = found.split(',').next().unwrap_or("").trim();

    if crate::valid::ip(first) {
        first.to_string()
    } else {
        "0.0.0.0".to_string()
    }
}
