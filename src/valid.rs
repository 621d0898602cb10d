//! General-purpose validation predicates and filter helpers.
//!
//! These are the functions the rule resolver finds by bare name when a
//! rule is neither registered by the host nor an engine built-in. They are
//! also usable directly, outside any engine.

use std::net::IpAddr;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ALPHA: Regex = Regex::new(r"^\pL+$").unwrap();
    static ref ALPHA_NUMERIC: Regex = Regex::new(r"^[\pL0-9]+$").unwrap();
    static ref ALPHA_DASH: Regex = Regex::new(r"^[\pL0-9_-]+$").unwrap();
    static ref DIGIT: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref NUMERIC: Regex = Regex::new(r"^-?[0-9]*\.?[0-9]+$").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"^[0-9A-Za-z._%+-]{1,64}@[0-9A-Za-z.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref URL: Regex = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap();
    static ref MULTI_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Letters only (any script).
pub fn alpha(value: &str) -> bool {
    ALPHA.is_match(value)
}

/// Letters and ASCII digits.
pub fn alpha_numeric(value: &str) -> bool {
    ALPHA_NUMERIC.is_match(value)
}

/// Letters, digits, underscores, and dashes.
pub fn alpha_dash(value: &str) -> bool {
    ALPHA_DASH.is_match(value)
}

/// ASCII digits only.
pub fn digit(value: &str) -> bool {
    DIGIT.is_match(value)
}

/// A decimal number, optionally negative or fractional.
pub fn numeric(value: &str) -> bool {
    NUMERIC.is_match(value)
}

/// A pragmatic email shape: bounded local part, dotted domain, real TLD.
/// Not full RFC 5322: it rejects obvious injection, not edge-case mail.
pub fn email(value: &str) -> bool {
    value.len() <= 254 && EMAIL.is_match(value)
}

/// An absolute http(s) URL.
pub fn url(value: &str) -> bool {
    URL.is_match(value)
}

/// A literal IPv4 or IPv6 address.
pub fn ip(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Trims surrounding whitespace. Usable as a pre- or post-filter.
pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Lowercases the whole string.
pub fn lowercase(value: &str) -> String {
    value.to_lowercase()
}

/// Uppercases the whole string.
pub fn uppercase(value: &str) -> String {
    value.to_uppercase()
}

/// Uppercases the first character, leaving the rest untouched.
pub fn ucfirst(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize_whitespace(value: &str) -> String {
    MULTI_WHITESPACE.replace_all(value.trim(), " ").into_owned()
}
