//! Input sanitization and declarative field validation.
//!
//! This crate covers the two stages between raw untrusted input and code
//! that consumes it:
//! - **Sanitization**: structural cleanup applied to everything on the way
//!   in (key policing, control-character stripping, newline normalization,
//!   optional XSS filtering)
//! - **Validation**: a declarative, multi-phase engine that filters,
//!   checks, and reports on a set of named fields
//!
//! # Core Types
//!
//! - [`Value`]: a scalar-or-composite input value; [`FieldStore`] maps
//!   field names to values in insertion order
//! - [`Sanitizer`]: recursive input cleanup with pluggable XSS strategies
//! - [`Validator`]: the phase engine (pre-filters, rules, callbacks,
//!   post-filters) with per-field first-error-wins reporting
//! - [`Registry`]: named rule and filter resolution, checked at
//!   registration time
//! - [`Translate`]: message catalog seam for [`Validator::messages`]
//!
//! # Examples
//!
//! ```
//! use validation_core::{store, Validator};
//!
//! let mut post = Validator::new(store([
//!     ("username", "  alice  "),
//!     ("password", "hunter2"),
//!     ("confirm", "hunter2"),
//! ]));
//!
//! post.pre_filter("trim", &["username"])?;
//! post.add_rules("username", &["required", "alpha_dash", "length[3,32]"])?;
//! post.add_rules("password", &["required", "length[6,128]"])?;
//! post.add_rules("confirm", &["matches[password]"])?;
//!
//! assert!(post.validate());
//! assert_eq!(post.safe_values(&[])["username"].as_str(), Some("alice"));
//! # Ok::<(), validation_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod resolve;
mod rules;
mod sanitize;
mod translate;
pub mod valid;
mod value;
mod xss;

pub use engine::{FieldKey, Validator};
pub use error::Error;
pub use resolve::{parse_rule_spec, Callable, FilterFn, ParsedRule, Registry, RuleFn};
pub use rules::Builtin;
pub use sanitize::{clean_bytes, client_ip, Sanitizer, XssFilter};
pub use translate::{NullTranslator, Translate};
pub use value::{store, FieldStore, Value};
pub use xss::{xss_clean_value, xss_filter_default};
