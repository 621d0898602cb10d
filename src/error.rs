use std::fmt;

/// Fatal errors raised by the sanitization and validation pipeline.
///
/// Only two conditions are fatal. Everything a *rule* rejects is recorded
/// in the engine's error map instead, so `validate()` always completes
/// and reports every field's first failure in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A rule, filter, or callback name could not be resolved to anything
    /// invocable. Raised at registration time, never during validation.
    UnresolvableCallback {
        /// The name that failed to resolve
        name: String,
    },
    /// A field key in untrusted input contained characters outside the
    /// allowed set (letters, digits, `:`, `_`, `.`, `-`).
    ///
    /// This is unrecoverable: spoofed key structure lets an attacker
    /// desynchronize trusted and untrusted data, so request processing
    /// must abort rather than continue with a "repaired" key.
    DisallowedKey {
        /// The offending key
        key: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnresolvableCallback { name } => {
                write!(f, "callback '{}' is not callable", name)
            }
            Error::DisallowedKey { key } => {
                write!(f, "disallowed characters in input key '{}'", key)
            }
        }
    }
}

impl std::error::Error for Error {}
