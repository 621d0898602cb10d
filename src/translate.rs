//! The message-resolution seam.
//!
//! The engine never stores display strings; it records rule names and asks
//! a [`Translate`] collaborator for human-readable messages when
//! [`Validator::messages`](crate::Validator::messages) is called.

/// A message-catalog lookup.
///
/// Implementations MUST return the key unchanged when no translation
/// exists; that equality is how the engine walks its fallback chain and
/// detects a miss. Placeholder interpolation (`:field`, `:param1`, …) is
/// the engine's job, not the translator's.
pub trait Translate {
    /// Look up `key`, returning the translation or the key itself.
    fn translate(&self, key: &str) -> String;
}

/// A translator with no catalog: every lookup misses.
///
/// With this translator the fallback chain always bottoms out and message
/// keys surface verbatim, which is exactly what tests and catalog-less
/// hosts want.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTranslator;

impl Translate for NullTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

impl<K, V, S> Translate for std::collections::HashMap<K, V, S>
where
    K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
    V: AsRef<str>,
    S: std::hash::BuildHasher,
{
    fn translate(&self, key: &str) -> String {
        match self.get(key) {
            Some(message) => message.as_ref().to_string(),
            None => key.to_string(),
        }
    }
}
