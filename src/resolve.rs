//! Rule and filter resolution.
//!
//! Every rule or filter the engine will ever invoke is resolved to a
//! [`Callable`] *when it is registered*, not when validation runs. A name
//! that resolves to nothing is a configuration bug and fails immediately
//! with [`Error::UnresolvableCallback`].

use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::Error;
use crate::rules::Builtin;
use crate::valid;
use crate::value::{FieldStore, Value};

/// A host-provided rule predicate: `(store, value, args) -> pass?`.
pub type RuleFn = Rc<dyn Fn(&FieldStore, &Value, &[String]) -> bool>;

/// A value transformation applied during the filter phases.
pub type FilterFn = Rc<dyn Fn(&str) -> String>;

/// A rule resolved to something invocable.
///
/// The closed set of resolution outcomes: an engine builtin, a helper from
/// the [`valid`] namespace, or a bound host function. There is no deferred
/// name lookup left by the time a `Callable` exists.
#[derive(Clone)]
pub enum Callable {
    /// One of the engine's built-in rules
    Builtin(Builtin),
    /// A string predicate from the `valid` helper namespace
    Helper(fn(&str) -> bool),
    /// A host-registered function or closure
    Bound(RuleFn),
}

impl Callable {
    /// Invokes the rule. Helper predicates only apply to scalar strings;
    /// they fail composites and `Null`.
    pub fn check(&self, store: &FieldStore, value: &Value, args: &[String]) -> bool {
        match self {
            Callable::Builtin(builtin) => builtin.check(store, value, args),
            Callable::Helper(predicate) => value.as_str().map_or(false, predicate),
            Callable::Bound(f) => f(store, value, args),
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Builtin(b) => write!(f, "Builtin({})", b.name()),
            Callable::Helper(_) => write!(f, "Helper"),
            Callable::Bound(_) => write!(f, "Bound"),
        }
    }
}

/// A parsed rule specification string.
///
/// `"!length[3,5]"` parses to name `length`, args `["3", "5"]`,
/// negate `true`. A `\,` inside an argument escapes the comma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// The rule name with negation and arguments stripped
    pub name: String,
    /// Ordered arguments from the `[...]` suffix
    pub args: Vec<String>,
    /// Whether the rule must evaluate falsy to count as valid
    pub negate: bool,
}

/// Parses a rule specification of the form `name`, `!name`, or
/// `name[arg1, arg2]`.
pub fn parse_rule_spec(spec: &str) -> ParsedRule {
    let trimmed = spec.trim();
    let stripped = trimmed.trim_start_matches(['!', ' ']);
    let negate = stripped != trimmed;

    let (name, args) = match stripped.find('[') {
        Some(open) if stripped.ends_with(']') => {
            let name = &stripped[..open];
            let raw = &stripped[open + 1..stripped.len() - 1];
            (name, split_args(raw))
        }
        _ => (stripped, Vec::new()),
    };

    ParsedRule {
        name: name.to_string(),
        args,
        negate,
    }
}

/// Splits a rule argument list on unescaped commas, dropping the
/// whitespace that follows each comma and unescaping `\,`.
fn split_args(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => {
                args.push(std::mem::take(&mut current));
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
            }
            _ => current.push(c),
        }
    }
    args.push(current);
    args
}

/// Host-registered named rules and filters.
///
/// Names may be plain (`"exists"`) or namespaced (`"account::exists"`);
/// both are plain registry keys. Registration order is preserved but has
/// no semantic weight; resolution is by exact name.
#[derive(Clone, Default)]
pub struct Registry {
    rules: IndexMap<String, RuleFn>,
    filters: IndexMap<String, FilterFn>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named rule predicate.
    pub fn register_rule<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&FieldStore, &Value, &[String]) -> bool + 'static,
    {
        self.rules.insert(name.to_string(), Rc::new(rule));
    }

    /// Registers a named filter.
    pub fn register_filter<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&str) -> String + 'static,
    {
        self.filters.insert(name.to_string(), Rc::new(filter));
    }

    /// Resolves a rule name to a [`Callable`].
    ///
    /// Resolution order: a namespaced name (`ns::name`) is looked up only
    /// in the registry; a plain name tries the registry, then the engine
    /// builtins, then the [`valid`] helper namespace.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvableCallback`] when nothing matches.
    pub fn resolve_rule(&self, name: &str) -> Result<Callable, Error> {
        if name.contains("::") {
            return self
                .rules
                .get(name)
                .map(|f| Callable::Bound(Rc::clone(f)))
                .ok_or_else(|| unresolvable(name));
        }

        if let Some(f) = self.rules.get(name) {
            return Ok(Callable::Bound(Rc::clone(f)));
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(Callable::Builtin(builtin));
        }
        valid_predicate(name)
            .map(Callable::Helper)
            .ok_or_else(|| unresolvable(name))
    }

    /// Resolves a filter name, trying the registry then the [`valid`]
    /// filter helpers.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvableCallback`] when nothing matches.
    pub fn resolve_filter(&self, name: &str) -> Result<FilterFn, Error> {
        if name.contains("::") {
            return self
                .filters
                .get(name)
                .map(Rc::clone)
                .ok_or_else(|| unresolvable(name));
        }

        if let Some(f) = self.filters.get(name) {
            return Ok(Rc::clone(f));
        }
        valid_filter(name)
            .map(|f| Rc::new(f) as FilterFn)
            .ok_or_else(|| unresolvable(name))
    }
}

fn unresolvable(name: &str) -> Error {
    Error::UnresolvableCallback {
        name: name.to_string(),
    }
}

fn valid_predicate(name: &str) -> Option<fn(&str) -> bool> {
    match name {
        "alpha" => Some(valid::alpha),
        "alpha_numeric" => Some(valid::alpha_numeric),
        "alpha_dash" => Some(valid::alpha_dash),
        "digit" => Some(valid::digit),
        "numeric" => Some(valid::numeric),
        "email" => Some(valid::email),
        "url" => Some(valid::url),
        "ip" => Some(valid::ip),
        _ => None,
    }
}

fn valid_filter(name: &str) -> Option<fn(&str) -> String> {
    match name {
        "trim" => Some(valid::trim),
        "lowercase" => Some(valid::lowercase),
        "uppercase" => Some(valid::uppercase),
        "ucfirst" => Some(valid::ucfirst),
        "normalize_whitespace" => Some(valid::normalize_whitespace),
        _ => None,
    }
}
