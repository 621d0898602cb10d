//! Built-in validation rules.
//!
//! Pure predicates over the already-pre-filtered value. Rules that reason
//! about other fields (`matches`, `depends_on`) read the working store but
//! never write to it.

use crate::value::{FieldStore, Value};

/// The closed set of engine-level rules, resolvable by bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Field must be non-empty
    Required,
    /// Field must strictly equal every named field
    Matches,
    /// Character count must match an exact length or inclusive range
    Length,
    /// Every named field must be present and non-empty
    DependsOn,
    /// Every character must come from the argument character set
    Chars,
}

impl Builtin {
    /// Resolves a bare rule name to a builtin, if it is one.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "required" => Some(Builtin::Required),
            "matches" => Some(Builtin::Matches),
            "length" => Some(Builtin::Length),
            "depends_on" => Some(Builtin::DependsOn),
            "chars" => Some(Builtin::Chars),
            _ => None,
        }
    }

    /// The name under which this rule resolves, and which errors report.
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Required => "required",
            Builtin::Matches => "matches",
            Builtin::Length => "length",
            Builtin::DependsOn => "depends_on",
            Builtin::Chars => "chars",
        }
    }

    /// Evaluates the rule against a value in the context of the store.
    pub fn check(&self, store: &FieldStore, value: &Value, args: &[String]) -> bool {
        match self {
            Builtin::Required => required(value),
            Builtin::Matches => matches(store, value, args),
            Builtin::Length => length(value, args),
            Builtin::DependsOn => depends_on(store, args),
            Builtin::Chars => chars(value, args),
        }
    }
}

/// False for the empty string, `Null`, and empty composites.
pub fn required(value: &Value) -> bool {
    !value.is_empty()
}

/// True iff `value` strictly equals the current value of every field named
/// in `args`. A missing field compares as `Null`.
pub fn matches(store: &FieldStore, value: &Value, args: &[String]) -> bool {
    args.iter().all(|other| {
        let other_value = store.get(other).unwrap_or(&Value::Null);
        value == other_value
    })
}

/// One argument: exact character count. Two: inclusive `[min, max]` range.
/// Counts characters, not bytes; non-strings and non-numeric arguments fail.
pub fn length(value: &Value, args: &[String]) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    let size = s.chars().count();

    match args {
        [exact] => exact.parse::<usize>().map_or(false, |n| size == n),
        [min, max, ..] => {
            let (Ok(min), Ok(max)) = (min.parse::<usize>(), max.parse::<usize>()) else {
                return false;
            };
            size >= min && size <= max
        }
        [] => false,
    }
}

/// True iff every field named in `args` exists in the store and is
/// non-empty.
pub fn depends_on(store: &FieldStore, args: &[String]) -> bool {
    args.iter()
        .all(|field| store.get(field).map_or(false, |v| !v.is_empty()))
}

/// True iff every character of the value is drawn from the argument
/// character set (arguments are concatenated into one set).
pub fn chars(value: &Value, args: &[String]) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    let allowed: String = args.concat();
    s.chars().all(|c| allowed.contains(c))
}
