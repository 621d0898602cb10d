use indexmap::IndexMap;

/// An ordered mapping from field name to value.
///
/// This is the working store a [`Validator`](crate::Validator) owns and the
/// shape [`Sanitizer::clean`](crate::Sanitizer::clean) operates on. Insertion
/// order is preserved and meaningful: phases iterate fields in the order they
/// were inserted.
pub type FieldStore = IndexMap<String, Value>;

/// A tree of string scalars, mirroring the shape of decoded request data.
///
/// Request bodies, query strings, and cookies all decode to nested
/// string/array/object structures; `Value` models exactly that, plus a
/// [`Null`](Value::Null) placeholder for fields that are configured (have
/// rules or filters) but absent from the input.
///
/// # Examples
///
/// ```
/// use validation_core::Value;
///
/// let v = Value::from("hello");
/// assert_eq!(v.as_str(), Some("hello"));
/// assert!(!v.is_empty());
/// assert!(Value::Null.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Absent-but-known field placeholder
    Null,
    /// A scalar string
    Str(String),
    /// An ordered sequence of values
    List(Vec<Value>),
    /// An ordered mapping of string keys to values
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Returns the scalar string, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value counts as empty for rule evaluation.
    ///
    /// `Null`, the empty string, and empty composites are empty. Rules
    /// outside the engine's empty-exempt set silently skip empty fields.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
        }
    }

    /// Applies a string transformation to every scalar in this value.
    ///
    /// Composites are transformed element-wise; `Null` passes through
    /// untouched. This is how the engine applies pre- and post-filters.
    pub fn map_scalars<F>(&self, f: &F) -> Value
    where
        F: Fn(&str) -> String,
    {
        match self {
            Value::Null => Value::Null,
            Value::Str(s) => Value::Str(f(s)),
            Value::List(items) => Value::List(items.iter().map(|v| v.map_scalars(f)).collect()),
            Value::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.map_scalars(f)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Builds a [`FieldStore`] from name/value pairs, preserving order.
///
/// # Examples
///
/// ```
/// use validation_core::store;
///
/// let fields = store([("name", "Bob"), ("email", "")]);
/// assert_eq!(fields["name"].as_str(), Some("Bob"));
/// ```
pub fn store<'a, I>(pairs: I) -> FieldStore
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
}
