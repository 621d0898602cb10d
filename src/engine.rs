//! The declarative validation engine.
//!
//! A [`Validator`] owns one field store and four ordered phase maps:
//! pre-filters, rules, callbacks, post-filters. Configuration happens
//! through builder calls that resolve names immediately; `validate()` then
//! runs the phases in order and accumulates at most one error per field.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::Error;
use crate::resolve::{parse_rule_spec, Callable, FilterFn, Registry};
use crate::translate::Translate;
use crate::valid;
use crate::value::{FieldStore, Value};

lazy_static! {
    /// Runs of non-letters, flattened to spaces when deriving labels
    static ref NON_LETTER: Regex = Regex::new(r"[^\pL]+").unwrap();
}

/// Selects which fields a filter, rule, or callback applies to.
///
/// `Any` applies to every field the engine knows about (every field with
/// at least one filter, rule, or callback). It is a distinct variant, not
/// a magic string, so a field literally named `"*"` cannot collide with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Every known field
    Any,
    /// One named field
    Named(String),
}

/// A registered rule: resolved callable, arguments, and negation flag.
/// Immutable once added.
#[derive(Clone)]
struct RuleSpec {
    name: String,
    callable: Callable,
    args: Vec<String>,
    negate: bool,
}

/// An engine callback. Callbacks receive the whole engine and the field
/// name; they record their own errors via [`Validator::add_error`] and
/// their return value is ignored.
type CallbackFn = Rc<dyn Fn(&mut Validator, &str)>;

/// One recorded failure: the rule that failed (`!`-prefixed when it was
/// negated) and its arguments, kept for message interpolation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldError {
    rule: String,
    args: Vec<String>,
}

/// A multi-phase field validator.
///
/// # Examples
///
/// ```
/// use validation_core::{store, Validator};
///
/// let mut post = Validator::new(store([("name", "  Bob  "), ("email", "")]));
/// post.pre_filter("trim", &["name"]).unwrap();
/// post.add_rules("email", &["required"]).unwrap();
///
/// assert!(!post.validate());
/// assert_eq!(post.errors()["email"], "required");
/// assert_eq!(post.safe_values(&[])["name"].as_str(), Some("Bob"));
/// ```
pub struct Validator {
    values: FieldStore,
    registry: Registry,
    pre_filters: IndexMap<FieldKey, Vec<FilterFn>>,
    rules: IndexMap<FieldKey, Vec<RuleSpec>>,
    callbacks: IndexMap<FieldKey, Vec<CallbackFn>>,
    post_filters: IndexMap<FieldKey, Vec<FilterFn>>,
    empty_rules: HashSet<String>,
    labels: IndexMap<String, String>,
    errors: IndexMap<String, FieldError>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("values", &self.values)
            .field("fields", &self.field_names())
            .field("labels", &self.labels)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Creates an engine over the given field store.
    ///
    /// `required` and `matches` start in the empty-exempt set: they run
    /// even when a field's value is empty. Every other rule silently skips
    /// empty fields.
    pub fn new(values: FieldStore) -> Self {
        Self {
            values,
            registry: Registry::new(),
            pre_filters: IndexMap::new(),
            rules: IndexMap::new(),
            callbacks: IndexMap::new(),
            post_filters: IndexMap::new(),
            empty_rules: ["required", "matches"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            labels: IndexMap::new(),
            errors: IndexMap::new(),
        }
    }

    /// Duplicates this engine's configuration over a new input set.
    ///
    /// Rules, filters, callbacks, labels, and the empty-exempt set carry
    /// over (callable lists are shared, they are immutable once added);
    /// errors reset. Mutating the copy never affects the original.
    pub fn copy(&self, values: FieldStore) -> Self {
        Self {
            values,
            registry: self.registry.clone(),
            pre_filters: self.pre_filters.clone(),
            rules: self.rules.clone(),
            callbacks: self.callbacks.clone(),
            post_filters: self.post_filters.clone(),
            empty_rules: self.empty_rules.clone(),
            labels: self.labels.clone(),
            errors: IndexMap::new(),
        }
    }

    /// Host-registered named rules and filters, for resolution by
    /// [`add_rules`](Self::add_rules) and the filter builders.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Every field that has at least one filter, rule, or callback, in
    /// configuration order. Wildcard entries are not fields and are
    /// excluded.
    pub fn field_names(&self) -> Vec<String> {
        let mut fields = Vec::new();
        let keys = self
            .pre_filters
            .keys()
            .chain(self.rules.keys())
            .chain(self.callbacks.keys())
            .chain(self.post_filters.keys());
        for key in keys {
            if let FieldKey::Named(name) = key {
                if !fields.contains(name) {
                    fields.push(name.clone());
                }
            }
        }
        fields
    }

    /// The full value store as currently held.
    pub fn as_array(&self) -> &FieldStore {
        &self.values
    }

    /// A single field's current value, for callbacks and hosts.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Overwrites a single field's value.
    pub fn set_value(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    /// Configured fields and their values; fields that never appeared in
    /// the input come back as [`Value::Null`].
    ///
    /// A non-empty `choices` slice restricts the result to those fields.
    pub fn safe_values(&self, choices: &[&str]) -> FieldStore {
        self.field_names()
            .into_iter()
            .filter(|f| choices.is_empty() || choices.contains(&f.as_str()))
            .map(|f| {
                let value = self.values.get(&f).cloned().unwrap_or(Value::Null);
                (f, value)
            })
            .collect()
    }

    /// Adds a named pre-filter to specific fields, or to every known field
    /// when `fields` is empty.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvableCallback`] if the filter name resolves to
    /// nothing. Raised here, not at validation time.
    pub fn pre_filter(&mut self, filter: &str, fields: &[&str]) -> Result<&mut Self, Error> {
        let filter = self.registry.resolve_filter(filter)?;
        push_filters(&mut self.pre_filters, filter, fields);
        Ok(self)
    }

    /// Adds a closure pre-filter. Closures are already invocable, so this
    /// never fails.
    pub fn pre_filter_fn<F>(&mut self, filter: F, fields: &[&str]) -> &mut Self
    where
        F: Fn(&str) -> String + 'static,
    {
        push_filters(&mut self.pre_filters, Rc::new(filter), fields);
        self
    }

    /// Adds a named post-filter; same mechanics as
    /// [`pre_filter`](Self::pre_filter), applied after rules and callbacks.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvableCallback`] if the filter name resolves to
    /// nothing.
    pub fn post_filter(&mut self, filter: &str, fields: &[&str]) -> Result<&mut Self, Error> {
        let filter = self.registry.resolve_filter(filter)?;
        push_filters(&mut self.post_filters, filter, fields);
        Ok(self)
    }

    /// Adds a closure post-filter.
    pub fn post_filter_fn<F>(&mut self, filter: F, fields: &[&str]) -> &mut Self
    where
        F: Fn(&str) -> String + 'static,
    {
        push_filters(&mut self.post_filters, Rc::new(filter), fields);
        self
    }

    /// Adds rules to one field from specification strings like
    /// `"required"`, `"length[3,5]"`, or `"!digit"`.
    ///
    /// A default label is derived for the field if none is set.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvableCallback`] if any rule name resolves to
    /// nothing.
    pub fn add_rules(&mut self, field: &str, specs: &[&str]) -> Result<&mut Self, Error> {
        self.default_label(field);
        for spec in specs {
            let rule = self.build_rule(spec)?;
            self.rules
                .entry(FieldKey::Named(field.to_string()))
                .or_default()
                .push(rule);
        }
        Ok(self)
    }

    /// Adds rules that apply to every known field. Wildcard rules use
    /// continue semantics: a failure on one field never stops evaluation
    /// of the others.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvableCallback`] if any rule name resolves to
    /// nothing.
    pub fn add_rules_all(&mut self, specs: &[&str]) -> Result<&mut Self, Error> {
        for spec in specs {
            let rule = self.build_rule(spec)?;
            self.rules.entry(FieldKey::Any).or_default().push(rule);
        }
        Ok(self)
    }

    /// Adds an already-bound rule closure under a reporting name.
    pub fn add_rule_fn<F>(&mut self, field: &str, name: &str, rule: F) -> &mut Self
    where
        F: Fn(&FieldStore, &Value, &[String]) -> bool + 'static,
    {
        self.default_label(field);
        self.rules
            .entry(FieldKey::Named(field.to_string()))
            .or_default()
            .push(RuleSpec {
                name: name.to_string(),
                callable: Callable::Bound(Rc::new(rule)),
                args: Vec::new(),
                negate: false,
            });
        self
    }

    fn build_rule(&mut self, spec: &str) -> Result<RuleSpec, Error> {
        let parsed = parse_rule_spec(spec);
        let callable = self.registry.resolve_rule(&parsed.name)?;
        Ok(RuleSpec {
            name: parsed.name,
            callable,
            args: parsed.args,
            negate: parsed.negate,
        })
    }

    /// Adds a callback to one field. Callbacks run after rules, are
    /// skipped for fields that already have an error, and record their own
    /// errors.
    pub fn add_callback<F>(&mut self, field: &str, callback: F) -> &mut Self
    where
        F: Fn(&mut Validator, &str) + 'static,
    {
        self.default_label(field);
        self.callbacks
            .entry(FieldKey::Named(field.to_string()))
            .or_default()
            .push(Rc::new(callback));
        self
    }

    /// Adds a callback that runs for every known field.
    pub fn add_callback_all<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&mut Validator, &str) + 'static,
    {
        self.callbacks
            .entry(FieldKey::Any)
            .or_default()
            .push(Rc::new(callback));
        self
    }

    /// Permits additional rule names to run on empty fields, on top of the
    /// default `required` and `matches`.
    pub fn allow_empty_rules(&mut self, names: &[&str]) -> &mut Self {
        self.empty_rules.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Sets the display label for a field, used for `:field` in messages.
    pub fn label(&mut self, field: &str, label: &str) -> &mut Self {
        self.labels.insert(field.to_string(), label.to_string());
        self
    }

    /// Sets several labels at once.
    pub fn labels<'a, I>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (field, label) in pairs {
            self.label(field, label);
        }
        self
    }

    fn default_label(&mut self, field: &str) {
        if !self.labels.contains_key(field) {
            let spaced = NON_LETTER.replace_all(field, " ");
            self.labels
                .insert(field.to_string(), valid::ucfirst(spaced.trim()));
        }
    }

    /// Records an error against a field, replacing any existing one.
    /// Typically called from callbacks.
    pub fn add_error(&mut self, field: &str, rule: &str, args: &[String]) -> &mut Self {
        self.errors.insert(
            field.to_string(),
            FieldError {
                rule: rule.to_string(),
                args: args.to_vec(),
            },
        );
        self
    }

    /// Runs the four phases and returns whether every field passed.
    ///
    /// Phase order: pre-filters, rules, callbacks, post-filters. Each run
    /// starts from a clean error map, so the engine can be re-validated
    /// after its values change. Filter transformations persist in the
    /// store regardless of the verdict, and the store is reduced to the
    /// known (configured) fields.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();

        let fields = self.field_names();

        // Working snapshot over the known fields; absent fields become Null
        let mut working: FieldStore = fields
            .iter()
            .map(|f| {
                let value = self.values.get(f).cloned().unwrap_or(Value::Null);
                (f.clone(), value)
            })
            .collect();

        // Phase 1: pre-filters transform values and never raise errors
        run_filters(&self.pre_filters, &fields, &mut working);

        // Rules observe the full store overlaid with the filtered working
        // values, so cross-field rules can see unconfigured fields too
        let mut view = self.values.clone();
        view.extend(working.clone());

        // Phase 2: rules, first-error-wins per field
        for (key, specs) in &self.rules {
            match key {
                FieldKey::Named(field) => {
                    for spec in specs {
                        if self.errors.contains_key(field) {
                            // First error wins; later rules are skipped
                            break;
                        }
                        let value = working.get(field).unwrap_or(&Value::Null);
                        if value.is_empty() && !self.empty_rules.contains(&spec.name) {
                            continue;
                        }
                        if spec.callable.check(&view, value, &spec.args) == spec.negate {
                            record_failure(&mut self.errors, field, spec);
                            break;
                        }
                    }
                }
                FieldKey::Any => {
                    // Continue semantics: a failure skips only that field
                    for spec in specs {
                        for field in &fields {
                            if self.errors.contains_key(field) {
                                continue;
                            }
                            let value = working.get(field).unwrap_or(&Value::Null);
                            if value.is_empty() && !self.empty_rules.contains(&spec.name) {
                                continue;
                            }
                            if spec.callable.check(&view, value, &spec.args) == spec.negate {
                                record_failure(&mut self.errors, field, spec);
                            }
                        }
                    }
                }
            }
        }

        // Commit filtered values before callbacks, so callbacks observe
        // what the rules observed
        self.values = working;

        // Phase 3: callbacks, skipped for fields that already failed
        let callbacks: Vec<(FieldKey, Vec<CallbackFn>)> = self
            .callbacks
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, list) in callbacks {
            match key {
                FieldKey::Named(field) => {
                    for callback in list {
                        if self.errors.contains_key(&field) {
                            break;
                        }
                        callback(self, &field);
                    }
                }
                FieldKey::Any => {
                    for callback in list {
                        for field in &fields {
                            if self.errors.contains_key(field) {
                                continue;
                            }
                            callback(self, field);
                        }
                    }
                }
            }
        }

        // Phase 4: post-filters normalize the now-validated values
        run_filters(&self.post_filters, &fields, &mut self.values);

        if self.errors.is_empty() {
            debug!(fields = fields.len(), "validation passed");
            true
        } else {
            debug!(
                fields = fields.len(),
                errors = self.errors.len(),
                "validation failed"
            );
            false
        }
    }

    /// The error map: field name to failing rule name.
    pub fn errors(&self) -> IndexMap<String, String> {
        self.errors
            .iter()
            .map(|(field, error)| (field.clone(), error.rule.clone()))
            .collect()
    }

    /// Resolves display messages for every recorded error.
    ///
    /// Lookup walks a three-tier fallback chain (`{file}.{field}.{rule}`,
    /// `{file}.{field}.default`, `default.{rule}`), detecting misses by
    /// the translator echoing the key back. `:field` interpolates the
    /// translated label, `:param1`… the translated rule arguments. When
    /// the whole chain misses, the first key itself is the message, so a
    /// missing catalog entry is visible instead of blank.
    pub fn messages(&self, file: &str, translator: &dyn Translate) -> IndexMap<String, String> {
        let mut messages = IndexMap::new();
        for (field, error) in &self.errors {
            let chain = [
                format!("{}.{}.{}", file, field, error.rule),
                format!("{}.{}.default", file, field),
                format!("default.{}", error.rule),
            ];

            let mut message = None;
            for key in &chain {
                let resolved = translator.translate(key);
                if &resolved != key {
                    message = Some(resolved);
                    break;
                }
            }
            let mut message = message.unwrap_or_else(|| chain[0].clone());

            let label = self
                .labels
                .get(field)
                .cloned()
                .unwrap_or_else(|| field.clone());
            message = message.replace(":field", &translator.translate(&label));

            // Highest parameter index first, so :param10 is not clobbered
            // by the :param1 replacement
            for (i, arg) in error.args.iter().enumerate().rev() {
                let placeholder = format!(":param{}", i + 1);
                message = message.replace(&placeholder, &translator.translate(arg));
            }

            messages.insert(field.clone(), message);
        }
        messages
    }
}

fn push_filters(
    map: &mut IndexMap<FieldKey, Vec<FilterFn>>,
    filter: FilterFn,
    fields: &[&str],
) {
    if fields.is_empty() {
        map.entry(FieldKey::Any).or_default().push(filter);
    } else {
        for field in fields {
            map.entry(FieldKey::Named(field.to_string()))
                .or_default()
                .push(Rc::clone(&filter));
        }
    }
}

fn run_filters(
    filters: &IndexMap<FieldKey, Vec<FilterFn>>,
    fields: &[String],
    store: &mut FieldStore,
) {
    for (key, list) in filters {
        for filter in list {
            match key {
                FieldKey::Any => {
                    for field in fields {
                        apply_filter(store, field, filter);
                    }
                }
                FieldKey::Named(field) => apply_filter(store, field, filter),
            }
        }
    }
}

/// Applies a filter to one field, element-wise over composites. `Null`
/// passes through: filters transform values, they do not invent them.
fn apply_filter(store: &mut FieldStore, field: &str, filter: &FilterFn) {
    if let Some(value) = store.get(field) {
        let filtered = value.map_scalars(&|s: &str| filter(s));
        store.insert(field.to_string(), filtered);
    }
}

fn record_failure(errors: &mut IndexMap<String, FieldError>, field: &str, spec: &RuleSpec) {
    let rule = if spec.negate {
        format!("!{}", spec.name)
    } else {
        spec.name.clone()
    };
    errors.insert(
        field.to_string(),
        FieldError {
            rule,
            args: spec.args.clone(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::store;

    #[test]
    fn short_circuit_first_error_wins() {
        let mut post = Validator::new(store([("email", "")]));
        post.add_rules("email", &["required", "length[3,5]"]).unwrap();

        assert!(!post.validate());
        let errors = post.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["email"], "required");
    }

    #[test]
    fn empty_fields_skip_non_exempt_rules() {
        let mut post = Validator::new(store([("nickname", "")]));
        post.add_rules("nickname", &["length[3,5]"]).unwrap();

        // length is not empty-exempt, so the empty field passes untouched
        assert!(post.validate());
        assert!(post.errors().is_empty());
    }

    #[test]
    fn allow_empty_rules_extends_exemptions() {
        let mut post = Validator::new(store([("nickname", "")]));
        post.add_rules("nickname", &["length[3,5]"]).unwrap();
        post.allow_empty_rules(&["length"]);

        assert!(!post.validate());
        assert_eq!(post.errors()["nickname"], "length");
    }

    #[test]
    fn wildcard_failure_continues_to_other_fields() {
        let mut post = Validator::new(store([("a", "xx"), ("b", "12")]));
        // Register both fields so the wildcard knows about them
        post.add_rules("a", &["required"]).unwrap();
        post.add_rules("b", &["required"]).unwrap();
        post.add_rules_all(&["digit"]).unwrap();

        assert!(!post.validate());
        let errors = post.errors();
        assert_eq!(errors.get("a").map(String::as_str), Some("digit"));
        assert!(!errors.contains_key("b"));
    }

    #[test]
    fn matches_rule_cross_field() {
        let mut post = Validator::new(store([("password", "x"), ("confirm", "y")]));
        post.add_rules("confirm", &["matches[password]"]).unwrap();

        assert!(!post.validate());
        assert_eq!(post.errors()["confirm"], "matches");

        let mut post2 = post.copy(store([("password", "x"), ("confirm", "x")]));
        post2.add_rules("password", &["required"]).unwrap();
        assert!(post2.validate());
    }

    #[test]
    fn matches_runs_on_empty_field() {
        // matches is in the default empty-exempt set: an empty confirm
        // still gets compared against a non-empty password
        let mut post = Validator::new(store([("password", "hunter2"), ("confirm", "")]));
        post.add_rules("password", &["required"]).unwrap();
        post.add_rules("confirm", &["matches[password]"]).unwrap();

        assert!(!post.validate());
        assert_eq!(post.errors()["confirm"], "matches");
        assert!(!post.errors().contains_key("password"));
    }

    #[test]
    fn debug_output_skips_callables() {
        let mut post = Validator::new(store([("email", "")]));
        post.add_rules("email", &["required"]).unwrap();
        assert!(!post.validate());

        let rendered = format!("{:?}", post);
        assert!(rendered.contains("Validator"));
        assert!(rendered.contains("email"));
        assert!(rendered.contains("required"));
    }

    #[test]
    fn negated_rule_records_bang_name() {
        let mut post = Validator::new(store([("code", "123")]));
        post.add_rules("code", &["!digit"]).unwrap();

        assert!(!post.validate());
        assert_eq!(post.errors()["code"], "!digit");

        let mut post = Validator::new(store([("code", "abc")]));
        post.add_rules("code", &["!digit"]).unwrap();
        assert!(post.validate());
    }

    #[test]
    fn unresolvable_rule_fails_at_registration() {
        let mut post = Validator::new(store([("x", "1")]));
        let err = post.add_rules("x", &["no_such_rule"]).unwrap_err();
        assert!(matches!(err, Error::UnresolvableCallback { .. }));
    }

    #[test]
    fn filters_persist_even_when_validation_fails() {
        let mut post = Validator::new(store([("name", "  Bob  "), ("email", "")]));
        post.pre_filter("trim", &["name"]).unwrap();
        post.add_rules("name", &["required"]).unwrap();
        post.add_rules("email", &["required"]).unwrap();

        assert!(!post.validate());
        assert_eq!(post.errors()["email"], "required");
        assert_eq!(post.safe_values(&[])["name"].as_str(), Some("Bob"));
    }

    #[test]
    fn post_filters_run_after_rules() {
        let mut post = Validator::new(store([("name", "bob")]));
        post.add_rules("name", &["length[2,5]"]).unwrap();
        post.post_filter("ucfirst", &["name"]).unwrap();

        assert!(post.validate());
        assert_eq!(post.value("name").unwrap().as_str(), Some("Bob"));
    }

    #[test]
    fn callbacks_skip_failed_fields_and_record_errors() {
        let mut post = Validator::new(store([("email", "taken@example.com"), ("user", "")]));
        post.add_rules("user", &["required"]).unwrap();
        post.add_callback("email", |engine, field| {
            let taken = engine.value(field).and_then(Value::as_str) == Some("taken@example.com");
            if taken {
                engine.add_error(field, "email_exists", &[]);
            }
        });
        post.add_callback("user", |engine, field| {
            // user already failed required; this must never run
            engine.add_error(field, "should_not_happen", &[]);
        });

        assert!(!post.validate());
        let errors = post.errors();
        assert_eq!(errors["email"], "email_exists");
        assert_eq!(errors["user"], "required");
    }

    #[test]
    fn wildcard_filter_applies_to_all_known_fields() {
        let mut post = Validator::new(store([("a", "  x  "), ("b", "  y  ")]));
        post.add_rules("a", &["required"]).unwrap();
        post.add_rules("b", &["required"]).unwrap();
        post.pre_filter("trim", &[]).unwrap();

        assert!(post.validate());
        assert_eq!(post.value("a").unwrap().as_str(), Some("x"));
        assert_eq!(post.value("b").unwrap().as_str(), Some("y"));
    }

    #[test]
    fn filters_apply_element_wise_to_composites() {
        let mut values = FieldStore::new();
        values.insert(
            "tags".to_string(),
            Value::List(vec![Value::from(" a "), Value::from(" b ")]),
        );
        let mut post = Validator::new(values);
        post.add_rules("tags", &["required"]).unwrap();
        post.pre_filter("trim", &["tags"]).unwrap();

        assert!(post.validate());
        match post.value("tags").unwrap() {
            Value::List(items) => {
                assert_eq!(items[0].as_str(), Some("a"));
                assert_eq!(items[1].as_str(), Some("b"));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn safe_values_includes_null_for_unset_known_fields() {
        let mut post = Validator::new(store([("present", "1")]));
        post.add_rules("present", &["required"]).unwrap();
        post.add_rules("missing", &["length[3,5]"]).unwrap();

        let safe = post.safe_values(&[]);
        assert_eq!(safe["present"].as_str(), Some("1"));
        assert_eq!(safe["missing"], Value::Null);

        let only = post.safe_values(&["present"]);
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn revalidation_resets_errors() {
        let mut post = Validator::new(store([("email", "")]));
        post.add_rules("email", &["required"]).unwrap();

        assert!(!post.validate());
        post.set_value("email", Value::from("a@example.com"));
        assert!(post.validate());
        assert!(post.errors().is_empty());
    }

    #[test]
    fn copy_shares_config_but_not_errors() {
        let mut original = Validator::new(store([("email", "")]));
        original.add_rules("email", &["required"]).unwrap();
        assert!(!original.validate());

        let mut fresh = original.copy(store([("email", "a@example.com")]));
        assert!(fresh.errors().is_empty());
        assert!(fresh.validate());
        // Original keeps its own error state
        assert_eq!(original.errors()["email"], "required");
    }

    #[test]
    fn default_labels_are_title_cased() {
        let mut post = Validator::new(store([("first_name", "")]));
        post.add_rules("first_name", &["required"]).unwrap();
        assert!(!post.validate());

        let messages = post.messages("forms", &crate::translate::NullTranslator);
        // No catalog: the attempted key surfaces, never a blank message
        assert_eq!(messages["first_name"], "forms.first_name.required");
    }

    #[test]
    fn messages_fallback_chain_and_interpolation() {
        use std::collections::HashMap;

        let mut post = Validator::new(store([("age", "abc"), ("email", "")]));
        post.add_rules("age", &["length[1,3]", "digit"]).unwrap();
        post.add_rules("email", &["required"]).unwrap();
        assert!(!post.validate());

        let mut catalog: HashMap<String, String> = HashMap::new();
        catalog.insert(
            "forms.age.digit".to_string(),
            ":field must be numeric".to_string(),
        );
        catalog.insert(
            "default.required".to_string(),
            ":field is required".to_string(),
        );
        catalog.insert("Email".to_string(), "E-mail address".to_string());

        let messages = post.messages("forms", &catalog);
        // Tier 1 hit for age
        assert_eq!(messages["age"], "Age must be numeric");
        // Tier 3 hit for email, with translated label
        assert_eq!(messages["email"], "E-mail address is required");
    }

    #[test]
    fn messages_interpolate_params() {
        use std::collections::HashMap;

        let mut post = Validator::new(store([("pin", "12")]));
        post.add_rules("pin", &["length[4,6]"]).unwrap();
        assert!(!post.validate());

        let mut catalog: HashMap<String, String> = HashMap::new();
        catalog.insert(
            "default.length".to_string(),
            ":field must be between :param1 and :param2 characters".to_string(),
        );

        let messages = post.messages("forms", &catalog);
        assert_eq!(messages["pin"], "Pin must be between 4 and 6 characters");
    }

    #[test]
    fn registry_rules_resolve_in_engine() {
        let mut post = Validator::new(store([("code", "xyz")]));
        post.registry_mut()
            .register_rule("starts_x", |_, value, _| {
                value.as_str().is_some_and(|s| s.starts_with('x'))
            });
        post.add_rules("code", &["starts_x"]).unwrap();
        assert!(post.validate());
    }

    #[test]
    fn bound_rule_closures_report_under_their_name() {
        let mut post = Validator::new(store([("token", "abc")]));
        post.add_rule_fn("token", "token_format", |_, value, _| {
            value.as_str().is_some_and(|s| s.len() == 8)
        });

        assert!(!post.validate());
        assert_eq!(post.errors()["token"], "token_format");
    }

    #[test]
    fn depends_on_sees_unconfigured_fields() {
        let mut post = Validator::new(store([("city", "Wellington"), ("country", "NZ")]));
        // country has no rules of its own but is present in the store
        post.add_rules("city", &["depends_on[country]"]).unwrap();
        assert!(post.validate());

        let mut post = Validator::new(store([("city", "Wellington")]));
        post.add_rules("city", &["depends_on[country]"]).unwrap();
        assert!(!post.validate());
    }
}
