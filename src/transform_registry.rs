//! Field transformation registry.
//!
//! A registry maps a source field name to a rule that reads the whole source
//! record and returns a fragment of the canonical envelope. Converters hold
//! one registry per target sub-tree and per source schema.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Partial envelope produced by one transform rule.
pub type Fragment = Map<String, Value>;

/// Per-call options threaded into every rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformContext {
    /// Name of the record field holding coordinates parallel to `coverage`.
    pub geoprop: Option<String>,
}

impl TransformContext {
    pub fn with_geoprop(geoprop: impl Into<String>) -> Self {
        Self {
            geoprop: Some(geoprop.into()),
        }
    }
}

/// Error type for registry lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    NotFound(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NotFound(name) => write!(f, "Transform not found: {}", name),
        }
    }
}

impl std::error::Error for TransformError {}

/// Trait for transform rules
///
/// Rules never fail: a field they cannot make sense of is simply left out
/// of the returned fragment.
pub trait TransformFn: Send + Sync {
    fn apply(&self, record: &Value, ctx: &TransformContext) -> Fragment;
}

impl<F> TransformFn for F
where
    F: Fn(&Value, &TransformContext) -> Fragment + Send + Sync,
{
    fn apply(&self, record: &Value, ctx: &TransformContext) -> Fragment {
        self(record, ctx)
    }
}

/// Build a one-key fragment, or an empty one when there is no value.
pub fn fragment(key: &str, value: Option<Value>) -> Fragment {
    let mut out = Fragment::new();
    if let Some(value) = value {
        out.insert(key.to_string(), value);
    }
    out
}

/// Rule that copies `source` verbatim into `target`.
pub fn copy_field(source: &'static str, target: &'static str) -> Box<dyn TransformFn> {
    Box::new(move |record: &Value, _: &TransformContext| {
        fragment(target, record.get(source).cloned())
    })
}

/// Registry of transform rules keyed by source field name.
///
/// Registration order is kept so listings are stable.
pub struct TransformRegistry {
    transforms: IndexMap<String, Box<dyn TransformFn>>,
}

impl TransformRegistry {
    /// Create a new empty transform registry
    pub fn new() -> Self {
        Self {
            transforms: IndexMap::new(),
        }
    }

    /// Register a rule, replacing any earlier rule for the same field.
    pub fn register(&mut self, field: impl Into<String>, func: Box<dyn TransformFn>) {
        self.transforms.insert(field.into(), func);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, field: impl Into<String>, func: Box<dyn TransformFn>) -> Self {
        self.register(field, func);
        self
    }

    /// Run the rule registered for `field`.
    pub fn call(
        &self,
        field: &str,
        record: &Value,
        ctx: &TransformContext,
    ) -> Result<Fragment, TransformError> {
        let transform = self
            .transforms
            .get(field)
            .ok_or_else(|| TransformError::NotFound(field.to_string()))?;

        Ok(transform.apply(record, ctx))
    }

    /// Run every rule whose field is present in `record`, merging into `target`.
    ///
    /// Fields are visited in the record map's key order, which is sorted
    /// unless serde_json's `preserve_order` is enabled. A later fragment
    /// overwrites keys set by an earlier one, so rules writing the same
    /// target should agree on a result. Returns the number of rules that ran.
    pub fn apply_to(
        &self,
        record: &Value,
        ctx: &TransformContext,
        target: &mut Map<String, Value>,
    ) -> usize {
        let Some(fields) = record.as_object() else {
            return 0;
        };

        let mut applied = 0;
        for field in fields.keys() {
            if let Some(transform) = self.transforms.get(field) {
                target.extend(transform.apply(record, ctx));
                applied += 1;
            }
        }
        applied
    }

    /// Check if a field has a registered rule
    pub fn has_transform(&self, field: &str) -> bool {
        self.transforms.contains_key(field)
    }

    /// Registered field names, in registration order.
    pub fn list_transforms(&self) -> Vec<&str> {
        self.transforms.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upper_title(record: &Value, _: &TransformContext) -> Fragment {
        let title = record
            .get("title")
            .and_then(Value::as_str)
            .map(|t| Value::String(t.to_uppercase()));
        fragment("title", title)
    }

    #[test]
    fn test_register_and_call_transform() {
        let mut registry = TransformRegistry::new();
        registry.register("title", Box::new(upper_title));

        let record = json!({"title": "hello"});
        let result = registry.call("title", &record, &TransformContext::default()).unwrap();
        assert_eq!(Value::Object(result), json!({"title": "HELLO"}));
    }

    #[test]
    fn test_transform_not_found() {
        let registry = TransformRegistry::new();
        let result = registry.call("nonexistent", &json!({}), &TransformContext::default());
        assert_eq!(result, Err(TransformError::NotFound("nonexistent".to_string())));
    }

    #[test]
    fn test_has_transform_and_listing_order() {
        let registry = TransformRegistry::new()
            .with("b", copy_field("b", "bee"))
            .with("a", copy_field("a", "ay"));

        assert!(registry.has_transform("a"));
        assert!(!registry.has_transform("c"));
        assert_eq!(registry.list_transforms(), vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_apply_to_only_runs_present_fields() {
        let registry = TransformRegistry::new()
            .with("title", Box::new(upper_title))
            .with("creator", copy_field("creator", "creator"));

        let mut out = Map::new();
        let applied = registry.apply_to(
            &json!({"title": "x", "other": 1}),
            &TransformContext::default(),
            &mut out,
        );

        assert_eq!(applied, 1);
        assert_eq!(Value::Object(out), json!({"title": "X"}));
    }

    #[test]
    fn test_later_fragments_overwrite_earlier() {
        let registry = TransformRegistry::new()
            .with(
                "a",
                Box::new(|_: &Value, _: &TransformContext| fragment("k", Some(json!("from a")))),
            )
            .with(
                "b",
                Box::new(|_: &Value, _: &TransformContext| fragment("k", Some(json!("from b")))),
            );

        let mut out = Map::new();
        registry.apply_to(&json!({"a": 1, "b": 2}), &TransformContext::default(), &mut out);
        // Record keys are visited in order, so "b" runs last.
        assert_eq!(out.get("k"), Some(&json!("from b")));
    }

    #[test]
    fn test_absent_value_yields_empty_fragment() {
        let rule = copy_field("creator", "creator");
        assert!(rule.apply(&json!({"title": "x"}), &TransformContext::default()).is_empty());
    }

    #[test]
    fn test_context_reaches_rules() {
        let registry = TransformRegistry::new().with(
            "coverage",
            Box::new(|_: &Value, ctx: &TransformContext| {
                fragment("geoprop", ctx.geoprop.clone().map(Value::String))
            }),
        );

        let ctx = TransformContext::with_geoprop("coords");
        let out = registry.call("coverage", &json!({}), &ctx).unwrap();
        assert_eq!(out.get("geoprop"), Some(&json!("coords")));
    }
}
