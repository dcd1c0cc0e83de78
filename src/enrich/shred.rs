//! Splitting delimiter-joined fields into lists, and joining them back.

use serde::Deserialize;
use serde_json::Value;

use super::{deserialize_path_list, Enrichment};
use crate::selector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShredAction {
    #[default]
    Shred,
    Unshred,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Shred {
    pub action: ShredAction,
    /// Fields to process, comma-separated in option maps.
    #[serde(deserialize_with = "deserialize_path_list")]
    pub prop: Vec<String>,
    pub delim: String,
}

impl Default for Shred {
    fn default() -> Self {
        Self {
            action: ShredAction::Shred,
            prop: Vec::new(),
            delim: ",".to_string(),
        }
    }
}

impl Shred {
    pub fn new(action: ShredAction, props: &[&str]) -> Self {
        Self {
            action,
            prop: props.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Join scalar items with `delim`; nulls are skipped. `None` when an item
    /// is itself a list or mapping.
    fn join(&self, items: &[Value]) -> Option<String> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Null => {}
                Value::String(s) => parts.push(s.clone()),
                Value::Bool(_) | Value::Number(_) => parts.push(item.to_string()),
                Value::Array(_) | Value::Object(_) => return None,
            }
        }
        Some(parts.join(&self.delim))
    }

    /// New value for one field, or `None` to leave it alone.
    fn process(&self, value: &Value) -> Option<Value> {
        match (self.action, value) {
            (ShredAction::Shred, Value::Array(items)) => {
                let joined = self.join(items)?;
                Some(self.split(&joined).unwrap_or(Value::String(joined)))
            }
            (ShredAction::Shred, Value::String(s)) => self.split(s),
            (ShredAction::Unshred, Value::Array(items)) => self.join(items).map(Value::String),
            _ => None,
        }
    }

    fn split(&self, s: &str) -> Option<Value> {
        if self.delim.is_empty() || !s.contains(self.delim.as_str()) {
            return None;
        }
        Some(Value::Array(
            s.split(self.delim.as_str())
                .map(|part| Value::String(part.trim().to_string()))
                .collect(),
        ))
    }
}

impl Enrichment for Shred {
    fn enrich(&self, doc: &mut Value) {
        if self.prop.is_empty() {
            tracing::error!("No prop supplied");
            return;
        }

        for prop in &self.prop {
            let Some(updated) = selector::get(doc, prop).and_then(|v| self.process(v)) else {
                continue;
            };
            if let Err(e) = selector::set(doc, prop, updated) {
                tracing::warn!("Unable to write {}: {}", prop, e);
            }
        }
    }
}
