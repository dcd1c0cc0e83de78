//! Subject heading cleanup.
//!
//! Plain subject strings become `{"name": ...}` mappings so later stages
//! can attach authority links beside the label.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Enrichment;
use crate::group::as_items;
use crate::selector;

static SUBDIVISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*--\s*").expect("valid subdivision regex"));
static TRAILING_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.+$").expect("valid trailing period regex"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichSubject {
    pub prop: String,
}

impl Default for EnrichSubject {
    fn default() -> Self {
        Self {
            prop: "aggregatedCHO/subject".to_string(),
        }
    }
}

/// `"Dogs -- Mean."` → `"Dogs--Mean"`.
pub fn cleanup(s: &str) -> String {
    let s = SUBDIVISION_RE.replace_all(s.trim(), "--");
    TRAILING_PERIOD_RE.replace(&s, "").trim_end().to_string()
}

impl Enrichment for EnrichSubject {
    fn enrich(&self, doc: &mut Value) {
        let Some(value) = selector::get(doc, &self.prop) else {
            return;
        };

        let subjects: Vec<Value> = as_items(value)
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(json!({ "name": cleanup(s) })),
                Value::Object(map) => {
                    let mut map = map.clone();
                    if let Some(Value::String(name)) = map.get("name") {
                        let name = cleanup(name);
                        map.insert("name".to_string(), Value::String(name));
                    }
                    Some(Value::Object(map))
                }
                other => {
                    tracing::debug!("Dropping subject of unexpected shape: {}", other);
                    None
                }
            })
            .filter(|subject| subject.get("name").and_then(Value::as_str) != Some(""))
            .collect();

        if let Err(e) = selector::set(doc, &self.prop, Value::Array(subjects)) {
            tracing::warn!("Unable to write {}: {}", self.prop, e);
        }
    }
}
