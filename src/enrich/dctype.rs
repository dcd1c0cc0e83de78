//! DCMI type normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{reshape, Enrichment};
use crate::group::as_items;
use crate::selector;

/// Ordered: plurals collapse first so the alias rule sees the singular.
static SUBSTITUTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [("images", "image"), ("still image", "image")]
        .into_iter()
        .map(|(pattern, replacement)| {
            let re = Regex::new(pattern).expect("valid type cleanup regex");
            (re, replacement)
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichType {
    /// Field holding the type values.
    pub prop: String,
}

impl Default for EnrichType {
    fn default() -> Self {
        Self {
            prop: "aggregatedCHO/type".to_string(),
        }
    }
}

pub fn cleanup(s: &str) -> String {
    SUBSTITUTIONS
        .iter()
        .fold(s.trim().to_lowercase(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

impl Enrichment for EnrichType {
    fn enrich(&self, doc: &mut Value) {
        let Some(value) = selector::get(doc, &self.prop).filter(|v| !v.is_null()) else {
            return;
        };
        let scalar = !value.is_array();

        let cleaned: Vec<Value> = as_items(value)
            .into_iter()
            .map(|item| match item.as_str() {
                Some(text) => Value::String(cleanup(text)),
                None => item.clone(),
            })
            .collect();

        if let Err(e) = selector::set(doc, &self.prop, reshape(cleaned, scalar)) {
            tracing::warn!("Unable to write {}: {}", self.prop, e);
        }
    }
}
