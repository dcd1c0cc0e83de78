//! Media-type normalization.
//!
//! Values that clean up into an Internet Media Type stay in `prop`; the
//! rest move, untouched, to the physical-format field named by `alternate`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{reshape, Enrichment};
use crate::group::as_items;
use crate::selector;

/// Top-level media types accepted as an IMT. A subtype is not required.
pub const IMT_TYPES: &[&str] = &[
    "application",
    "audio",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

/// Ordered cleanup substitutions.
static SUBSTITUTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("image/jpg", "image/jpeg"),
        ("image/jp$", "image/jpeg"),
        ("img/jpg", "image/jpeg"),
        (r"\W$", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let re = Regex::new(pattern).expect("valid format cleanup regex");
        (re, replacement)
    })
    .collect()
});

/// Drops trailing commentary after the media type ("image/jpeg 2 pages").
static TRAILING_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9/]+)\s.*").expect("valid trailing text regex"));

static IMT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:{})(?:/|$)", IMT_TYPES.join("|"))).expect("valid imt regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichFormat {
    /// Field holding the format values.
    pub prop: String,
    /// Field receiving values that are not media types.
    pub alternate: String,
}

impl Default for EnrichFormat {
    fn default() -> Self {
        Self {
            prop: "isShownAt/format".to_string(),
            alternate: "aggregatedCHO/physicalMedium".to_string(),
        }
    }
}

/// Lowercase, trim and run the substitution table.
pub fn cleanup(s: &str) -> String {
    let mut s = s.trim().to_lowercase();
    for (pattern, replacement) in SUBSTITUTIONS.iter() {
        s = pattern.replace_all(&s, *replacement).into_owned();
        s = TRAILING_TEXT_RE.replace(&s, "$1").into_owned();
    }
    s
}

pub fn is_imt(s: &str) -> bool {
    IMT_RE.is_match(s)
}

impl Enrichment for EnrichFormat {
    fn enrich(&self, doc: &mut Value) {
        let Some(value) = selector::get(doc, &self.prop) else {
            return;
        };
        let scalar = !value.is_array();

        let mut formats = Vec::new();
        let mut physical: Vec<Value> = match selector::get(doc, &self.alternate) {
            Some(existing) => as_items(existing).into_iter().cloned().collect(),
            None => Vec::new(),
        };
        let had_physical = !physical.is_empty();

        for item in as_items(value) {
            let Some(text) = item.as_str() else {
                physical.push(item.clone());
                continue;
            };
            let cleaned = cleanup(text);
            if is_imt(&cleaned) {
                formats.push(Value::String(cleaned));
            } else {
                physical.push(item.clone());
            }
        }

        if formats.is_empty() {
            selector::delete(doc, &self.prop);
        } else if let Err(e) = selector::set(doc, &self.prop, reshape(formats, scalar)) {
            tracing::warn!("Unable to write {}: {}", self.prop, e);
        }

        if !physical.is_empty() {
            let physical = reshape(physical, scalar && !had_physical);
            if let Err(e) = selector::set(doc, &self.alternate, physical) {
                tracing::warn!("Unable to write {}: {}", self.alternate, e);
            }
        }
    }
}
