//! Relocation of date-shaped entries into `aggregatedCHO/temporal`.
//!
//! Harvested spatial and subject lists often carry dates ("1861-1865",
//! "(1912)") among the place or topic names. Entries whose cleaned name
//! looks like a year or a delimited date are moved.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::Enrichment;
use crate::group::as_items;
use crate::selector;

pub const TEMPORAL_FIELD: &str = "aggregatedCHO/temporal";

static PARENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()]").expect("valid parens regex"));

static PREFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| date_patterns(""));
static WORD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| date_patterns(r"\b"));

fn date_patterns(suffix: &str) -> Vec<Regex> {
    [r" *\d{4}", r"( *\d{1,4} *[-/]){2} *\d{1,4}"]
        .into_iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{}){}", pattern, suffix)).expect("valid date shape regex")
        })
        .collect()
}

/// How a date shape must sit at the start of a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateAnchor {
    /// The name only has to start with the shape, so `"1850s"` and
    /// `"12345 Main St"` both count.
    #[default]
    Prefix,
    /// The shape must end on a word boundary.
    Word,
}

impl DateAnchor {
    fn patterns(self) -> &'static [Regex] {
        match self {
            DateAnchor::Prefix => &PREFIX_PATTERNS,
            DateAnchor::Word => &WORD_PATTERNS,
        }
    }

    pub fn is_date_like(self, name: &str) -> bool {
        self.patterns().iter().any(|re| re.is_match(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MoveDatesToTemporal {
    /// List of `{"name": ...}` entries to scan. Required.
    pub prop: Option<String>,
    pub anchor: DateAnchor,
}

impl MoveDatesToTemporal {
    pub fn new(prop: impl Into<String>) -> Self {
        Self {
            prop: Some(prop.into()),
            anchor: DateAnchor::default(),
        }
    }
}

fn cleanup(s: &str) -> String {
    PARENS_RE.replace_all(s, "").trim().to_string()
}

impl Enrichment for MoveDatesToTemporal {
    fn enrich(&self, doc: &mut Value) {
        let Some(prop) = self.prop.as_deref() else {
            tracing::error!("No prop supplied");
            return;
        };
        let Some(entries) = selector::get(doc, prop) else {
            return;
        };

        let mut temporal: Vec<Value> = selector::get(doc, TEMPORAL_FIELD)
            .map(|t| as_items(t).into_iter().cloned().collect())
            .unwrap_or_default();
        let mut remaining = Vec::new();

        for entry in as_items(entries) {
            let mut entry = entry.clone();
            let cleaned = entry.get("name").and_then(Value::as_str).map(cleanup);
            match cleaned {
                Some(name) if self.anchor.is_date_like(&name) => {
                    entry["name"] = Value::String(name);
                    temporal.push(entry);
                }
                _ => remaining.push(entry),
            }
        }

        if !temporal.is_empty() {
            if let Err(e) = selector::set(doc, TEMPORAL_FIELD, Value::Array(temporal)) {
                tracing::warn!("Unable to write {}: {}", TEMPORAL_FIELD, e);
            }
        }

        if remaining.is_empty() {
            selector::delete(doc, prop);
        } else if let Err(e) = selector::set(doc, prop, Value::Array(remaining)) {
            tracing::warn!("Unable to write {}: {}", prop, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_moves_dates_out_of_spatial() {
        let mut doc = json!({"aggregatedCHO": {"spatial": [
            {"name": "Lexington, KY"},
            {"name": "(1861-1865)"},
            {"name": "1912"},
            {"name": "12/07/1941"}
        ]}});
        MoveDatesToTemporal::new("aggregatedCHO/spatial").enrich(&mut doc);

        assert_eq!(doc["aggregatedCHO"]["spatial"], json!([{"name": "Lexington, KY"}]));
        assert_eq!(
            doc["aggregatedCHO"]["temporal"],
            json!([{"name": "1861-1865"}, {"name": "1912"}, {"name": "12/07/1941"}])
        );
    }

    #[test]
    fn test_appends_to_existing_temporal_and_removes_emptied_prop() {
        let mut doc = json!({"aggregatedCHO": {
            "temporal": [{"start": "1900", "end": "1900"}],
            "spatial": {"name": " 1950 "}
        }});
        MoveDatesToTemporal::new("aggregatedCHO/spatial").enrich(&mut doc);

        assert_eq!(
            doc,
            json!({"aggregatedCHO": {"temporal": [
                {"start": "1900", "end": "1900"},
                {"name": "1950"}
            ]}})
        );
    }

    #[test]
    fn test_missing_prop_option_leaves_document() {
        let input = json!({"aggregatedCHO": {"spatial": [{"name": "1912"}]}});
        let mut doc = input.clone();
        MoveDatesToTemporal::default().enrich(&mut doc);
        assert_eq!(doc, input);
    }

    #[test]
    fn test_missing_field_is_noop() {
        let input = json!({"aggregatedCHO": {"title": "x"}});
        let mut doc = input.clone();
        MoveDatesToTemporal::new("aggregatedCHO/spatial").enrich(&mut doc);
        assert_eq!(doc, input);
    }

    #[test]
    fn test_entries_without_names_stay() {
        let mut doc = json!({"spatial": [{"coordinates": "1, 2"}, "1912"]});
        MoveDatesToTemporal::new("spatial").enrich(&mut doc);
        assert_eq!(doc["spatial"], json!([{"coordinates": "1, 2"}, "1912"]));
        assert!(doc.get("aggregatedCHO").is_none());
    }

    #[test]
    fn test_prefix_anchoring_accepts_longer_tokens() {
        assert!(DateAnchor::Prefix.is_date_like("1850s"));
        assert!(DateAnchor::Prefix.is_date_like("12345 Main St"));
        assert!(DateAnchor::Prefix.is_date_like("1861-1865"));
        assert!(!DateAnchor::Prefix.is_date_like("Main St 1912"));
        assert!(!DateAnchor::Prefix.is_date_like("Route 66"));
    }

    #[test]
    fn test_word_anchoring_requires_boundary() {
        assert!(!DateAnchor::Word.is_date_like("1850s"));
        assert!(!DateAnchor::Word.is_date_like("12345 Main St"));
        assert!(DateAnchor::Word.is_date_like("1912"));
        assert!(DateAnchor::Word.is_date_like("1861-1865"));
        assert!(DateAnchor::Word.is_date_like("5/7/2012"));
    }

    #[test]
    fn test_word_anchoring_keeps_street_addresses() {
        let mut doc = json!({"spatial": [{"name": "12345 Main St"}, {"name": "1912"}]});
        let filter = MoveDatesToTemporal {
            prop: Some("spatial".to_string()),
            anchor: DateAnchor::Word,
        };
        filter.enrich(&mut doc);

        assert_eq!(doc["spatial"], json!([{"name": "12345 Main St"}]));
        assert_eq!(doc["aggregatedCHO"]["temporal"], json!([{"name": "1912"}]));
    }
}
