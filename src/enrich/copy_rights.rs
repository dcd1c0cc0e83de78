//! Rights propagation.

use serde::Deserialize;
use serde_json::Value;

use super::{deserialize_path_list, Enrichment};
use crate::selector;

pub const DEFAULT_RIGHTS_FIELD: &str = "aggregatedCHO/rights";

pub fn default_copy_to() -> Vec<String> {
    vec!["isShownAt".to_string(), "aggregatedCHO/hasView".to_string()]
}

/// Copies the rights statement onto the web resources of an envelope.
///
/// Only destinations that already exist are written to. A destination
/// holding a list gets the rights on every mapping in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CopyRights {
    /// Path of the rights statement to copy.
    pub rights_field: String,
    /// Destination paths, comma-separated in option maps.
    #[serde(deserialize_with = "deserialize_path_list")]
    pub copy_to: Vec<String>,
}

impl Default for CopyRights {
    fn default() -> Self {
        Self {
            rights_field: DEFAULT_RIGHTS_FIELD.to_string(),
            copy_to: default_copy_to(),
        }
    }
}

impl Enrichment for CopyRights {
    fn enrich(&self, doc: &mut Value) {
        let Some(rights) = selector::get(doc, &self.rights_field).cloned() else {
            return;
        };

        for dest in &self.copy_to {
            match selector::get_mut(doc, dest) {
                Some(Value::Object(resource)) => {
                    resource.insert("rights".to_string(), rights.clone());
                }
                Some(Value::Array(resources)) => {
                    for resource in resources.iter_mut().filter_map(Value::as_object_mut) {
                        resource.insert("rights".to_string(), rights.clone());
                    }
                }
                Some(_) => tracing::debug!("Not copying rights onto non-mapping {}", dest),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(mut doc: Value) -> Value {
        CopyRights::default().enrich(&mut doc);
        doc
    }

    #[test]
    fn test_no_rights_does_nothing() {
        let input = json!({
            "key1": "value1",
            "aggregatedCHO": {"key1": "value1", "key2": "value2"},
            "key2": "value2"
        });
        assert_eq!(run(input.clone()), input);
    }

    #[test]
    fn test_never_creates_structure() {
        let input = json!({
            "key1": "value1",
            "aggregatedCHO": {"key1": "value1", "rights": "These are the rights"}
        });
        let out = run(input.clone());
        assert_eq!(out, input);
        assert!(out.get("isShownAt").is_none());
    }

    #[test]
    fn test_copies_to_is_shown_at() {
        let out = run(json!({
            "isShownAt": {"key1": "value1", "rights": ""},
            "aggregatedCHO": {"rights": "These are the rights"}
        }));
        assert_eq!(
            out["isShownAt"],
            json!({"key1": "value1", "rights": "These are the rights"})
        );
    }

    #[test]
    fn test_copies_to_every_view() {
        let out = run(json!({
            "isShownAt": {"rights": ""},
            "aggregatedCHO": {
                "rights": "These are the rights",
                "hasView": [
                    {"key1": "value1", "rights": ""},
                    {"key1": "value1", "rights": ""}
                ]
            }
        }));

        assert_eq!(
            out,
            json!({
                "isShownAt": {"rights": "These are the rights"},
                "aggregatedCHO": {
                    "rights": "These are the rights",
                    "hasView": [
                        {"key1": "value1", "rights": "These are the rights"},
                        {"key1": "value1", "rights": "These are the rights"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_custom_rights_field_and_destinations() {
        let filter = CopyRights {
            rights_field: "sourceResource/rights".to_string(),
            copy_to: vec!["object".to_string()],
        };
        let mut doc = json!({
            "sourceResource": {"rights": ["A", "B"]},
            "object": {"@id": "x"},
            "isShownAt": {"@id": "y"}
        });
        filter.enrich(&mut doc);

        assert_eq!(doc["object"]["rights"], json!(["A", "B"]));
        assert!(doc["isShownAt"].get("rights").is_none());
    }
}
