//! Preview-image location for providers that publish thumbnails next to
//! the full-size object (`photo.jpg` → `photo_tb.jpg`).

use serde::Deserialize;
use serde_json::{json, Value};

use super::copy_rights::DEFAULT_RIGHTS_FIELD;
use super::{deserialize_flag, Enrichment};
use crate::group::string_items;
use crate::selector;

pub const RELATION_FIELD: &str = "aggregatedCHO/relation";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentifyObject {
    pub rights_field: String,
    /// Queue the thumbnail for download (`pending`) or not (`ignore`).
    #[serde(deserialize_with = "deserialize_flag")]
    pub download: bool,
}

impl Default for IdentifyObject {
    fn default() -> Self {
        Self {
            rights_field: DEFAULT_RIGHTS_FIELD.to_string(),
            download: true,
        }
    }
}

/// Insert `_tb` before the extension of the last path component.
///
/// Leading dots of the file name do not start an extension, so
/// `http://x/.hidden` becomes `http://x/.hidden_tb`.
pub fn thumbnail_url(url: &str) -> String {
    let name_start = url.rfind('/').map_or(0, |i| i + 1);
    let name = &url[name_start..];
    let stem_start = name.len() - name.trim_start_matches('.').len();

    let split = match name[stem_start..].rfind('.') {
        Some(dot) => name_start + stem_start + dot,
        None => url.len(),
    };
    let (base, ext) = url.split_at(split);
    format!("{}_tb{}", base, ext)
}

impl Enrichment for IdentifyObject {
    fn enrich(&self, doc: &mut Value) {
        let Some(url) = selector::get(doc, RELATION_FIELD)
            .and_then(|relation| string_items(relation).into_iter().next())
            .map(thumbnail_url)
        else {
            tracing::error!("Field {} does not exist", RELATION_FIELD);
            return;
        };

        let Some(rights) = selector::get(doc, &self.rights_field).cloned() else {
            tracing::error!("Field {} does not exist", self.rights_field);
            return;
        };

        let Some(root) = doc.as_object_mut() else {
            return;
        };
        root.insert(
            "object".to_string(),
            json!({ "@id": url, "format": "", "rights": rights }),
        );

        let status = if self.download { "pending" } else { "ignore" };
        let status = Value::String(status.to_string());
        if let Err(e) = selector::set(doc, "admin/object_status", status) {
            tracing::warn!("Unable to record object status: {}", e);
        }
    }
}
