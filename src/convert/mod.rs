//! Source record → canonical envelope conversion.
//!
//! Each supported source schema contributes two registries: one whose
//! fragments land at the top level of the envelope (the aggregation:
//! identifiers, collection, landing page) and one whose fragments land in
//! `aggregatedCHO` (the described object). Both are driven over the same
//! source fields.
//!
//! The resulting envelope looks like:
//!
//! ```text
//! {
//!   "@context": { ... },
//!   "id": "...", "@id": "http://dp.la/api/items/...",
//!   "originalRecord": { <source record, verbatim> },
//!   "isShownAt": { "@id": "...", "format": "..." },
//!   "provider": { <decoded contributor header> },
//!   "aggregatedCHO": { "title": ..., "creator": ..., "temporal": [...], ... }
//! }
//! ```

pub mod arc;
pub mod context;
pub mod oai;

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::selector::is_empty_value;
use crate::transform_registry::{fragment, Fragment, TransformContext, TransformRegistry};

pub use context::CONTEXT;

/// Base of the canonical item URI built from a record id.
pub const ITEM_BASE_URL: &str = "http://dp.la/api/items/";

static ABSOLUTE_URI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").expect("valid uri regex"));

/// Supported source schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Flat Dublin Core records from an OAI-PMH harvest.
    Oai,
    /// JSON-ified NARA ARC descriptions.
    Arc,
}

impl Schema {
    pub fn cho_registry(&self) -> &'static TransformRegistry {
        match self {
            Schema::Oai => &oai::CHO_TRANSFORMER,
            Schema::Arc => &arc::CHO_TRANSFORMER,
        }
    }

    pub fn aggregation_registry(&self) -> &'static TransformRegistry {
        match self {
            Schema::Oai => &oai::AGGREGATION_TRANSFORMER,
            Schema::Arc => &arc::AGGREGATION_TRANSFORMER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Oai => "oai",
            Schema::Arc => "arc",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Schema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oai" => Ok(Schema::Oai),
            "arc" => Ok(Schema::Arc),
            other => Err(format!("Unknown source schema: {}", other)),
        }
    }
}

/// Options for one conversion call.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Passed to the rules; see [`TransformContext::geoprop`].
    pub geoprop: Option<String>,
    /// Base64-encoded JSON describing the contributing institution.
    pub contributor: Option<String>,
}

/// Convert one source record into the canonical envelope.
///
/// Field-level problems never fail the conversion; the affected keys are
/// simply absent from the result.
pub fn convert_record(schema: Schema, record: &Value, options: &ConvertOptions) -> Value {
    let ctx = TransformContext {
        geoprop: options.geoprop.clone(),
    };

    let mut out = Map::new();
    out.insert("@context".to_string(), CONTEXT.clone());
    out.insert("originalRecord".to_string(), record.clone());

    let mut cho = Map::new();
    let cho_rules = schema.cho_registry().apply_to(record, &ctx, &mut cho);
    let aggregation_rules = schema.aggregation_registry().apply_to(record, &ctx, &mut out);

    strip_empty(&mut cho);
    out.insert("aggregatedCHO".to_string(), Value::Object(cho));

    if let Some(provider) = options.contributor.as_deref().and_then(decode_provider) {
        out.insert("provider".to_string(), provider);
    }

    strip_empty(&mut out);

    tracing::debug!(
        schema = %schema,
        cho_rules,
        aggregation_rules,
        "Converted record"
    );

    Value::Object(out)
}

/// Decode a base64-encoded JSON contributor block.
///
/// Undecodable input is logged and ignored.
pub fn decode_provider(encoded: &str) -> Option<Value> {
    let bytes = match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Unable to decode Contributor header value {:?}: {}", encoded, e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Contributor header value {:?} is not JSON: {}", encoded, e);
            None
        }
    }
}

/// Drop every key whose value is null or empty.
pub fn strip_empty(map: &mut Map<String, Value>) {
    map.retain(|_, v| !is_empty_value(v));
}

pub(crate) fn is_absolute_uri(s: &str) -> bool {
    ABSOLUTE_URI_RE.is_match(s.trim())
}

/// `id` rule shared by both schemas: keeps the id and mints the item URI.
pub(crate) fn id_transform(record: &Value, _: &TransformContext) -> Fragment {
    let id = match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Fragment::new(),
    };

    let mut out = fragment("@id", Some(Value::String(format!("{}{}", ITEM_BASE_URL, id))));
    out.insert("id".to_string(), Value::String(id));
    out
}
