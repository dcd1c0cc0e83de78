//! Enrichment filters over already-converted envelopes.
//!
//! Each filter is a small struct holding its options. Options arrive as a
//! flat string map (a query string, CLI `--opt key=value` pairs) and are
//! deserialized with serde, so every filter documents its defaults on its
//! own fields.
//!
//! Filters never fail on document content: a missing field or a value they
//! cannot classify leaves the document as it was.

pub mod copy_rights;
pub mod dctype;
pub mod format;
pub mod move_dates;
pub mod preview;
pub mod shred;
pub mod subject;

use std::collections::HashMap;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub use copy_rights::CopyRights;
pub use dctype::EnrichType;
pub use format::EnrichFormat;
pub use move_dates::{DateAnchor, MoveDatesToTemporal};
pub use preview::IdentifyObject;
pub use shred::{Shred, ShredAction};
pub use subject::EnrichSubject;

/// An in-place document enrichment.
pub trait Enrichment {
    fn enrich(&self, doc: &mut Value);
}

/// Build filter options from a flat string map.
///
/// Keys the filter does not know are ignored; absent keys take the
/// filter's defaults.
pub fn options_from_params<T: DeserializeOwned>(
    params: &HashMap<String, String>,
) -> Result<T, serde_json::Error> {
    let map = params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    serde_json::from_value(Value::Object(map))
}

/// Accepts the flag spellings seen in query strings (`True`, `false`, `1`, `no`).
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(de::Error::custom(format!("invalid flag value: {}", other))),
    }
}

/// Comma-separated list of paths.
pub(crate) fn deserialize_path_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(split_paths(&raw))
}

pub(crate) fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse a one-element list to its element when the input was scalar.
pub(crate) fn reshape(mut values: Vec<Value>, scalar: bool) -> Value {
    if scalar && values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}
