//! Repeated-group extraction for XML-derived records.
//!
//! Records that were converted from XML collapse a repeated element with a
//! single member into that member, so the same field may hold a string, a
//! mapping or a sequence depending on how many children the source had:
//!
//! ```text
//! <creators>
//!   <creator><creator-display>Smith, J.</creator-display></creator>
//! </creators>
//! ```
//!
//! becomes `{"creators": {"creator": {"creator-display": "Smith, J."}}}`,
//! while two creators become a sequence under `creator`. [`extract_group`]
//! undoes that collapse so transforms always see a list.

use serde_json::Value;

use crate::selector::is_empty_value;

/// Extract the items of a repeated group.
///
/// * `group_key` - the containing field, e.g. `"creators"`
/// * `item_key` - the repeated field inside it, e.g. `"creator"`
/// * `name_key` - optional field to project out of each item, e.g. `"creator-display"`
///
/// Returns `None` when the group is absent or empty, and `Some(vec![])` when
/// the group is present but its item is missing or empty. When the group itself repeats,
/// only the first occurrence is read; later groups are ignored.
///
/// A missing projection yields `Value::Null` in its slot so that parallel
/// projections over the same group stay index-aligned.
pub fn extract_group(
    record: &Value,
    group_key: &str,
    item_key: &str,
    name_key: Option<&str>,
) -> Option<Vec<Value>> {
    let group = record.get(group_key).filter(|g| !is_empty_value(g))?;

    // Only the first of several repeated groups is considered.
    let selected = match group {
        Value::Array(groups) => groups.first()?,
        other => other,
    };

    let items: Vec<&Value> = match selected.get(item_key) {
        None => Vec::new(),
        Some(item) if is_empty_value(item) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    };

    let data = items
        .into_iter()
        .map(|item| match (item, name_key) {
            (Value::String(_), _) | (_, None) => item.clone(),
            (_, Some(key)) => item.get(key).cloned().unwrap_or(Value::Null),
        })
        .collect();

    Some(data)
}

/// View a flat field as a list, wrapping a lone value.
///
/// Flat records (OAI Dublin Core) collapse single-valued repeatable fields
/// the same way grouped ones do, without the container level. Null is
/// treated as no items.
pub fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// String entries of a flat field; other shapes are skipped.
pub fn string_items(value: &Value) -> Vec<&str> {
    as_items(value).into_iter().filter_map(Value::as_str).collect()
}

/// Extract a group and keep only the string entries.
///
/// Convenience for transforms whose output is a list of display names.
pub fn extract_group_strings(
    record: &Value,
    group_key: &str,
    item_key: &str,
    name_key: Option<&str>,
) -> Option<Vec<String>> {
    extract_group(record, group_key, item_key, name_key).map(|values| {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()
    })
}
