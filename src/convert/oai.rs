//! Rules for flat Dublin Core records harvested over OAI-PMH.
//!
//! Fields are flat but still collapse: `date` may be `"1928"` or
//! `["1928", "1406"]`.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::{id_transform, is_absolute_uri};
use crate::group::{as_items, string_items};
use crate::temporal::TemporalNormalizer;
use crate::transform_registry::{
    copy_field, fragment, Fragment, TransformContext, TransformRegistry,
};

pub static CHO_TRANSFORMER: Lazy<TransformRegistry> = Lazy::new(|| {
    TransformRegistry::new()
        .with("source", copy_field("source", "contributor"))
        .with("date", Box::new(temporal_transform))
        .with("coverage", Box::new(spatial_transform))
        .with("title", copy_field("title", "title"))
        .with("creator", copy_field("creator", "creator"))
        .with("publisher", copy_field("publisher", "publisher"))
        .with("type", copy_field("type", "type"))
        .with("format", copy_field("format", "format"))
        .with("description", copy_field("description", "description"))
        .with("rights", copy_field("rights", "rights"))
        .with("subject", copy_field("subject", "subject"))
    // language needs a vocabulary provider upstream
});

pub static AGGREGATION_TRANSFORMER: Lazy<TransformRegistry> = Lazy::new(|| {
    TransformRegistry::new()
        .with("collection", copy_field("collection", "collection"))
        .with("id", Box::new(id_transform))
        .with("_id", copy_field("_id", "_id"))
        .with("ingestType", copy_field("ingestType", "ingestType"))
        .with("ingestDate", copy_field("ingestDate", "ingestDate"))
        .with("handle", Box::new(is_shown_at_transform))
});

/// Dates from `date`, then any date-shaped `coverage` entries.
fn temporal_transform(record: &Value, _: &TransformContext) -> Fragment {
    let normalizer = TemporalNormalizer::preserving_precision();

    let texts = ["date", "coverage"]
        .into_iter()
        .filter_map(|field| record.get(field))
        .flat_map(string_items);
    let temporal: Vec<Value> = normalizer
        .parse_all(texts)
        .iter()
        .map(|range| range.to_json())
        .collect();

    fragment("temporal", (!temporal.is_empty()).then(|| Value::Array(temporal)))
}

/// Place names from `coverage`, with coordinates from the parallel
/// `geoprop` field when an upstream geocoder supplied them.
fn spatial_transform(record: &Value, ctx: &TransformContext) -> Fragment {
    let Some(coverage) = record.get("coverage") else {
        return Fragment::new();
    };
    let coordinates: Vec<&Value> = ctx
        .geoprop
        .as_deref()
        .and_then(|prop| record.get(prop))
        .map(as_items)
        .unwrap_or_default();

    let spatial: Vec<Value> = string_items(coverage)
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let mut place = json!({ "name": name.trim() });
            let coords = coordinates
                .get(i)
                .filter(|c| !crate::selector::is_empty_value(c));
            if let Some(coords) = coords {
                place["coordinates"] = (*coords).clone();
            }
            place
        })
        .collect();

    fragment("spatial", (!spatial.is_empty()).then(|| Value::Array(spatial)))
}

/// Landing page: the first absolute URI among the record's handles.
fn is_shown_at_transform(record: &Value, _: &TransformContext) -> Fragment {
    let Some(url) = record
        .get("handle")
        .map(string_items)
        .and_then(|handles| handles.into_iter().find(|h| is_absolute_uri(h)))
    else {
        return Fragment::new();
    };

    let mut shown_at = json!({ "@id": url.trim() });
    if let Some(format) = record.get("format").filter(|f| !f.is_null()) {
        shown_at["format"] = format.clone();
    }
    fragment("isShownAt", Some(shown_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{convert_record, ConvertOptions, Schema};

    fn convert(record: Value) -> Value {
        convert_record(Schema::Oai, &record, &ConvertOptions::default())
    }

    #[test]
    fn test_single_date() {
        let out = convert(json!({"date": "1928"}));
        assert_eq!(out["aggregatedCHO"]["temporal"], json!([{"start": "1928", "end": "1928"}]));
    }

    #[test]
    fn test_multiple_dates_and_nothing_else_date_bearing() {
        let out = convert(json!({"date": ["1928", "1406"]}));
        let cho = out["aggregatedCHO"].as_object().unwrap();

        assert_eq!(
            cho["temporal"],
            json!([{"start": "1928", "end": "1928"}, {"start": "1406", "end": "1406"}])
        );
        assert_eq!(cho.len(), 1);
        assert!(out.get("created").is_none());
        assert!(out.get("date").is_none());
    }

    #[test]
    fn test_date_formats() {
        let cases = [
            ("1928-05-20", "1928-05-20", "1928-05-20"),
            ("05/20/1928", "1928-05-20", "1928-05-20"),
            ("May 20, 1928", "1928-05-20", "1928-05-20"),
            ("ca. 1928\n", "1928", "1928"),
            ("1960 - 1970", "1960", "1970"),
            ("1960-05-01 - 1960-05-15", "1960-05-01", "1960-05-15"),
        ];
        for (input, start, end) in cases {
            let out = convert(json!({ "date": input }));
            assert_eq!(
                out["aggregatedCHO"]["temporal"],
                json!([{"start": start, "end": end}]),
                "for input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_bogus_date_omits_temporal() {
        let out = convert(json!({"date": "BOGUS!"}));
        assert!(out.get("aggregatedCHO").is_none());
    }

    #[test]
    fn test_dates_pulled_from_coverage() {
        let out = convert(json!({"date": "1928-05-20", "coverage": "1800-10-20"}));
        assert_eq!(
            out["aggregatedCHO"]["temporal"],
            json!([
                {"start": "1928-05-20", "end": "1928-05-20"},
                {"start": "1800-10-20", "end": "1800-10-20"}
            ])
        );
    }

    #[test]
    fn test_spatial_with_geoprop() {
        let record = json!({
            "coverage": ["Lexington, KY ", "Frankfort, KY"],
            "coords": ["38.04, -84.50", ""]
        });
        let options = ConvertOptions {
            geoprop: Some("coords".to_string()),
            contributor: None,
        };

        let out = convert_record(Schema::Oai, &record, &options);
        assert_eq!(
            out["aggregatedCHO"]["spatial"],
            json!([
                {"name": "Lexington, KY", "coordinates": "38.04, -84.50"},
                {"name": "Frankfort, KY"}
            ])
        );
    }

    #[test]
    fn test_spatial_without_geoprop_ignores_coordinates() {
        let out = convert(json!({"coverage": "Lexington", "coords": ["1, 2"]}));
        assert_eq!(out["aggregatedCHO"]["spatial"], json!([{"name": "Lexington"}]));
    }

    #[test]
    fn test_handle_becomes_is_shown_at() {
        let out = convert(json!({
            "handle": ["10605/1234", "http://hdl.handle.net/10605/1234"],
            "format": "image/jpeg"
        }));
        assert_eq!(
            out["isShownAt"],
            json!({"@id": "http://hdl.handle.net/10605/1234", "format": "image/jpeg"})
        );
        assert_eq!(out["aggregatedCHO"]["format"], json!("image/jpeg"));
    }

    #[test]
    fn test_relative_handle_is_dropped() {
        let out = convert(json!({"handle": "10605/1234"}));
        assert!(out.get("isShownAt").is_none());
    }

    #[test]
    fn test_aggregation_fields() {
        let out = convert(json!({
            "id": "kdl--123",
            "_id": "kdl--123",
            "collection": {"@id": "http://dp.la/api/collections/kdl", "title": "KDL"},
            "ingestType": "item",
            "ingestDate": "2013-01-01T00:00:00"
        }));

        assert_eq!(out["@id"], json!("http://dp.la/api/items/kdl--123"));
        assert_eq!(out["id"], json!("kdl--123"));
        assert_eq!(out["ingestType"], json!("item"));
        assert_eq!(out["collection"]["title"], json!("KDL"));
    }

    #[test]
    fn test_empty_copied_fields_are_stripped() {
        let out = convert(json!({"title": "", "creator": [], "subject": ["Cats"]}));
        let cho = out["aggregatedCHO"].as_object().unwrap();
        assert!(!cho.contains_key("title"));
        assert!(!cho.contains_key("creator"));
        assert_eq!(cho["subject"], json!(["Cats"]));
    }
}
