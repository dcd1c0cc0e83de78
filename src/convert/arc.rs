//! Rules for JSON-ified NARA ARC descriptions.
//!
//! ARC records come from XML, so most descriptive fields sit inside
//! container/item pairs (`creators/creator`, `objects/object`) that
//! [`extract_group`] normalizes.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use super::id_transform;
use crate::group::extract_group;
use crate::selector;
use crate::temporal::TemporalNormalizer;
use crate::selector::is_empty_value;
use crate::transform_registry::{
    copy_field, fragment, Fragment, TransformContext, TransformFn, TransformRegistry,
};

/// Landing pages for ARC descriptions.
pub const DESCRIPTION_BASE_URL: &str = "http://research.archives.gov/description/";

pub static CHO_TRANSFORMER: Lazy<TransformRegistry> = Lazy::new(|| {
    TransformRegistry::new()
        .with(
            "contributors",
            group_rule("contributor", "contributors", "contributor", "contributor-display"),
        )
        .with("coverage-dates", Box::new(created_transform))
        .with("title", Box::new(title_transform))
        .with("title-only", Box::new(title_transform))
        .with(
            "creators",
            group_rule("creator", "creators", "creator", "creator-display"),
        )
        .with(
            "reference-units",
            group_rule("publisher", "reference-units", "reference-unit", "name"),
        )
        .with(
            "general-records-types",
            group_rule(
                "type",
                "general-records-types",
                "general-records-type",
                "general-records-type-desc",
            ),
        )
        .with(
            "media-occurences",
            group_rule("format", "media-occurences", "media-occurence", "media-type"),
        )
        .with("scope-content-note", copy_field("scope-content-note", "description"))
        .with("use-restriction", Box::new(rights_transform))
        .with(
            "subject-references",
            group_rule("subject", "subject-references", "subject-reference", "display-name"),
        )
        .with("objects", Box::new(has_view_transform))
        .with("online-resources", Box::new(has_view_transform))
});

pub static AGGREGATION_TRANSFORMER: Lazy<TransformRegistry> = Lazy::new(|| {
    TransformRegistry::new()
        .with("collection", copy_field("collection", "collection"))
        .with("id", Box::new(id_transform))
        .with("_id", copy_field("_id", "_id"))
        .with("ingestType", copy_field("ingestType", "ingestType"))
        .with("ingestDate", copy_field("ingestDate", "ingestDate"))
        .with("arc-id-desc", Box::new(is_shown_at_transform))
        .with("parent", Box::new(data_provider_transform))
});

/// `title-only` → `title`, falling back to the full `title`.
fn title_transform(record: &Value, _: &TransformContext) -> Fragment {
    let title = ["title-only", "title"]
        .into_iter()
        .filter_map(|key| record.get(key))
        .find(|value| !is_empty_value(value))
        .cloned();
    fragment("title", title)
}

/// Rule emitting the projected names of a repeated group under `target`.
///
/// Items lacking the projected field, or projecting an empty value, are
/// skipped. A present group with no items still emits an empty list.
fn group_rule(
    target: &'static str,
    group_key: &'static str,
    item_key: &'static str,
    name_key: &'static str,
) -> Box<dyn TransformFn> {
    Box::new(move |record: &Value, _: &TransformContext| {
        let names = extract_group(record, group_key, item_key, Some(name_key)).map(|values| {
            Value::Array(values.into_iter().filter(|v| !is_empty_value(v)).collect())
        });
        fragment(target, names)
    })
}

/// `coverage-dates` → `created`, normalizing whichever ends are present.
fn created_transform(record: &Value, _: &TransformContext) -> Fragment {
    let normalizer = TemporalNormalizer::preserving_precision();

    let mut created = Map::new();
    for (source, target) in [("cov-start-date", "start"), ("cov-end-date", "end")] {
        let path = format!("coverage-dates/{}", source);
        let Some(text) = selector::get_str(record, &path) else {
            continue;
        };
        match normalizer.parse_date(text) {
            Some(date) => {
                created.insert(target.to_string(), Value::String(date.to_iso8601()));
            }
            None => tracing::debug!("Could not parse date: {:?}", text),
        }
    }

    fragment("created", (!created.is_empty()).then(|| Value::Object(created)))
}

/// `use-restriction` → `rights`, as `"<use-status>; <use-note>"`.
fn rights_transform(record: &Value, _: &TransformContext) -> Fragment {
    let sections: Vec<&str> = ["use-restriction/use-status", "use-restriction/use-note"]
        .into_iter()
        .filter_map(|path| selector::get_str(record, path))
        .filter(|s| !s.is_empty())
        .collect();

    fragment("rights", Some(Value::String(sections.join("; "))))
}

/// Digital objects and online resources → `hasView`.
///
/// Both source fields trigger this rule and each run sees both groups, so
/// the result does not depend on which ran last.
fn has_view_transform(record: &Value, _: &TransformContext) -> Fragment {
    let mut views = Vec::new();

    if let Some(urls) = extract_group(record, "objects", "object", Some("file-url")) {
        let formats =
            extract_group(record, "objects", "object", Some("mime-type")).unwrap_or_default();
        add_views(&mut views, &urls, &formats);
    }

    let resources = extract_group(
        record,
        "online-resources",
        "online-resource",
        Some("online-resource-url"),
    );
    if let Some(urls) = resources {
        add_views(&mut views, &urls, &[]);
    }

    fragment("hasView", (!views.is_empty()).then(|| Value::Array(views)))
}

fn add_views(views: &mut Vec<Value>, urls: &[Value], formats: &[Value]) {
    for (i, url) in urls.iter().enumerate() {
        if url.is_null() {
            continue;
        }
        let mut view = json!({ "url": url });
        if let Some(format) = formats.get(i).filter(|f| !f.is_null()) {
            view["format"] = format.clone();
        }
        views.push(view);
    }
}

/// `arc-id-desc` → `isShownAt` pointing at the ARC description page.
fn is_shown_at_transform(record: &Value, _: &TransformContext) -> Fragment {
    let id = match record.get("arc-id-desc") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Fragment::new(),
    };

    let mut shown_at = json!({ "@id": format!("{}{}", DESCRIPTION_BASE_URL, id) });
    if let Some(format) = record.get("format").filter(|f| !f.is_null()) {
        shown_at["format"] = format.clone();
    }
    fragment("isShownAt", Some(shown_at))
}

fn data_provider_transform(record: &Value, _: &TransformContext) -> Fragment {
    fragment("dataProvider", selector::get(record, "parent/parent-title").cloned())
}
