//! Path-addressed access into JSON trees.
//!
//! Every component that reads or writes a record goes through these helpers
//! instead of walking `serde_json::Value` by hand. Paths are slash-delimited
//! keys (`aggregatedCHO/rights`). A numeric segment, bare (`2`) or bracketed
//! (`[2]`), indexes into a sequence.

use std::fmt;

use serde_json::{Map, Value};

/// A parsed path into a JSON tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// The raw path string
    pub raw: String,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
}

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A mapping key (e.g., "aggregatedCHO", "rights")
    Field(String),
    /// A sequence index (e.g., [0], [5])
    Index(usize),
}

impl PathSegment {
    /// Sequence position addressed by this segment.
    ///
    /// All-digit keys count, so `hasView/1` and `hasView/[1]` address the same
    /// item. Mappings still look such keys up by name.
    pub fn index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Field(key) if key.bytes().all(|b| b.is_ascii_digit()) => {
                key.parse().ok()
            }
            PathSegment::Field(_) => None,
        }
    }
}

impl FieldPath {
    /// Parse a field path with a given delimiter.
    ///
    /// Empty segments are dropped, so `"/a//b/"` addresses the same node as
    /// `"a/b"`.
    pub fn parse(path: &str, delimiter: &str) -> Self {
        let segments = path
            .split(delimiter)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('[') && s.ends_with(']') {
                    if let Ok(index) = s[1..s.len() - 1].parse::<usize>() {
                        return PathSegment::Index(index);
                    }
                }
                PathSegment::Field(s.to_string())
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// Parse the slash-delimited form used by every service option.
    pub fn from_slashed(path: &str) -> Self {
        Self::parse(path, "/")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Error raised when a write cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    EmptyPath,
    /// An intermediate node exists but cannot hold children.
    NotAContainer { path: String, segment: String },
    IndexOutOfBounds { path: String, index: usize },
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::EmptyPath => write!(f, "Empty property path"),
            SelectorError::NotAContainer { path, segment } => {
                write!(f, "Cannot descend into '{}' while resolving '{}'", segment, path)
            }
            SelectorError::IndexOutOfBounds { path, index } => {
                write!(f, "Index {} out of bounds while resolving '{}'", index, path)
            }
        }
    }
}

impl std::error::Error for SelectorError {}

fn step<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), PathSegment::Field(key)) => map.get(key),
        (Value::Array(items), segment) => segment.index().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'a>(node: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(map), PathSegment::Field(key)) => map.get_mut(key),
        (Value::Array(items), segment) => segment.index().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

/// Read the value at `path`.
///
/// Returns `None` when the path does not resolve, and `Some(&Value::Null)`
/// when it resolves to an explicit null.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let path = FieldPath::from_slashed(path);
    if path.segments.is_empty() {
        return None;
    }
    path.segments.iter().try_fold(tree, step)
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(tree: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let path = FieldPath::from_slashed(path);
    if path.segments.is_empty() {
        return None;
    }
    path.segments.iter().try_fold(tree, step_mut)
}

/// Read a string value at `path`, treating any other shape as absent.
pub fn get_str<'a>(tree: &'a Value, path: &str) -> Option<&'a str> {
    get(tree, path).and_then(Value::as_str)
}

/// Whether `path` resolves, even to a null.
pub fn exists(tree: &Value, path: &str) -> bool {
    get(tree, path).is_some()
}

/// Write `value` at `path`, creating intermediate mappings where absent.
///
/// Sequences are never grown: an index segment must already be in bounds.
pub fn set(tree: &mut Value, path: &str, value: Value) -> Result<(), SelectorError> {
    let parsed = FieldPath::from_slashed(path);
    let (last, parents) = parsed
        .segments
        .split_last()
        .ok_or(SelectorError::EmptyPath)?;

    let mut node = tree;
    for segment in parents {
        node = descend_or_create(node, segment, path)?;
    }

    match (node, last) {
        (Value::Object(map), PathSegment::Field(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(items), segment) => {
            let i = sequence_index(segment, path)?;
            match items.get_mut(i) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(SelectorError::IndexOutOfBounds {
                    path: path.to_string(),
                    index: i,
                }),
            }
        }
        (_, segment) => Err(SelectorError::NotAContainer {
            path: path.to_string(),
            segment: segment_label(segment),
        }),
    }
}

fn descend_or_create<'a>(
    node: &'a mut Value,
    segment: &PathSegment,
    path: &str,
) -> Result<&'a mut Value, SelectorError> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match (node, segment) {
        (Value::Object(map), PathSegment::Field(key)) => {
            let child = map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if child.is_null() {
                *child = Value::Object(Map::new());
            }
            Ok(child)
        }
        (Value::Array(items), segment) => {
            let i = sequence_index(segment, path)?;
            items
                .get_mut(i)
                .ok_or_else(|| SelectorError::IndexOutOfBounds {
                    path: path.to_string(),
                    index: i,
                })
        }
        (_, segment) => Err(SelectorError::NotAContainer {
            path: path.to_string(),
            segment: segment_label(segment),
        }),
    }
}

fn sequence_index(segment: &PathSegment, path: &str) -> Result<usize, SelectorError> {
    segment.index().ok_or_else(|| SelectorError::NotAContainer {
        path: path.to_string(),
        segment: segment_label(segment),
    })
}

fn segment_label(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Field(key) => key.clone(),
        PathSegment::Index(i) => format!("[{}]", i),
    }
}

/// Remove the leaf at `path`, returning the removed value.
pub fn delete(tree: &mut Value, path: &str) -> Option<Value> {
    let parsed = FieldPath::from_slashed(path);
    let (last, parents) = parsed.segments.split_last()?;

    let parent = parents.iter().try_fold(tree, step_mut)?;
    match (parent, last) {
        (Value::Object(map), PathSegment::Field(key)) => map.remove(key),
        (Value::Array(items), segment) => match segment.index() {
            Some(i) if i < items.len() => Some(items.remove(i)),
            _ => None,
        },
        _ => None,
    }
}

/// Whether a value counts as empty for the envelope's strip pass.
///
/// Null, the empty string, and empty sequences and mappings are empty.
/// `false` and `0` are real values and are kept.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
