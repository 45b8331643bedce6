//! Safe navigation over partially populated JSON trees.

use serde_json::Value;

/// Follows `path` from `root`, returning `None` at the first step that is
/// missing or `null`.
pub fn walk<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| match node.get(key) {
        Some(Value::Null) | None => None,
        Some(next) => Some(next),
    })
}

/// Reads a numeric leaf. Hasura serializes `numeric` columns as strings, so
/// a string that parses as a number is accepted too.
pub fn number_at(root: &Value, path: &[&str]) -> Option<f64> {
    walk(root, path).and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()))
}

pub fn string_at(root: &Value, path: &[&str]) -> Option<String> {
    walk(root, path).and_then(Value::as_str).map(str::to_string)
}

pub fn id_at(root: &Value, path: &[&str]) -> Option<i64> {
    walk(root, path).and_then(Value::as_i64)
}
