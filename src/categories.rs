//! Data-kind detection from included place types.
//!
//! The category reference data maps a kind name to either a flat list of
//! types or a nested map of sub-category lists; the first kind whose types
//! intersect the request wins.

use serde_json::Value;

/// Determine which data kind a set of included types belongs to.
///
/// Returns `None` when `included` is empty, the category data is not an
/// object, or nothing intersects.
pub fn determine_data_kind(included: &[String], categories: &Value) -> Option<String> {
    if included.is_empty() {
        return None;
    }

    for (kind, types) in categories.as_object()? {
        let matched = match types {
            Value::Array(list) => intersects(included, list),
            Value::Object(nested) => nested
                .values()
                .filter_map(Value::as_array)
                .any(|list| intersects(included, list)),
            _ => false,
        };
        if matched {
            return Some(kind.clone());
        }
    }

    None
}

fn intersects(included: &[String], types: &[Value]) -> bool {
    types
        .iter()
        .filter_map(Value::as_str)
        .any(|t| included.iter().any(|inc| inc == t))
}
