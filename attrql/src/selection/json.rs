//! JSONB comparison, containment and key existence, as PostgreSQL defines them.

use std::cmp::Ordering;

/// Object > Array > Boolean > Number > String > Null
fn rank(value: &serde_json::Value) -> u8 {
    match value {
        serde_json::Value::Null => 0,
        serde_json::Value::String(_) => 1,
        serde_json::Value::Number(_) => 2,
        serde_json::Value::Bool(_) => 3,
        serde_json::Value::Array(_) => 4,
        serde_json::Value::Object(_) => 5,
    }
}

/// Keys are stored shortest first, then bytewise.
fn key_cmp(a: &str, b: &str) -> Ordering { a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes())) }

/// Total order used by jsonb btree comparison. Numbers compare numerically, so `1` equals `1.0`.
pub fn json_cmp(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value::*;
    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (String(a), String(b)) => a.as_bytes().cmp(b.as_bytes()),
        (Number(a), Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.as_f64().unwrap_or(f64::NAN).partial_cmp(&b.as_f64().unwrap_or(f64::NAN)).unwrap_or(Ordering::Equal),
        },
        (Bool(a), Bool(b)) => a.cmp(b),
        (Array(a), Array(b)) => a.len().cmp(&b.len()).then_with(|| {
            a.iter().zip(b).map(|(x, y)| json_cmp(x, y)).find(|o| *o != Ordering::Equal).unwrap_or(Ordering::Equal)
        }),
        (Object(a), Object(b)) => a.len().cmp(&b.len()).then_with(|| {
            let mut left: Vec<_> = a.iter().collect();
            let mut right: Vec<_> = b.iter().collect();
            left.sort_by(|x, y| key_cmp(x.0, y.0));
            right.sort_by(|x, y| key_cmp(x.0, y.0));
            left.into_iter()
                .zip(right)
                .map(|((ka, va), (kb, vb))| key_cmp(ka, kb).then_with(|| json_cmp(va, vb)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

pub fn json_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool { json_cmp(a, b) == Ordering::Equal }

/// `stored @> wanted`
pub fn json_contains(stored: &serde_json::Value, wanted: &serde_json::Value) -> bool { contains(stored, wanted, true) }

fn contains(stored: &serde_json::Value, wanted: &serde_json::Value, top_level: bool) -> bool {
    use serde_json::Value::*;
    match (stored, wanted) {
        (Object(stored), Object(wanted)) => {
            wanted.iter().all(|(key, value)| stored.get(key).is_some_and(|candidate| contains(candidate, value, false)))
        }
        (Array(stored), Array(wanted)) => wanted.iter().all(|value| stored.iter().any(|candidate| contains(candidate, value, false))),
        // only a top-level array may contain a bare scalar
        (Array(stored), wanted) if top_level && !matches!(wanted, Object(_)) => stored.iter().any(|candidate| !candidate.is_array() && !candidate.is_object() && json_eq(candidate, wanted)),
        (Object(_), _) | (Array(_), _) | (_, Object(_)) | (_, Array(_)) => false,
        (stored, wanted) => json_eq(stored, wanted),
    }
}

/// `stored ? key`: a top-level object key, a string element of a top-level array, or the string itself.
pub fn json_has_key(stored: &serde_json::Value, key: &str) -> bool {
    match stored {
        serde_json::Value::Object(map) => map.contains_key(key),
        serde_json::Value::Array(items) => items.iter().any(|item| item.as_str() == Some(key)),
        serde_json::Value::String(s) => s == key,
        _ => false,
    }
}
