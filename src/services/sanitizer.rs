use serde_json::{Map, Number, Value};

use crate::models::activity::is_truthy;

/// Normalizes one loosely-typed record.
///
/// Nulls are dropped, strings are trimmed, integer- and decimal-looking
/// strings become numbers and empty strings are removed. Everything else
/// passes through untouched. Never fails.
pub fn clean(record: &Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for (key, value) in record {
        match value {
            Value::Null => continue,
            Value::String(s) => {
                if let Some(v) = clean_string(s) {
                    cleaned.insert(key.clone(), v);
                }
            }
            other => {
                cleaned.insert(key.clone(), other.clone());
            }
        }
    }
    cleaned
}

/// Cleans every object in `records`. Anything that is not an array yields
/// an empty list; falsy elements (null, false, 0, "") are filtered out and
/// other scalars are kept as they are.
pub fn clean_many(records: &Value) -> Vec<Value> {
    let Value::Array(items) = records else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => Value::Object(clean(map)),
            other => other.clone(),
        })
        .filter(is_truthy)
        .collect()
}

fn clean_string(raw: &str) -> Option<Value> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    if is_integer_literal(t) {
        let number = t
            .parse::<i64>()
            .map(Number::from)
            .ok()
            .or_else(|| t.parse::<f64>().ok().and_then(Number::from_f64));
        return Some(number.map_or_else(|| Value::String(t.to_string()), Value::Number));
    }
    if is_decimal_literal(t) {
        if let Some(n) = t.parse::<f64>().ok().and_then(Number::from_f64) {
            return Some(Value::Number(n));
        }
    }
    Some(Value::String(t.to_string()))
}

// ^-?\d+$
fn is_integer_literal(s: &str) -> bool {
    is_digits(s.strip_prefix('-').unwrap_or(s))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// ^-?\d+\.\d+$
fn is_decimal_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    match unsigned.split_once('.') {
        Some((whole, frac)) => is_digits(whole) && is_digits(frac),
        None => false,
    }
}
