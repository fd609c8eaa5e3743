//! Field-equality filter applied to each event before re-emission.

use serde_json::Value;
use shared_bus::Payload;
use tracing::debug;

/// True iff `field_name` is present in `payload` and its text form equals
/// `expected_value`.
///
/// Absent fields (including `null`) never match. Strings compare by their raw
/// text and booleans as `true`/`false`. Integers compare in decimal; other
/// numbers in plain shortest form with no exponent and no trailing `.0`, so
/// `1e3` matches `"1000"`. Containers compare by compact JSON.
pub fn matches(payload: &Payload, field_name: &str, expected_value: &str) -> bool {
    let matched = payload
        .get(field_name)
        .is_some_and(|v| field_text(v) == expected_value);

    if matched {
        debug!(field = %field_name, "Record is valid");
    } else {
        debug!(field = %field_name, "Record is invalid");
    }
    matched
}

/// Text form of a field value as used for comparison.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            // f64 Display is shortest round-trip and never uses an exponent
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
