//! Value-type predicates used by attribute validators.

use super::PropValue;

/// Character data: any string.
pub fn is_cdata(value: &PropValue) -> bool {
    value.is_string()
}

/// A name token: one or more name characters, no whitespace.
pub fn is_nmtoken(value: &PropValue) -> bool {
    value
        .as_str()
        .is_some_and(|s| !s.is_empty() && s.chars().all(is_name_char))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':') || c == '\u{B7}'
}

/// Booleans arrive from XML as `"true"`/`"false"` and from JSON as bools.
pub fn is_boolean(value: &PropValue) -> bool {
    match value {
        PropValue::Bool(_) => true,
        PropValue::String(s) => s == "true" || s == "false",
        _ => false,
    }
}

/// A string drawn from a fixed enumeration.
pub fn is_one_of(value: &PropValue, allowed: &[&str]) -> bool {
    value.as_str().is_some_and(|s| allowed.contains(&s))
}

/// Absent values pass; present values must satisfy `check`.
pub fn or_absent(value: Option<&PropValue>, check: impl FnOnce(&PropValue) -> bool) -> bool {
    value.is_none_or(check)
}

/// Whether a value would be written out by the serializer.
///
/// `null`, `false`, `0` and the empty string are falsy. Arrays and objects
/// are always truthy.
pub fn is_truthy(value: &PropValue) -> bool {
    match value {
        PropValue::Null => false,
        PropValue::Bool(b) => *b,
        PropValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        PropValue::String(s) => !s.is_empty(),
        PropValue::Array(_) | PropValue::Object(_) => true,
    }
}

/// Render a property value as attribute text.
pub fn to_attribute_text(value: &PropValue) -> String {
    match value {
        PropValue::String(s) => s.clone(),
        PropValue::Array(items) => items
            .iter()
            .map(to_attribute_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
