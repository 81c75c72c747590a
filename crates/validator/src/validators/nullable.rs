//! Presence validators
//!
//! - [`NotNull`] - the value is not `null`
//! - [`NotEmpty`] - the value is not `null`, a blank string, an empty array
//!   or an empty object

use serde_json::Value;

crate::property_validator! {
    /// Fails on `null`, including missing members.
    pub NotNull;
    code = "not_null";
    message = "'{PropertyName}' must not be null.";
    rule(value) { !value.is_null() }
    fn not_null();
}

crate::property_validator! {
    /// Fails on `null`, whitespace-only strings and empty containers.
    pub NotEmpty;
    code = "not_empty";
    message = "'{PropertyName}' must not be empty.";
    rule(value) { !is_empty(value) }
    fn not_empty();
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
