//! Field-level validation of untrusted JSON.
//!
//! Each entity kind describes its fields once as a static [`Field`] table and
//! [`validate`] checks a raw value against it, reporting every field that is
//! missing or has the wrong shape.

use chrono::DateTime;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    NonEmptyString,
    Number,
    NonNegativeInteger,
    Bool,
    /// RFC 3339 timestamp string.
    DateTime,
    StringArray,
}

impl FieldKind {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::NonEmptyString => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            FieldKind::Number => value.is_number(),
            FieldKind::NonNegativeInteger => value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::DateTime => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            FieldKind::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Returns the names of every invalid field, in schema order. Empty means valid.
pub fn validate(schema: &[Field], raw: &Value) -> Vec<String> {
    let Some(object) = raw.as_object() else {
        return schema
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.to_string())
            .collect();
    };

    schema
        .iter()
        .filter(|field| match object.get(field.name) {
            None | Some(Value::Null) => field.required,
            Some(value) => !field.kind.accepts(value),
        })
        .map(|field| field.name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &[Field] = &[
        Field::required("title", FieldKind::NonEmptyString),
        Field::required("count", FieldKind::NonNegativeInteger),
        Field::required("when", FieldKind::DateTime),
        Field::optional("tags", FieldKind::StringArray),
        Field::optional("flag", FieldKind::Bool),
    ];

    #[test]
    fn test_valid_object_has_no_errors() {
        let raw = json!({"title": "t", "count": 3, "when": "2024-01-02T03:04:05Z"});
        assert!(validate(SCHEMA, &raw).is_empty());
    }

    #[test]
    fn test_reports_every_invalid_field_in_schema_order() {
        let raw = json!({"title": "", "count": -1, "when": "yesterday", "tags": [1]});
        assert_eq!(validate(SCHEMA, &raw), vec!["title", "count", "when", "tags"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let raw = json!({"title": null, "count": 1, "when": "2024-01-02T03:04:05Z", "flag": null});
        assert_eq!(validate(SCHEMA, &raw), vec!["title"]);
    }

    #[test]
    fn test_non_object_reports_required_fields_only() {
        assert_eq!(validate(SCHEMA, &json!("nope")), vec!["title", "count", "when"]);
        assert_eq!(validate(SCHEMA, &json!([1, 2])), vec!["title", "count", "when"]);
    }

    #[test]
    fn test_optional_present_with_wrong_type_is_invalid() {
        let raw = json!({"title": "t", "count": 0, "when": "2024-01-02T03:04:05+02:00", "flag": "yes"});
        assert_eq!(validate(SCHEMA, &raw), vec!["flag"]);
    }

    #[test]
    fn test_impossible_dates_are_rejected() {
        assert!(!FieldKind::DateTime.accepts(&json!("2024-02-30T00:00:00Z")));
        assert!(!FieldKind::DateTime.accepts(&json!(1700000000)));
        assert!(FieldKind::DateTime.accepts(&json!("2024-02-29T00:00:00.123Z")));
    }
}
