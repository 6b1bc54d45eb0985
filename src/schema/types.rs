//! Field type definitions
//!
//! Supported field shapes:
//! - scalar: text, boolean, date, number
//! - array: homogeneous array of one scalar kind
//! - reference: identity of a document in another collection
//! - reference_array: ordered identities into another collection
//! - opaque: free-form nested value, stored as given
//!
//! Every shape owns its validate/coerce pair. Validation never mutates;
//! coercion is only defined on values that validated.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar kinds usable standalone or as array elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// UTF-8 string
    Text,
    /// Boolean
    Boolean,
    /// RFC 3339 timestamp or integer epoch milliseconds
    Date,
    /// Integer or float, stored as given
    Number,
}

impl ScalarKind {
    /// Returns the kind name for labels and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
            ScalarKind::Number => "number",
        }
    }

    /// Checks a single value against this kind
    pub fn validates(&self, value: &Value) -> bool {
        match self {
            ScalarKind::Text => value.is_string(),
            ScalarKind::Boolean => value.is_boolean(),
            ScalarKind::Number => value.is_number(),
            ScalarKind::Date => match value {
                Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
                Value::Number(n) => n.is_i64(),
                _ => false,
            },
        }
    }

    /// Coerces a validated value into its stored form
    ///
    /// Text, boolean and number are stored as given. Dates normalize to
    /// UTC RFC 3339 with millisecond precision, so coercion is idempotent.
    pub fn coerce(&self, value: &Value) -> Value {
        match self {
            ScalarKind::Text | ScalarKind::Boolean | ScalarKind::Number => value.clone(),
            ScalarKind::Date => coerce_date(value),
        }
    }
}

/// Normalizes a date value to a UTC RFC 3339 string
fn coerce_date(value: &Value) -> Value {
    let normalized = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    match normalized {
        Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => value.clone(),
    }
}

/// Declared shape of one document field
///
/// The set of shapes is closed; dispatch is an exhaustive match, so an
/// unrecognized shape cannot occur at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Single scalar value
    Scalar {
        /// Scalar kind
        kind: ScalarKind,
    },
    /// Homogeneous array of one scalar kind
    Array {
        /// Element kind
        kind: ScalarKind,
    },
    /// Identity of a document in the named model's collection
    Reference {
        /// Target model name, resolved through the model registry
        model: String,
    },
    /// Ordered identities into the named model's collection
    ReferenceArray {
        /// Target model name
        model: String,
    },
    /// Free-form nested value, always valid, never coerced
    Opaque,
}

impl FieldType {
    /// Create a text field
    pub fn text() -> Self {
        Self::Scalar {
            kind: ScalarKind::Text,
        }
    }

    /// Create a boolean field
    pub fn boolean() -> Self {
        Self::Scalar {
            kind: ScalarKind::Boolean,
        }
    }

    /// Create a date field
    pub fn date() -> Self {
        Self::Scalar {
            kind: ScalarKind::Date,
        }
    }

    /// Create a number field
    pub fn number() -> Self {
        Self::Scalar {
            kind: ScalarKind::Number,
        }
    }

    /// Create an array field of the given scalar kind
    pub fn array(kind: ScalarKind) -> Self {
        Self::Array { kind }
    }

    /// Create a reference field targeting the named model
    pub fn reference(model: impl Into<String>) -> Self {
        Self::Reference {
            model: model.into(),
        }
    }

    /// Create a reference-array field targeting the named model
    pub fn reference_array(model: impl Into<String>) -> Self {
        Self::ReferenceArray {
            model: model.into(),
        }
    }

    /// Create an opaque field
    pub fn opaque() -> Self {
        Self::Opaque
    }

    /// Returns the type label used in error messages
    pub fn label(&self) -> String {
        match self {
            FieldType::Scalar { kind } => kind.as_str().to_string(),
            FieldType::Array { kind } => format!("{}[]", kind.as_str()),
            FieldType::Reference { model } => format!("reference<{}>", model),
            FieldType::ReferenceArray { model } => format!("reference<{}>[]", model),
            FieldType::Opaque => "opaque".to_string(),
        }
    }

    /// Returns true if this shape is a reference or reference array
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            FieldType::Reference { .. } | FieldType::ReferenceArray { .. }
        )
    }

    /// Validates a value against this shape
    pub fn validates(&self, value: &Value) -> bool {
        match self {
            FieldType::Scalar { kind } => kind.validates(value),
            FieldType::Array { kind } => match value.as_array() {
                Some(items) => items.iter().all(|item| kind.validates(item)),
                None => false,
            },
            FieldType::Reference { .. } => is_identity(value),
            FieldType::ReferenceArray { .. } => match value.as_array() {
                Some(items) => items.iter().all(is_identity),
                None => false,
            },
            FieldType::Opaque => true,
        }
    }

    /// Coerces a validated value into its stored form
    ///
    /// References and opaque values pass through unchanged; arrays coerce
    /// element-wise. Coercing an already-coerced value is a no-op.
    pub fn coerce(&self, value: &Value) -> Value {
        match self {
            FieldType::Scalar { kind } => kind.coerce(value),
            FieldType::Array { kind } => match value.as_array() {
                Some(items) => Value::Array(items.iter().map(|item| kind.coerce(item)).collect()),
                None => value.clone(),
            },
            FieldType::Reference { .. } | FieldType::ReferenceArray { .. } | FieldType::Opaque => {
                value.clone()
            }
        }
    }
}

/// Identity shape check: a non-empty string
fn is_identity(value: &Value) -> bool {
    value.as_str().map(|s| !s.is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_validation() {
        let field = FieldType::text();
        assert!(field.validates(&json!("hello")));
        assert!(!field.validates(&json!(42)));
        assert!(!field.validates(&json!(true)));
        assert!(!field.validates(&json!(null)));
    }

    #[test]
    fn test_boolean_validation() {
        let field = FieldType::boolean();
        assert!(field.validates(&json!(true)));
        assert!(field.validates(&json!(false)));
        assert!(!field.validates(&json!("true")));
        assert!(!field.validates(&json!(1)));
    }

    #[test]
    fn test_number_validation() {
        let field = FieldType::number();
        assert!(field.validates(&json!(42)));
        assert!(field.validates(&json!(3.25)));
        assert!(field.validates(&json!(-7)));
        assert!(!field.validates(&json!("42")));
    }

    #[test]
    fn test_date_validation() {
        let field = FieldType::date();
        assert!(field.validates(&json!("2024-03-01T12:00:00Z")));
        assert!(field.validates(&json!("2024-03-01T12:00:00+02:00")));
        assert!(field.validates(&json!(1709294400000i64)));
        assert!(!field.validates(&json!("yesterday")));
        assert!(!field.validates(&json!(3.5)));
    }

    #[test]
    fn test_date_coercion_normalizes_to_utc() {
        let field = FieldType::date();
        let coerced = field.coerce(&json!("2024-03-01T12:00:00+02:00"));
        assert_eq!(coerced, json!("2024-03-01T10:00:00.000Z"));
    }

    #[test]
    fn test_date_coercion_from_epoch_millis() {
        let field = FieldType::date();
        let coerced = field.coerce(&json!(0));
        assert_eq!(coerced, json!("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_scalar_coercion_is_idempotent() {
        let cases = vec![
            (FieldType::text(), json!("hello")),
            (FieldType::boolean(), json!(true)),
            (FieldType::number(), json!(42)),
            (FieldType::number(), json!(2.5)),
            (FieldType::date(), json!("2024-03-01T12:00:00+02:00")),
            (FieldType::date(), json!(1709294400000i64)),
        ];

        for (field, value) in cases {
            let once = field.coerce(&value);
            let twice = field.coerce(&once);
            assert_eq!(once, twice, "coercion not idempotent for {:?}", field);
        }
    }

    #[test]
    fn test_array_validation_is_uniform() {
        let field = FieldType::array(ScalarKind::Number);
        assert!(field.validates(&json!([1, 2, 3])));
        assert!(field.validates(&json!([])));
        assert!(!field.validates(&json!([1, "two", 3])));
        assert!(!field.validates(&json!(1)));
    }

    #[test]
    fn test_array_coercion_is_element_wise() {
        let field = FieldType::array(ScalarKind::Date);
        let coerced = field.coerce(&json!([0, "2024-03-01T12:00:00+02:00"]));
        assert_eq!(
            coerced,
            json!(["1970-01-01T00:00:00.000Z", "2024-03-01T10:00:00.000Z"])
        );
    }

    #[test]
    fn test_reference_validation() {
        let field = FieldType::reference("users");
        assert!(field.validates(&json!("user_1")));
        assert!(!field.validates(&json!("")));
        assert!(!field.validates(&json!(42)));
        assert!(!field.validates(&json!({ "_id": "user_1" })));
    }

    #[test]
    fn test_reference_array_validation() {
        let field = FieldType::reference_array("users");
        assert!(field.validates(&json!(["a", "b"])));
        assert!(field.validates(&json!([])));
        assert!(!field.validates(&json!(["a", ""])));
        assert!(!field.validates(&json!("a")));
    }

    #[test]
    fn test_opaque_accepts_anything() {
        let field = FieldType::opaque();
        assert!(field.validates(&json!({ "nested": { "deep": [1, 2] } })));
        assert!(field.validates(&json!(null)));
        assert!(field.validates(&json!(42)));

        let value = json!({ "nested": true });
        assert_eq!(field.coerce(&value), value);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FieldType::text().label(), "text");
        assert_eq!(FieldType::array(ScalarKind::Date).label(), "date[]");
        assert_eq!(FieldType::reference("users").label(), "reference<users>");
        assert_eq!(
            FieldType::reference_array("posts").label(),
            "reference<posts>[]"
        );
        assert_eq!(FieldType::opaque().label(), "opaque");
    }

    #[test]
    fn test_field_type_serde_round_trip() {
        let fields = vec![
            FieldType::date(),
            FieldType::array(ScalarKind::Text),
            FieldType::reference("users"),
            FieldType::reference_array("posts"),
            FieldType::opaque(),
        ];

        for field in fields {
            let encoded = serde_json::to_value(&field).unwrap();
            let decoded: FieldType = serde_json::from_value(encoded).unwrap();
            assert_eq!(field, decoded);
        }
    }

    #[test]
    fn test_reference_serde_shape() {
        let encoded = serde_json::to_value(FieldType::reference("users")).unwrap();
        assert_eq!(encoded, json!({ "type": "reference", "model": "users" }));
    }
}
