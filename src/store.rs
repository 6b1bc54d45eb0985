//! Store client boundary
//!
//! The only store detail this layer depends on: the sentinel a partial
//! update uses to request removal of a field. A source document asks for
//! removal with JSON `null`; the build pass translates that into the
//! sentinel when deletes are requested.

use serde_json::{json, Value};

/// Key marking a value as the field-removal sentinel
const DELETE_KEY: &str = "$delete";

/// Returns the delete-marker sentinel
///
/// Stored in place of a field value to signal removal on a partial write.
pub fn delete_marker() -> Value {
    json!({ DELETE_KEY: true })
}

/// Returns true if the value is the delete-marker sentinel
pub fn is_delete_marker(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.len() == 1 && obj.get(DELETE_KEY) == Some(&Value::Bool(true)))
        .unwrap_or(false)
}
