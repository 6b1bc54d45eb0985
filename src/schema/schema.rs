//! Schema: field definitions, registries and document build
//!
//! A schema is fixed at construction: the field-definition map never
//! changes afterwards. Everything else about it is append-only. Hooks,
//! populates, virtuals and uploads register once per key and are never
//! removed. Attachment of the owning model and the shared model registry
//! happens exactly once, during wiring.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock, Weak};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Model, ModelRegistry};
use crate::observability::Logger;
use crate::store;

use super::errors::{SchemaError, SchemaResult};
use super::registry::KeyedRegistry;
use super::types::FieldType;

/// Reserved identity key
pub const ID_KEY: &str = "_id";
/// Reserved creation-time metadata key
pub const CREATED_KEY: &str = "_c";
/// Reserved update-time metadata key
pub const UPDATED_KEY: &str = "_u";

/// Options controlling one document build
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Strip `_id` from the result
    pub remove_id: bool,
    /// Translate null source fields into the store's delete marker
    pub include_deletes: bool,
    /// Collapse resolved references back to identities before validation
    pub clean_refs: bool,
}

/// Read-time replacement of a stored reference with its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateSpec {
    /// Document field holding the reference(s)
    pub path: String,
    /// Target model name
    pub model: String,
}

/// Read-time reverse lookup materialized as a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualSpec {
    /// Target model name
    #[serde(rename = "ref")]
    pub ref_model: String,
    /// Field on this document whose value is matched
    pub local_field: String,
    /// Field on the target model's documents to match against
    pub foreign_field: String,
}

/// A document field whose content arrives through file upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSpec {
    /// Document field the upload lands on
    pub path: String,
    /// Storage location pattern for the uploaded file
    pub storage_path: String,
}

/// Pre-operation hook callback
///
/// Runs synchronously with the schema as context; completion is guaranteed
/// before `run_hooks` returns.
pub type HookFn = Arc<dyn Fn(&Schema) -> SchemaResult<()> + Send + Sync>;

/// Field definitions plus the mutable registries of one collection
pub struct Schema {
    fields: HashMap<String, FieldType>,
    model: OnceLock<Weak<dyn Model>>,
    models: OnceLock<Arc<ModelRegistry>>,
    hooks: RwLock<KeyedRegistry<HookFn>>,
    populates: RwLock<KeyedRegistry<PopulateSpec>>,
    virtuals: RwLock<KeyedRegistry<VirtualSpec>>,
    uploads: RwLock<KeyedRegistry<UploadSpec>>,
}

impl Schema {
    /// Create a schema from its field-definition map
    pub fn new(fields: HashMap<String, FieldType>) -> Self {
        Self {
            fields,
            model: OnceLock::new(),
            models: OnceLock::new(),
            hooks: RwLock::new(KeyedRegistry::new()),
            populates: RwLock::new(KeyedRegistry::new()),
            virtuals: RwLock::new(KeyedRegistry::new()),
            uploads: RwLock::new(KeyedRegistry::new()),
        }
    }

    /// The field-definition map
    pub fn fields(&self) -> &HashMap<String, FieldType> {
        &self.fields
    }

    /// Declared shape of one field, if any
    pub fn field(&self, key: &str) -> Option<&FieldType> {
        self.fields.get(key)
    }

    // ==========================================================
    // Attachment (one-time wiring)
    // ==========================================================

    /// Attach the owning model
    ///
    /// Held weakly; the model owns the schema, not the reverse. A second
    /// attach is ignored.
    pub fn attach_model(&self, model: &Arc<dyn Model>) {
        let _ = self.model.set(Arc::downgrade(model));
    }

    /// Attach the shared model registry. A second attach is ignored.
    pub fn attach_registry(&self, models: Arc<ModelRegistry>) {
        let _ = self.models.set(models);
    }

    /// Owning model, when attached and still alive
    pub fn model(&self) -> Option<Arc<dyn Model>> {
        self.model.get().and_then(Weak::upgrade)
    }

    /// Owning model's name for diagnostics
    pub(super) fn owner_name(&self) -> String {
        self.model()
            .map(|model| model.name().to_string())
            .unwrap_or_else(|| "unattached".to_string())
    }

    /// Resolve a populate/virtual target through the attached registry
    pub(super) fn lookup_model(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get().and_then(|registry| registry.get(name))
    }

    // ==========================================================
    // Registration
    // ==========================================================

    /// Register a populate descriptor, keyed by field path
    ///
    /// Returns false if the path is already registered.
    pub fn populate(&self, spec: PopulateSpec) -> bool {
        self.populates
            .write()
            .map(|mut populates| populates.register(spec.path.clone(), spec))
            .unwrap_or(false)
    }

    /// Register a pre-operation hook, keyed by operation name
    ///
    /// The first registration for an operation wins; later ones are
    /// silently dropped. Returns false on a duplicate.
    pub fn register_hook<F>(&self, operation: impl Into<String>, callback: F) -> bool
    where
        F: Fn(&Schema) -> SchemaResult<()> + Send + Sync + 'static,
    {
        let callback: HookFn = Arc::new(callback);
        self.hooks
            .write()
            .map(|mut hooks| hooks.register(operation.into(), callback))
            .unwrap_or(false)
    }

    /// Register a virtual field, keyed by field name
    pub fn virtual_field(&self, name: impl Into<String>, spec: VirtualSpec) -> bool {
        self.virtuals
            .write()
            .map(|mut virtuals| virtuals.register(name.into(), spec))
            .unwrap_or(false)
    }

    /// Register an upload descriptor, keyed by document field path
    pub fn upload(&self, storage_path: impl Into<String>, path: impl Into<String>) -> bool {
        let path = path.into();
        let spec = UploadSpec {
            path: path.clone(),
            storage_path: storage_path.into(),
        };
        self.uploads
            .write()
            .map(|mut uploads| uploads.register(path, spec))
            .unwrap_or(false)
    }

    /// Registered populate descriptors, in registration order
    pub fn populates(&self) -> Vec<PopulateSpec> {
        self.populates
            .read()
            .map(|populates| populates.iter().map(|(_, spec)| spec.clone()).collect())
            .unwrap_or_default()
    }

    /// Registered virtual fields, in registration order
    pub fn virtuals(&self) -> Vec<(String, VirtualSpec)> {
        self.virtuals
            .read()
            .map(|virtuals| {
                virtuals
                    .iter()
                    .map(|(name, spec)| (name.to_string(), spec.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Registered upload descriptors, in registration order
    pub fn uploads(&self) -> Vec<UploadSpec> {
        self.uploads
            .read()
            .map(|uploads| uploads.iter().map(|(_, spec)| spec.clone()).collect())
            .unwrap_or_default()
    }

    // ==========================================================
    // Hooks
    // ==========================================================

    /// Run the hook registered under an operation, if any
    ///
    /// Callback errors propagate unmodified. The callback runs outside the
    /// registry lock, so it may register further hooks.
    pub fn run_hooks(&self, operation: &str) -> SchemaResult<()> {
        let callback = self
            .hooks
            .read()
            .ok()
            .and_then(|hooks| hooks.get(operation).cloned());
        match callback {
            Some(callback) => callback(self),
            None => Ok(()),
        }
    }

    // ==========================================================
    // Document build
    // ==========================================================

    /// Build a store-ready document from a source object
    ///
    /// Only declared fields are copied; each copied value is validated and
    /// then coerced. A null source field requests removal: with
    /// `include_deletes` it becomes the store's delete marker, otherwise it
    /// is omitted. `_id`, `_c` and `_u` are structural and bypass the typed
    /// path. A validation failure aborts the whole build; the source is
    /// never mutated and no partial result escapes.
    pub fn build(&self, source: &Value, opts: BuildOptions) -> SchemaResult<Value> {
        let model = self.owner_name();
        let src = source.as_object().ok_or_else(|| SchemaError::NotAnObject {
            model: model.clone(),
            actual: json_type_name(source),
        })?;

        let mut out = Map::new();

        for (key, raw) in src {
            if key == ID_KEY || key == CREATED_KEY || key == UPDATED_KEY {
                continue;
            }
            let Some(def) = self.fields.get(key) else {
                continue;
            };

            if raw.is_null() {
                if opts.include_deletes {
                    out.insert(key.clone(), store::delete_marker());
                }
                continue;
            }

            let value = if opts.clean_refs && def.is_reference() {
                collapse_value(def, raw)
            } else {
                raw.clone()
            };

            if !def.validates(&value) {
                let cause = SchemaError::validation(&model, key, def.label(), &value);
                Logger::warn(
                    "BUILD_REJECTED",
                    &[
                        ("model", model.clone()),
                        ("field", key.clone()),
                        ("expected", def.label()),
                        ("value", value.to_string()),
                    ],
                );
                return Err(SchemaError::build(&model, cause));
            }

            out.insert(key.clone(), def.coerce(&value));
        }

        if !opts.remove_id {
            if let Some(id) = src.get(ID_KEY) {
                out.insert(ID_KEY.to_string(), id.clone());
            }
        }
        for meta in [CREATED_KEY, UPDATED_KEY] {
            if let Some(value) = src.get(meta) {
                if is_truthy(value) {
                    out.insert(meta.to_string(), value.clone());
                }
            }
        }

        Ok(Value::Object(out))
    }

    /// Collapse resolved references back to bare identities, in place
    ///
    /// Lets callers hand either an identity or a previously resolved
    /// document on write paths. Non-reference fields are untouched.
    pub fn collapse_refs(&self, source: &mut Value) {
        let Some(src) = source.as_object_mut() else {
            return;
        };
        for (key, def) in &self.fields {
            if !def.is_reference() {
                continue;
            }
            if let Some(value) = src.get_mut(key) {
                *value = collapse_value(def, value);
            }
        }
    }
}

/// Collapse one reference-shaped value to identities
fn collapse_value(def: &FieldType, value: &Value) -> Value {
    match def {
        FieldType::Reference { .. } => collapse_element(value),
        FieldType::ReferenceArray { .. } => match value.as_array() {
            Some(items) => Value::Array(items.iter().map(collapse_element).collect()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

/// A resolved document collapses to its `_id`; identities pass through
fn collapse_element(value: &Value) -> Value {
    match value.as_object() {
        Some(doc) => doc.get(ID_KEY).cloned().unwrap_or(Value::Null),
        None => value.clone(),
    }
}

/// Truthiness of a passthrough metadata value
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JSON type name for error messages
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
