//! Relationship and virtual-field resolution
//!
//! Read-time resolution runs strictly sequentially, by design:
//! - array-populate output order matches input identity order
//! - a later descriptor observes mutations made by an earlier one
//!
//! Fetches within one array field could run concurrently and reassemble by
//! index without breaking the contract, but resolution must never
//! parallelize across descriptors. An unresolved target model name is not
//! an error: the descriptor is skipped and resolution degrades to nothing
//! found. Store failures from a resolved model do propagate.

use serde_json::Value;

use crate::model::FilterOp;

use super::errors::SchemaResult;
use super::schema::Schema;
use super::types::FieldType;

impl Schema {
    /// Resolve registered populate descriptors against a document, in place
    ///
    /// For a reference-array field every element is fetched by identity,
    /// one at a time, preserving order; nulls are skipped and a miss leaves
    /// a null placeholder. A single reference is replaced by its fetched
    /// document. Fetched documents are requested with nested resolution.
    pub async fn apply_populates(&self, doc: &mut Value) -> SchemaResult<()> {
        for spec in self.populates() {
            let Some(target) = self.lookup_model(&spec.model) else {
                continue;
            };
            let Some(def) = self.field(&spec.path) else {
                continue;
            };

            match def {
                FieldType::ReferenceArray { .. } => {
                    let ids: Vec<Value> = doc
                        .get(&spec.path)
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();

                    let mut resolved = Vec::with_capacity(ids.len());
                    for id in &ids {
                        if id.is_null() {
                            continue;
                        }
                        let fetched = match id.as_str() {
                            Some(id) => target.find_by_id(id, true).await?,
                            None => None,
                        };
                        resolved.push(fetched.unwrap_or(Value::Null));
                    }

                    if let Some(obj) = doc.as_object_mut() {
                        obj.insert(spec.path.clone(), Value::Array(resolved));
                    }
                }
                FieldType::Reference { .. } => {
                    let id = doc
                        .get(&spec.path)
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    let Some(id) = id.filter(|id| !id.is_empty()) else {
                        continue;
                    };

                    let fetched = target.find_by_id(&id, true).await?;
                    if let Some(obj) = doc.as_object_mut() {
                        obj.insert(spec.path.clone(), fetched.unwrap_or(Value::Null));
                    }
                }
                // populate only applies to reference-shaped fields
                _ => {}
            }
        }
        Ok(())
    }

    /// Materialize registered virtual fields on a document, in place
    ///
    /// Each virtual issues one equality query against its target model:
    /// every document whose `foreign_field` equals this document's
    /// `local_field` value, with nested resolution requested. Descriptors
    /// run sequentially in registration order.
    pub async fn apply_virtuals(&self, doc: &mut Value) -> SchemaResult<()> {
        for (name, spec) in self.virtuals() {
            let Some(target) = self.lookup_model(&spec.ref_model) else {
                continue;
            };

            let local = doc.get(&spec.local_field).cloned().unwrap_or(Value::Null);
            let matches = target
                .find(&spec.foreign_field, FilterOp::Eq, &local, true)
                .await?;

            if let Some(obj) = doc.as_object_mut() {
                obj.insert(name, Value::Array(matches));
            }
        }
        Ok(())
    }
}
