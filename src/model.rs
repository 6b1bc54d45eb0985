//! Model boundary
//!
//! A model owns one collection and one schema. This layer only consumes the
//! narrow read surface needed for relationship resolution: fetch by identity
//! and filtered find. The CRUD surface and its transport to the store live
//! with the model implementation, not here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::schema::SchemaResult;

/// Filter operators for model queries
///
/// Virtual-field resolution only issues `Eq`; the remaining operators are
/// part of the boundary so model implementations expose one find surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// field == value
    Eq,
    /// field >= value
    Gte,
    /// field > value
    Gt,
    /// field <= value
    Lte,
    /// field < value
    Lt,
}

impl FilterOp {
    /// Returns the operator name for diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Gt => "gt",
            FilterOp::Lte => "lte",
            FilterOp::Lt => "lt",
        }
    }

    /// Returns true for the equality operator
    pub fn is_equality(&self) -> bool {
        matches!(self, FilterOp::Eq)
    }
}

/// A named collection owner bound to one schema
#[async_trait]
pub trait Model: Send + Sync {
    /// Collection name, used for diagnostics and registry lookup
    fn name(&self) -> &str;

    /// Fetch a single document by identity
    ///
    /// `resolve_refs` requests that references inside the fetched document
    /// are resolved before it is returned. Returns `None` when no document
    /// carries the identity.
    async fn find_by_id(&self, id: &str, resolve_refs: bool) -> SchemaResult<Option<Value>>;

    /// Fetch every document where `field op value` holds
    async fn find(
        &self,
        field: &str,
        op: FilterOp,
        value: &Value,
        resolve_refs: bool,
    ) -> SchemaResult<Vec<Value>>;
}

/// Name-to-model lookup shared by every schema
///
/// Populated once during wiring, then handed to each schema through
/// `Schema::attach_registry`. Resolution never reaches for a global.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Model>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Register a model under its own name
    ///
    /// The first registration for a name wins; returns false on a duplicate.
    pub fn register(&mut self, model: Arc<dyn Model>) -> bool {
        let name = model.name().to_string();
        if self.models.contains_key(&name) {
            return false;
        }
        self.models.insert(name, model);
        true
    }

    /// Look up a model by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get(name).cloned()
    }

    /// Returns true if a model is registered under the name
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Number of registered models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if no model is registered
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullModel {
        name: String,
    }

    #[async_trait]
    impl Model for NullModel {
        fn name(&self) -> &str {
            &self.name
        }

        async fn find_by_id(&self, _id: &str, _resolve_refs: bool) -> SchemaResult<Option<Value>> {
            Ok(None)
        }

        async fn find(
            &self,
            _field: &str,
            _op: FilterOp,
            _value: &Value,
            _resolve_refs: bool,
        ) -> SchemaResult<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ModelRegistry::new();
        registry.register(Arc::new(NullModel {
            name: "users".into(),
        }));

        assert!(registry.contains("users"));
        assert!(registry.get("users").is_some());
        assert!(registry.get("posts").is_none());
    }

    #[test]
    fn test_registry_first_registration_wins() {
        let mut registry = ModelRegistry::new();
        assert!(registry.register(Arc::new(NullModel {
            name: "users".into(),
        })));
        assert!(!registry.register(Arc::new(NullModel {
            name: "users".into(),
        })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_filter_op_names() {
        assert_eq!(FilterOp::Eq.as_str(), "eq");
        assert_eq!(FilterOp::Gte.as_str(), "gte");
        assert_eq!(FilterOp::Lt.as_str(), "lt");
        assert!(FilterOp::Eq.is_equality());
        assert!(!FilterOp::Gt.is_equality());
    }

    #[tokio::test]
    async fn test_null_model_surface() {
        let model = NullModel {
            name: "users".into(),
        };
        assert_eq!(model.find_by_id("u1", false).await.unwrap(), None);
        let found = model
            .find("owner", FilterOp::Eq, &json!("u1"), false)
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
