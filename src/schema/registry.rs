//! Ordered, append-only registries
//!
//! Every schema registry (hooks, populates, virtuals, uploads) shares the
//! same discipline: entries are unique by key, the first registration wins,
//! nothing is ever removed, and iteration follows registration order.

use std::collections::HashMap;

/// An insert-once map that remembers registration order
#[derive(Default)]
pub struct KeyedRegistry<T> {
    entries: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> KeyedRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register an entry under a key
    ///
    /// Returns false without touching the registry if the key is taken.
    pub fn register(&mut self, key: impl Into<String>, entry: T) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.order.push(key.clone());
        self.entries.insert(key, entry);
        true
    }

    /// Look up an entry by key
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Iterate entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| (key.as_str(), entry)))
    }
}
