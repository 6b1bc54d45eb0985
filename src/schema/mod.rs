//! Schema subsystem for docmap
//!
//! Declares field types, validates and coerces values at write time,
//! collapses resolved references on writes, and resolves relationships and
//! virtual fields at read time.
//!
//! # Design Principles
//!
//! - Field definitions are fixed at construction
//! - Registries only grow, unique by key, first registration wins
//! - Validation always precedes coercion
//! - A failed build aborts with no partial result
//! - Resolution is strictly sequential and degrades silently on unknown
//!   target models

mod errors;
mod registry;
mod resolve;
#[allow(clippy::module_inception)]
mod schema;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use schema::{
    BuildOptions, HookFn, PopulateSpec, Schema, UploadSpec, VirtualSpec, CREATED_KEY, ID_KEY,
    UPDATED_KEY,
};
pub use types::{FieldType, ScalarKind};
