//! docmap - a strict schema and document-mapping layer for document stores

pub mod model;
pub mod observability;
pub mod schema;
pub mod store;
