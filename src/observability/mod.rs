//! Observability for the mapping layer
//!
//! Structured, synchronous, deterministic logging. One line per event.

mod logger;

pub use logger::{Logger, Severity};
