//! Storage backends for fosgraph
//!
//! Backends implement the `GraphStore` trait. `JsonStore` keeps a whole
//! graph as one JSON snapshot file.

mod json;
mod traits;

pub use json::{GraphSnapshot, JsonStore, SNAPSHOT_VERSION};
pub use traits::{GraphStore, LoadSummary, OpenStore, StorageError, StorageResult};
