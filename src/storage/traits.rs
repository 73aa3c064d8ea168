//! Storage trait definitions

use crate::graph::{FosGraph, GraphError};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("Snapshot is inconsistent: {0}")]
    Graph(#[from] GraphError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Counts from restoring a snapshot into a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Trait for graph storage backends
///
/// Implementations must be thread-safe (Send + Sync) so one store can be
/// shared by the threads that own a graph.
pub trait GraphStore: Send + Sync {
    /// Persist every node and edge of the graph
    fn save(&self, graph: &FosGraph) -> StorageResult<()>;

    /// Merge the stored graph into `graph`
    ///
    /// Loading into a non-empty graph follows the usual merge rules: roles
    /// are unioned, attributes and weights are last-write-wins.
    fn load_into(&self, graph: &FosGraph) -> StorageResult<LoadSummary>;

    /// Load the stored graph into a fresh one
    fn load(&self) -> StorageResult<FosGraph> {
        let graph = FosGraph::new();
        self.load_into(&graph)?;
        Ok(graph)
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open a store at the given path; the file is created on first save
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;
}
