//! fosgraph: multi-relational graph engine for the Field-of-Science taxonomy
//!
//! Venues, FoS levels L1..L5 and keywords live in one typed graph. Records
//! are merged in batches from concurrent ingestion sessions, the hierarchy
//! is checked by an incremental validator, and queries resolve FoS paths,
//! classify venues from their citations and export the taxonomy.
//!
//! # Core Concepts
//!
//! - **Nodes**: one record per id carrying a set of roles (`venue`, `L1`..`L5`, `is_L6`)
//! - **Edges**: typed and deduplicated on (source, target, type); weight is last-write-wins
//! - **Validation**: parent uniqueness and chain completeness, reported, never auto-fixed
//!
//! # Example
//!
//! ```
//! use fosgraph::{EdgeRecord, EdgeType, FosGraph, IngestSession, Level, NodeRecord, Role, RoleSet};
//!
//! let graph = FosGraph::new();
//! let mut session = IngestSession::new(&graph);
//! session.ingest_nodes(vec![
//!     NodeRecord::new("1", "VenueA", RoleSet::from([Role::Venue])),
//!     NodeRecord::new("2", "AI & IP", RoleSet::from([Role::L3])),
//! ]);
//! session.ingest_edges(vec![EdgeRecord::new("1", "2", EdgeType::InL3)]);
//! session.finalize();
//!
//! let path = fosgraph::resolve_path(&graph, &"1".into()).unwrap();
//! assert_eq!(path.name_at(Level::L3), Some("AI & IP"));
//! ```

pub mod config;
mod graph;
pub mod ingest;
pub mod query;
pub mod storage;
pub mod taxonomy;
pub mod validate;

pub use config::{ConfigError, EngineConfig};
pub use graph::{
    attr, Attributes, Change, Edge, EdgeKey, EdgeType, FosGraph, GraphError, GraphResult, Level, Node,
    NodeId, NodeMetadata, PropertyValue, Role, RoleSet,
};
pub use ingest::{
    BatchReport, EdgeRecord, FullNameRecord, IngestSession, NodeRecord, RecordError, RowFormat,
    SessionReport,
};
pub use query::{
    annotation_coverage, classify_by_citation, infer_assignments, keyword_neighborhood, resolve_path,
    venues_in_fos, CancellationToken, Classification, ClassifyParams, Coverage, Cutoff, FosPath,
};
pub use storage::{GraphStore, JsonStore, OpenStore, StorageError, StorageResult};
pub use taxonomy::{TaxonomyExporter, TaxonomyRecord, TopicNamer};
pub use validate::{validate, validate_all, ValidationReport, Violation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
