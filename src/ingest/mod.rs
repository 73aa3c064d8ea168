//! Batch ingestion of exporter records
//!
//! Records arrive as typed structs or as delimited rows. A session merges
//! them into the shared graph, queues references to nodes that have not
//! arrived yet and validates what it touched when it is finalized.

mod records;
mod session;

pub use records::{
    parse_roles, EdgeRecord, FullNameRecord, MalformedKind, NodeRecord, RecordError, RowFormat,
};
pub use session::{BatchKind, BatchReport, Dangling, IngestSession, SessionReport};
