//! Read-only queries over a FoS graph
//!
//! Path resolution, citation-based classification, keyword neighborhoods
//! and coverage statistics. Every query is a pure function of the graph
//! state it reads.

mod budget;
mod classify;
mod coverage;
mod neighborhood;
mod path;
mod types;

pub use budget::{CancellationToken, Cutoff};
pub use classify::{classify_by_citation, infer_assignments, ClassifyParams, MAX_HOPS};
pub use coverage::{annotation_coverage, venues_in_fos};
pub use neighborhood::keyword_neighborhood;
pub use path::resolve_path;
pub use types::{
    Classification, Coverage, FosPath, KeywordNeighbor, LabelScore, Origin, PathStep, VenueAssignment,
};
