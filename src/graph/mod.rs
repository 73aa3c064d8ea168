//! Core graph data structures

mod edge;
mod engine;
mod node;

#[cfg(test)]
mod tests;

pub use edge::{Edge, EdgeKey, EdgeType};
pub use engine::{Change, FosGraph, GraphError, GraphResult};
pub use node::{attr, Attributes, Level, Node, NodeId, NodeMetadata, PropertyValue, Role, RoleSet};
