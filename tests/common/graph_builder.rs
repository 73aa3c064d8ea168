//! Graph building utilities for integration tests

use super::fixtures::{EDGE_ROWS, FULL_NAME_ROWS, NODE_ROWS};
use fosgraph::{
    EdgeRecord, EdgeType, FosGraph, IngestSession, NodeRecord, Role, RoleSet, SessionReport,
};
use std::io::Cursor;

/// Ingest the fixture rows into a fresh graph in one session
pub fn ingest_fixture() -> (FosGraph, SessionReport) {
    let graph = FosGraph::new();
    let report = {
        let mut session = IngestSession::new(&graph);
        session.ingest_node_rows(Cursor::new(NODE_ROWS));
        session.ingest_full_name_rows(Cursor::new(FULL_NAME_ROWS));
        session.ingest_edge_rows(Cursor::new(EDGE_ROWS));
        session.finalize()
    };
    (graph, report)
}

/// Collects typed records, then applies them in one session
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, id: &str, name: &str, roles: &[Role]) -> Self {
        let roles: RoleSet = roles.iter().copied().collect();
        self.nodes.push(NodeRecord::new(id, name, roles));
        self
    }

    pub fn venue(self, id: &str, name: &str) -> Self {
        self.node(id, name, &[Role::Venue])
    }

    pub fn edge(mut self, source: &str, target: &str, edge_type: EdgeType) -> Self {
        self.edges.push(EdgeRecord::new(source, target, edge_type));
        self
    }

    pub fn weighted(mut self, source: &str, target: &str, edge_type: EdgeType, weight: f64) -> Self {
        self.edges.push(EdgeRecord::weighted(source, target, edge_type, weight));
        self
    }

    /// Apply into an existing graph
    pub fn apply(&self, graph: &FosGraph) -> SessionReport {
        let mut session = IngestSession::new(graph);
        session.ingest_nodes(self.nodes.clone());
        session.ingest_edges(self.edges.clone());
        session.finalize()
    }

    pub fn build(&self) -> FosGraph {
        let graph = FosGraph::new();
        self.apply(&graph);
        graph
    }
}
