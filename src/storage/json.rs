//! JSON snapshot backend

use super::traits::{GraphStore, LoadSummary, OpenStore, StorageError, StorageResult};
use crate::graph::{Change, Edge, FosGraph, GraphError, Node, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Format version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// A point-in-time copy of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Nodes not yet validated clean when the snapshot was taken
    #[serde(default)]
    pub pending: Vec<NodeId>,
}

impl GraphSnapshot {
    /// Copy nodes and edges out of a graph, both sorted by id
    pub fn capture(graph: &FosGraph) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            nodes: graph.nodes(),
            edges: graph.edges(),
            pending: graph.pending(),
        }
    }

    /// Merge this snapshot into a graph, nodes first
    ///
    /// Every edge endpoint is checked before anything is merged, so a bad
    /// snapshot leaves the graph untouched. Nodes the snapshot creates are
    /// pending only if they were pending when it was taken; nodes it
    /// changes stay pending.
    pub fn restore(self, graph: &FosGraph) -> StorageResult<LoadSummary> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StorageError::Version {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let known: BTreeSet<&NodeId> = self.nodes.iter().map(|n| &n.id).collect();
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !known.contains(endpoint) && !graph.contains(endpoint) {
                    return Err(GraphError::DanglingReference {
                        edge: edge.key(),
                        missing: endpoint.clone(),
                    }
                    .into());
                }
            }
        }

        let summary = LoadSummary {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        };
        let mut created: BTreeSet<NodeId> = BTreeSet::new();
        for node in self.nodes {
            let id = node.id.clone();
            if graph.merge_node(node) == Change::Created {
                created.insert(id);
            }
        }
        for edge in self.edges {
            graph.upsert_edge(&edge.source, &edge.target, edge.edge_type, edge.weight)?;
        }

        let pending: BTreeSet<NodeId> = self.pending.into_iter().collect();
        let settled: Vec<(NodeId, u64)> = graph
            .pending_marks()
            .into_iter()
            .filter(|(id, _)| created.contains(id) && !pending.contains(id))
            .collect();
        graph.clear_pending(settled);
        Ok(summary)
    }
}

/// Graph store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl OpenStore for JsonStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl GraphStore for JsonStore {
    fn save(&self, graph: &FosGraph) -> StorageResult<()> {
        let snapshot = GraphSnapshot::capture(graph);

        // Write to a sibling file, then rename over the target
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        info!(
            path = %self.path.display(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "snapshot saved"
        );
        Ok(())
    }

    fn load_into(&self, graph: &FosGraph) -> StorageResult<LoadSummary> {
        let reader = BufReader::new(File::open(&self.path)?);
        let snapshot: GraphSnapshot = serde_json::from_reader(reader)?;
        let summary = snapshot.restore(graph)?;
        info!(
            path = %self.path.display(),
            nodes = summary.nodes,
            edges = summary.edges,
            "snapshot loaded"
        );
        Ok(summary)
    }
}
