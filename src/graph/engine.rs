//! FosGraph: the shared node and edge store

use super::edge::{Edge, EdgeKey, EdgeType};
use super::node::{Attributes, Level, Node, NodeId, Role, RoleSet};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors that can occur in graph operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Dangling reference: edge {edge} references unknown node {missing}")]
    DanglingReference { edge: EdgeKey, missing: NodeId },

    #[error("Node {node} does not hold role {expected}")]
    RoleMismatch { node: NodeId, expected: Role },

    #[error("Level {level} is not valid for {operation}")]
    InvalidLevel { level: Level, operation: &'static str },
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Outcome of a single upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Unchanged,
}

/// The FoS graph store
///
/// Every map is sharded, so an upsert holds an exclusive section only for
/// its own node or edge key. Readers clone values out of the store and never
/// observe a half-merged node. Lock order is always nodes → name/role
/// indices and edges → adjacency indices.
///
/// Pending nodes carry the graph revision of their latest change, so a
/// validation pass only clears marks it actually observed.
#[derive(Debug, Default)]
pub struct FosGraph {
    nodes: DashMap<NodeId, Node>,
    names: DashMap<String, BTreeSet<NodeId>>,
    by_role: DashMap<Role, BTreeSet<NodeId>>,
    edges: DashMap<EdgeKey, Edge>,
    outgoing: DashMap<(NodeId, EdgeType), BTreeSet<NodeId>>,
    incoming: DashMap<(NodeId, EdgeType), BTreeSet<NodeId>>,
    pending: DashMap<NodeId, u64>,
    revision: AtomicU64,
}

impl FosGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    /// Create a node or merge roles and attributes into an existing one
    pub fn upsert_node(
        &self,
        id: NodeId,
        name: impl Into<String>,
        roles: RoleSet,
        attributes: Attributes,
    ) -> Change {
        let mut node = Node::new(id, name, roles);
        node.attributes = attributes;
        self.merge_node(node)
    }

    /// Merge a whole node record, keeping its full names and metadata when new
    pub(crate) fn merge_node(&self, node: Node) -> Change {
        let id = node.id.clone();
        let change = match self.nodes.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let old_name = existing.name.clone();
                let added_roles: Vec<Role> =
                    node.roles.iter().filter(|r| !existing.has_role(*r)).collect();
                let mut changed = existing.merge(node.name, &node.roles, node.attributes);
                for full_name in node.full_names {
                    changed |= existing.full_names.insert(full_name);
                }
                if existing.name != old_name {
                    self.unindex_name(&old_name, &id);
                    self.index_name(&existing.name, &id);
                }
                for role in added_roles {
                    self.by_role.entry(role).or_default().insert(id.clone());
                }
                if changed {
                    Change::Updated
                } else {
                    Change::Unchanged
                }
            }
            Entry::Vacant(entry) => {
                self.index_name(&node.name, &id);
                for role in node.roles.iter() {
                    self.by_role.entry(role).or_default().insert(id.clone());
                }
                entry.insert(node);
                Change::Created
            }
        };
        if change != Change::Unchanged {
            self.touch(id);
        }
        change
    }

    fn touch(&self, id: NodeId) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.insert(id, revision);
    }

    fn index_name(&self, name: &str, id: &NodeId) {
        self.names.entry(name.to_string()).or_default().insert(id.clone());
    }

    fn unindex_name(&self, name: &str, id: &NodeId) {
        if let Some(mut ids) = self.names.get_mut(name) {
            ids.remove(id);
        }
        self.names.remove_if(name, |_, ids| ids.is_empty());
    }

    /// Append an alternate full name; returns false if it was already present
    pub fn add_full_name(&self, id: &NodeId, full_name: impl Into<String>) -> GraphResult<bool> {
        let mut node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        Ok(node.full_names.insert(full_name.into()))
    }

    /// Get a copy of a node
    pub fn get_node(&self, id: &NodeId) -> GraphResult<Node> {
        self.nodes
            .get(id)
            .map(|n| n.clone())
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))
    }

    /// Check if a node exists
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Check if a node exists and holds `role`
    pub fn has_role(&self, id: &NodeId, role: Role) -> bool {
        self.nodes.get(id).map(|n| n.has_role(role)).unwrap_or(false)
    }

    /// Name of a node, if it exists
    pub fn name_of(&self, id: &NodeId) -> Option<String> {
        self.nodes.get(id).map(|n| n.name.clone())
    }

    /// All node ids carrying `name`, sorted
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.names
            .get(name)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All node ids holding `role`, sorted
    pub fn nodes_with_role(&self, role: Role) -> Vec<NodeId> {
        self.by_role
            .get(&role)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All node ids, sorted
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// All nodes, sorted by id
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.iter().map(|r| r.value().clone()).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Edges ---

    /// Create an edge or overwrite the weight of an existing one
    ///
    /// Both endpoints must already be known. A missing weight on
    /// re-ingestion leaves the stored weight untouched.
    pub fn upsert_edge(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: EdgeType,
        weight: Option<f64>,
    ) -> GraphResult<Change> {
        let key = EdgeKey::new(source.clone(), target.clone(), edge_type);
        for endpoint in [source, target] {
            if !self.contains(endpoint) {
                return Err(GraphError::DanglingReference {
                    edge: key,
                    missing: endpoint.clone(),
                });
            }
        }

        let change = match self.edges.entry(key) {
            Entry::Occupied(mut entry) => {
                let edge = entry.get_mut();
                match weight {
                    Some(w) if edge.weight != Some(w) => {
                        edge.weight = Some(w);
                        Change::Updated
                    }
                    _ => Change::Unchanged,
                }
            }
            Entry::Vacant(entry) => {
                self.outgoing
                    .entry((source.clone(), edge_type))
                    .or_default()
                    .insert(target.clone());
                self.incoming
                    .entry((target.clone(), edge_type))
                    .or_default()
                    .insert(source.clone());
                entry.insert(Edge {
                    source: source.clone(),
                    target: target.clone(),
                    edge_type,
                    weight,
                });
                Change::Created
            }
        };

        if change != Change::Unchanged {
            self.touch(source.clone());
            self.touch(target.clone());
        }
        Ok(change)
    }

    /// Get a copy of one edge
    pub fn get_edge(&self, source: &NodeId, target: &NodeId, edge_type: EdgeType) -> Option<Edge> {
        self.edges
            .get(&EdgeKey::new(source.clone(), target.clone(), edge_type))
            .map(|e| e.clone())
    }

    /// Targets of `id`'s outgoing edges of one type, sorted
    pub fn targets(&self, id: &NodeId, edge_type: EdgeType) -> Vec<NodeId> {
        self.outgoing
            .get(&(id.clone(), edge_type))
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sources of `id`'s incoming edges of one type, sorted
    pub fn sources(&self, id: &NodeId, edge_type: EdgeType) -> Vec<NodeId> {
        self.incoming
            .get(&(id.clone(), edge_type))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Outgoing edges, optionally restricted to one type
    ///
    /// Ordered by edge type, then target id.
    pub fn edges_from(&self, id: &NodeId, edge_type: Option<EdgeType>) -> Vec<Edge> {
        self.collect_edges(edge_type, |ty| {
            self.targets(id, ty)
                .into_iter()
                .map(|target| EdgeKey::new(id.clone(), target, ty))
                .collect()
        })
    }

    /// Incoming edges, optionally restricted to one type
    ///
    /// Ordered by edge type, then source id.
    pub fn edges_to(&self, id: &NodeId, edge_type: Option<EdgeType>) -> Vec<Edge> {
        self.collect_edges(edge_type, |ty| {
            self.sources(id, ty)
                .into_iter()
                .map(|source| EdgeKey::new(source, id.clone(), ty))
                .collect()
        })
    }

    fn collect_edges(
        &self,
        edge_type: Option<EdgeType>,
        keys_for: impl Fn(EdgeType) -> Vec<EdgeKey>,
    ) -> Vec<Edge> {
        let types: Vec<EdgeType> = match edge_type {
            Some(ty) => vec![ty],
            None => EdgeType::ALL.to_vec(),
        };
        types
            .into_iter()
            .flat_map(keys_for)
            .filter_map(|key| self.edges.get(&key).map(|e| e.clone()))
            .collect()
    }

    /// All edges, sorted by key
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges.iter().map(|r| r.value().clone()).collect();
        edges.sort_by_key(|e| e.key());
        edges
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // --- Validation bookkeeping ---

    /// Nodes touched since they were last validated clean, sorted
    pub fn pending(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.pending.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Pending nodes with the revision of their latest change
    pub fn pending_marks(&self) -> BTreeMap<NodeId, u64> {
        self.pending.iter().map(|r| (r.key().clone(), *r.value())).collect()
    }

    /// Drop pending marks that validated clean
    ///
    /// A mark is only removed if the node has not changed since `revision`
    /// was read; later changes stay pending. Returns how many were cleared.
    pub fn clear_pending(&self, marks: impl IntoIterator<Item = (NodeId, u64)>) -> usize {
        marks
            .into_iter()
            .filter(|(id, revision)| self.pending.remove_if(id, |_, current| current == revision).is_some())
            .count()
    }
}
