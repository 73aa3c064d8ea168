//! Hierarchy validation
//!
//! Checks the structural invariants of the taxonomy over the nodes touched
//! since their last clean validation. Violations are accumulated and
//! returned; the graph is never repaired or otherwise modified here.

use crate::graph::{attr, EdgeKey, EdgeType, FosGraph, Level, NodeId, Role};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

/// How serious a violation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Tolerated state, e.g. a root awaiting a later batch
    Warning,
    /// Broken invariant
    Error,
}

/// Where an L4 → L1 walk stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChainBreak {
    /// `node` has no parent at `level`
    MissingParent { node: NodeId, level: Level },
    /// `node` has several parents at `level`
    AmbiguousParent {
        node: NodeId,
        level: Level,
        parents: Vec<NodeId>,
    },
    /// The walk revisited a node
    Cycle { node: NodeId },
}

impl std::fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParent { node, level } => write!(f, "{} has no {} parent", node, level),
            Self::AmbiguousParent {
                node,
                level,
                parents,
            } => write!(f, "{} has {} {} parents", node, parents.len(), level),
            Self::Cycle { node } => write!(f, "cycle through {}", node),
        }
    }
}

/// A structural problem found by the validator
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Violation {
    #[error("keyword {node} has {found} in_L5 edges, expected exactly one")]
    OrphanKeyword { node: NodeId, found: usize },

    #[error("keyword {node} belongs to topic {actual} but records origin topic {recorded}")]
    TopicMismatch {
        node: NodeId,
        recorded: String,
        actual: NodeId,
    },

    #[error("{node} has {} parents at {level}: {parents:?}", .parents.len())]
    AmbiguousParent {
        node: NodeId,
        level: Level,
        parents: Vec<NodeId>,
    },

    #[error("{node} has no parent at {level} yet")]
    UnresolvedParent { node: NodeId, level: Level },

    #[error("venue {venue} is in L4 {l4} whose chain to L1 is broken: {reason}")]
    BrokenChain {
        venue: NodeId,
        l4: NodeId,
        reason: ChainBreak,
    },

    #[error("edge {edge} needs role {expected} on {node}")]
    RoleMismatch {
        edge: EdgeKey,
        node: NodeId,
        expected: Role,
    },
}

impl Violation {
    pub fn severity(&self) -> Severity {
        match self {
            Violation::UnresolvedParent { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The node the violation is reported against
    pub fn node(&self) -> &NodeId {
        match self {
            Violation::OrphanKeyword { node, .. }
            | Violation::TopicMismatch { node, .. }
            | Violation::AmbiguousParent { node, .. }
            | Violation::UnresolvedParent { node, .. }
            | Violation::RoleMismatch { node, .. } => node,
            Violation::BrokenChain { venue, .. } => venue,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Violation::OrphanKeyword { .. } => 0,
            Violation::TopicMismatch { .. } => 1,
            Violation::AmbiguousParent { .. } => 2,
            Violation::UnresolvedParent { .. } => 3,
            Violation::BrokenChain { .. } => 4,
            Violation::RoleMismatch { .. } => 5,
        }
    }
}

/// Result of one validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Nodes that were checked, sorted
    pub checked: Vec<NodeId>,
    /// Violations, sorted by node then kind
    pub violations: Vec<Violation>,
    /// Pending revisions of the checked nodes, read before checking
    #[serde(skip)]
    revisions: BTreeMap<NodeId, u64>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity() == Severity::Warning)
    }

    /// No error-level violations (warnings are tolerated)
    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Checked nodes without error-level violations
    pub fn clean_ids(&self) -> Vec<NodeId> {
        let flagged: BTreeSet<&NodeId> = self.errors().map(Violation::node).collect();
        self.checked
            .iter()
            .filter(|id| !flagged.contains(id))
            .cloned()
            .collect()
    }

    /// Pending marks of the clean nodes, for [`FosGraph::clear_pending`]
    pub fn clean_marks(&self) -> Vec<(NodeId, u64)> {
        self.clean_ids()
            .into_iter()
            .filter_map(|id| self.revisions.get(&id).map(|rev| (id, *rev)))
            .collect()
    }
}

/// Validates the nodes pending since their last clean run
pub fn validate(graph: &FosGraph) -> ValidationReport {
    let marks = graph.pending_marks();
    let ids: Vec<NodeId> = marks.keys().cloned().collect();
    Validator::new(graph).run(ids, marks)
}

/// Validates every node in the graph
pub fn validate_all(graph: &FosGraph) -> ValidationReport {
    Validator::new(graph).run(graph.node_ids(), graph.pending_marks())
}

/// Hierarchy validator over a graph snapshot
pub struct Validator<'g> {
    graph: &'g FosGraph,
}

impl<'g> Validator<'g> {
    pub fn new(graph: &'g FosGraph) -> Self {
        Self { graph }
    }

    /// Check the given nodes, plus the venues whose L4 chain runs through
    /// any of them
    pub fn check(&self, ids: impl IntoIterator<Item = NodeId>) -> ValidationReport {
        self.run(ids, self.graph.pending_marks())
    }

    /// Marks must be read before any node is, so changes made while checking
    /// keep a newer revision than the one recorded
    fn run(&self, ids: impl IntoIterator<Item = NodeId>, mut marks: BTreeMap<NodeId, u64>) -> ValidationReport {
        let checked: BTreeSet<NodeId> = ids.into_iter().collect();
        marks.retain(|id, _| checked.contains(id));
        let mut violations = Vec::new();
        let mut chain_venues: BTreeSet<NodeId> = BTreeSet::new();
        let mut edges: BTreeSet<EdgeKey> = BTreeSet::new();

        for id in &checked {
            let Ok(node) = self.graph.get_node(id) else {
                continue;
            };

            if node.has_role(Role::IsL6) {
                self.check_keyword(id, node.attribute_str(attr::L5_TOPIC), &mut violations);
            }
            for level in node.roles.levels() {
                self.check_parent(id, level, &mut violations);
                if level <= Level::L4 {
                    chain_venues.extend(self.venues_below(id, level));
                }
            }
            if node.is_venue() && !self.graph.targets(id, EdgeType::InL4).is_empty() {
                chain_venues.insert(id.clone());
            }

            edges.extend(self.graph.edges_from(id, None).iter().map(|e| e.key()));
            edges.extend(self.graph.edges_to(id, None).iter().map(|e| e.key()));
        }

        for venue in &chain_venues {
            self.check_chain(venue, &mut violations);
        }
        for key in &edges {
            self.check_roles(key, &mut violations);
        }

        violations.sort_by(|a, b| a.node().cmp(b.node()).then(a.rank().cmp(&b.rank())));
        violations.dedup();

        let report = ValidationReport {
            checked: checked.into_iter().collect(),
            violations,
            revisions: marks,
        };
        for v in &report.violations {
            debug!(severity = ?v.severity(), "{}", v);
        }
        info!(
            checked = report.checked.len(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "validation finished"
        );
        report
    }

    fn check_keyword(&self, id: &NodeId, recorded: Option<&str>, out: &mut Vec<Violation>) {
        let topics = self.graph.targets(id, EdgeType::InL5);
        if topics.len() != 1 {
            out.push(Violation::OrphanKeyword {
                node: id.clone(),
                found: topics.len(),
            });
            return;
        }
        if let Some(recorded) = recorded {
            if recorded != topics[0].as_str() {
                out.push(Violation::TopicMismatch {
                    node: id.clone(),
                    recorded: recorded.to_string(),
                    actual: topics[0].clone(),
                });
            }
        }
    }

    fn check_parent(&self, id: &NodeId, level: Level, out: &mut Vec<Violation>) {
        let (Some(edge_type), Some(parent_level)) = (EdgeType::specializes_from(level), level.parent())
        else {
            return;
        };
        let parents = self.graph.targets(id, edge_type);
        match parents.len() {
            0 => out.push(Violation::UnresolvedParent {
                node: id.clone(),
                level: parent_level,
            }),
            1 => {}
            _ => out.push(Violation::AmbiguousParent {
                node: id.clone(),
                level: parent_level,
                parents,
            }),
        }
    }

    /// Venues assigned to an L4 node at or below `id`
    fn venues_below(&self, id: &NodeId, level: Level) -> BTreeSet<NodeId> {
        let mut frontier = vec![id.clone()];
        let mut seen = BTreeSet::from([id.clone()]);
        let mut current = level;
        while let Some(child) = Level::from_depth(current.depth() + 1).filter(|l| *l <= Level::L4) {
            let Some(edge_type) = EdgeType::specializes_from(child) else {
                break;
            };
            frontier = frontier
                .iter()
                .flat_map(|n| self.graph.sources(n, edge_type))
                .filter(|n| seen.insert(n.clone()))
                .collect();
            current = child;
        }
        frontier
            .iter()
            .flat_map(|l4| self.graph.sources(l4, EdgeType::InL4))
            .collect()
    }

    fn check_chain(&self, venue: &NodeId, out: &mut Vec<Violation>) {
        for l4 in self.graph.targets(venue, EdgeType::InL4) {
            if let Err(reason) = self.walk_to_root(&l4) {
                out.push(Violation::BrokenChain {
                    venue: venue.clone(),
                    l4,
                    reason,
                });
            }
        }
    }

    /// Follow `specializes_L3` → `specializes_L2` → `specializes_L1` from an L4 node
    fn walk_to_root(&self, l4: &NodeId) -> Result<(), ChainBreak> {
        let mut node = l4.clone();
        let mut level = Level::L4;
        let mut seen = BTreeSet::from([node.clone()]);
        while let (Some(edge_type), Some(parent_level)) =
            (EdgeType::specializes_from(level), level.parent())
        {
            let mut parents = self.graph.targets(&node, edge_type);
            match parents.len() {
                0 => {
                    return Err(ChainBreak::MissingParent {
                        node,
                        level: parent_level,
                    })
                }
                1 => {
                    let parent = parents.remove(0);
                    if !seen.insert(parent.clone()) {
                        return Err(ChainBreak::Cycle { node: parent });
                    }
                    node = parent;
                }
                _ => {
                    return Err(ChainBreak::AmbiguousParent {
                        node,
                        level: parent_level,
                        parents,
                    })
                }
            }
            level = parent_level;
        }
        Ok(())
    }

    fn check_roles(&self, key: &EdgeKey, out: &mut Vec<Violation>) {
        let ty = key.edge_type;
        for (node, expected) in [(&key.source, ty.source_role()), (&key.target, ty.target_role())] {
            if !self.graph.has_role(node, expected) {
                out.push(Violation::RoleMismatch {
                    edge: key.clone(),
                    node: node.clone(),
                    expected,
                });
            }
        }
    }
}
