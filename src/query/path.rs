//! Resolving a node's chain of FoS ancestors

use super::types::{FosPath, PathStep};
use crate::graph::{EdgeType, FosGraph, GraphResult, Level, NodeId};
use std::collections::BTreeSet;
use tracing::debug;

/// Resolve the FoS path of a venue, keyword or FoS node
///
/// The walk starts at the node's deepest own level (a keyword sits at L6 and
/// climbs through `in_L5`), or for a plain venue at its deepest `in_Lk`
/// assignment, then follows `specializes_*` edges up to L1. Levels the walk
/// did not reach are filled from the node's own `in_Lk` edges.
pub fn resolve_path(graph: &FosGraph, id: &NodeId) -> GraphResult<FosPath> {
    let node = graph.get_node(id)?;
    let mut path = FosPath::new(id.clone());

    let start = match node.roles.deepest_level() {
        Some(level) => Some((id.clone(), level)),
        None => Level::ALL
            .iter()
            .rev()
            .find_map(|&level| strongest_assignment(graph, id, level).map(|(target, _)| (target, level))),
    };

    if let Some((start, level)) = start {
        let assigned = &start != id;
        walk_up(graph, start, level, assigned, &mut path)?;
    }

    for level in Level::ALL {
        if path.levels.contains_key(&level) {
            continue;
        }
        if let Some((target, _)) = strongest_assignment(graph, id, level) {
            let name = graph.get_node(&target)?.display_name().to_string();
            path.levels.insert(
                level,
                PathStep {
                    id: target,
                    name,
                    assigned: true,
                },
            );
        }
    }

    Ok(path)
}

fn walk_up(
    graph: &FosGraph,
    start: NodeId,
    level: Level,
    assigned: bool,
    path: &mut FosPath,
) -> GraphResult<()> {
    let mut current = start;
    let mut level = level;
    let mut assigned = assigned;
    let mut seen = BTreeSet::new();

    loop {
        if !seen.insert(current.clone()) {
            debug!(node = %current, "cycle in specializes chain");
            break;
        }
        let node = graph.get_node(&current)?;
        path.levels.insert(
            level,
            PathStep {
                id: current.clone(),
                name: node.display_name().to_string(),
                assigned,
            },
        );
        assigned = false;

        let Some(parent_level) = level.parent() else {
            break;
        };
        let parent_edge = match level {
            Level::L6 => Some(EdgeType::InL5),
            other => EdgeType::specializes_from(other),
        };
        let Some(edge_type) = parent_edge else {
            break;
        };

        let parents = graph.targets(&current, edge_type);
        let Some(parent) = parents.first() else {
            break;
        };
        if parents.len() > 1 {
            debug!(node = %current, ?parents, "ambiguous parent, following lowest id");
            path.ambiguous.push(parent_level);
        }
        current = parent.clone();
        level = parent_level;
    }
    Ok(())
}

/// Strongest `in_Lk` target of a node: highest weight, ties by lowest id
pub(crate) fn strongest_assignment(graph: &FosGraph, id: &NodeId, level: Level) -> Option<(NodeId, f64)> {
    let edge_type = EdgeType::assignment(level)?;
    let mut best: Option<(NodeId, f64)> = None;
    for edge in graph.edges_from(id, Some(edge_type)) {
        let weight = edge.weight();
        if best.as_ref().map_or(true, |(_, w)| weight > *w) {
            best = Some((edge.target, weight));
        }
    }
    best
}
