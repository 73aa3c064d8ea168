//! Annotation coverage and per-field venue listings

use super::types::{Coverage, VenueAssignment};
use crate::graph::{EdgeType, FosGraph, GraphResult, NodeId, Role};

/// Share of nodes holding `role` that have at least one outgoing `edge_type` edge
pub fn annotation_coverage(graph: &FosGraph, role: Role, edge_type: EdgeType) -> Coverage {
    let ids = graph.nodes_with_role(role);
    let annotated = ids
        .iter()
        .filter(|id| !graph.targets(id, edge_type).is_empty())
        .count();
    Coverage::new(ids.len(), annotated)
}

/// Venues assigned to a FoS node through `in_Lk` edges, strongest first
pub fn venues_in_fos(graph: &FosGraph, fos: &NodeId) -> GraphResult<Vec<VenueAssignment>> {
    graph.get_node(fos)?;

    let mut venues: Vec<VenueAssignment> = graph
        .edges_to(fos, None)
        .into_iter()
        .filter(|e| e.edge_type.is_assignment())
        .filter_map(|e| {
            let weight = e.weight();
            let node = graph.get_node(&e.source).ok().filter(|n| n.is_venue())?;
            Some(VenueAssignment {
                venue: node.id,
                name: node.name,
                full_names: node.full_names.into_iter().collect(),
                weight,
            })
        })
        .collect();
    venues.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.venue.cmp(&b.venue)));
    Ok(venues)
}
