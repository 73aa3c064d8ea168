//! Keyword co-occurrence neighborhoods

use super::types::KeywordNeighbor;
use crate::graph::{EdgeType, FosGraph, GraphError, GraphResult, NodeId, Role};
use std::collections::BTreeMap;

/// Keywords co-occurring with `id`, strongest first
///
/// `weight` edges are read in both directions; when both exist the larger
/// weight is used. Ties are ordered by keyword id.
pub fn keyword_neighborhood(
    graph: &FosGraph,
    id: &NodeId,
    top_n: Option<usize>,
) -> GraphResult<Vec<KeywordNeighbor>> {
    let node = graph.get_node(id)?;
    if !node.has_role(Role::IsL6) {
        return Err(GraphError::RoleMismatch {
            node: id.clone(),
            expected: Role::IsL6,
        });
    }

    let mut weights: BTreeMap<NodeId, f64> = BTreeMap::new();
    let outgoing = graph
        .edges_from(id, Some(EdgeType::Weight))
        .into_iter()
        .map(|e| (e.target, e.weight.unwrap_or(1.0)));
    let incoming = graph
        .edges_to(id, Some(EdgeType::Weight))
        .into_iter()
        .map(|e| (e.source, e.weight.unwrap_or(1.0)));
    for (neighbor, weight) in outgoing.chain(incoming) {
        if &neighbor == id {
            continue;
        }
        weights
            .entry(neighbor)
            .and_modify(|w| *w = w.max(weight))
            .or_insert(weight);
    }

    let mut neighbors: Vec<KeywordNeighbor> = weights
        .into_iter()
        .map(|(keyword, weight)| KeywordNeighbor {
            name: graph.name_of(&keyword).unwrap_or_default(),
            keyword,
            weight,
        })
        .collect();
    neighbors.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.keyword.cmp(&b.keyword)));
    if let Some(n) = top_n {
        neighbors.truncate(n);
    }
    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Attributes, RoleSet};

    fn keywords() -> FosGraph {
        let g = FosGraph::new();
        for (id, name) in [("1", "gnn"), ("2", "message passing"), ("3", "attention"), ("4", "pooling")] {
            g.upsert_node(id.into(), name, RoleSet::from([Role::IsL6]), Attributes::new());
        }
        g.upsert_edge(&"1".into(), &"2".into(), EdgeType::Weight, Some(3.0)).unwrap();
        g.upsert_edge(&"2".into(), &"1".into(), EdgeType::Weight, Some(7.0)).unwrap();
        g.upsert_edge(&"3".into(), &"1".into(), EdgeType::Weight, Some(2.0)).unwrap();
        g.upsert_edge(&"1".into(), &"4".into(), EdgeType::Weight, Some(2.0)).unwrap();
        g
    }

    #[test]
    fn both_directions_use_the_larger_weight() {
        let g = keywords();
        let n = keyword_neighborhood(&g, &"1".into(), None).unwrap();

        let ids: Vec<&str> = n.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
        assert_eq!(n[0].weight, 7.0);
        assert_eq!(n[0].name, "message passing");
    }

    #[test]
    fn top_n_limits_result() {
        let g = keywords();
        let n = keyword_neighborhood(&g, &"1".into(), Some(1)).unwrap();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].keyword, NodeId::from("2"));
    }

    #[test]
    fn non_keyword_is_role_mismatch() {
        let g = keywords();
        g.upsert_node("9".into(), "Venue", RoleSet::from([Role::Venue]), Attributes::new());
        assert_eq!(
            keyword_neighborhood(&g, &"9".into(), None).unwrap_err(),
            GraphError::RoleMismatch {
                node: "9".into(),
                expected: Role::IsL6
            }
        );
    }

    #[test]
    fn unknown_keyword_is_not_found() {
        let g = keywords();
        assert!(matches!(
            keyword_neighborhood(&g, &"404".into(), None),
            Err(GraphError::NodeNotFound(_))
        ));
    }
}
