//! Concurrent ingestion sessions over one shared graph

mod common;

use common::{ingest_fixture, GraphBuilder};
use fosgraph::{
    resolve_path, validate_all, EdgeRecord, EdgeType, FosGraph, IngestSession, Level, NodeId, NodeRecord,
    Role, RoleSet,
};
use std::sync::Arc;
use std::thread;

#[test]
fn overlapping_sessions_merge_to_the_union() {
    let graph = FosGraph::new();
    let role_sets = [
        vec![Role::Venue],
        vec![Role::L3],
        vec![Role::IsL6],
        vec![Role::Venue, Role::L4],
    ];

    thread::scope(|s| {
        for roles in &role_sets {
            let graph = &graph;
            s.spawn(move || {
                let mut session = IngestSession::new(graph);
                for round in 0..50 {
                    let records: Vec<NodeRecord> = (0..20)
                        .map(|i| {
                            let roles: RoleSet = roles.iter().copied().collect();
                            NodeRecord::new(i.to_string(), format!("node {}", i), roles)
                        })
                        .collect();
                    let report = session.ingest_nodes(records);
                    assert!(report.is_clean(), "round {}", round);
                }
                session.finalize();
            });
        }
    });

    assert_eq!(graph.node_count(), 20);
    let union = RoleSet::from([Role::Venue, Role::L3, Role::L4, Role::IsL6]);
    for node in graph.nodes() {
        assert_eq!(node.roles, union, "roles of {}", node.id);
    }
    for role in [Role::Venue, Role::L3, Role::L4, Role::IsL6] {
        assert_eq!(graph.nodes_with_role(role).len(), 20);
    }
}

#[test]
fn concurrent_edge_batches_deduplicate() {
    let graph = Arc::new(FosGraph::new());
    let nodes: Vec<NodeRecord> = (0..30)
        .map(|i| NodeRecord::new(i.to_string(), format!("Venue {}", i), RoleSet::from([Role::Venue])))
        .collect();
    let mut setup = IngestSession::new(&graph);
    setup.ingest_nodes(nodes);
    setup.finalize();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                let mut session = IngestSession::new(&graph);
                let edges: Vec<EdgeRecord> = (0..29u64)
                    .map(|i| EdgeRecord::weighted(i, i + 1, EdgeType::Cites, 1.0 + worker as f64))
                    .collect();
                session.ingest_edges(edges);
                session.finalize()
            })
        })
        .collect();
    for handle in handles {
        let report = handle.join().unwrap();
        assert!(report.dangling.is_empty());
    }

    assert_eq!(graph.edge_count(), 29);
    for i in 0..29u64 {
        let edge = graph
            .get_edge(&NodeId::from(i), &NodeId::from(i + 1), EdgeType::Cites)
            .unwrap();
        let w = edge.weight.unwrap();
        assert!((1.0..=4.0).contains(&w) && w.fract() == 0.0, "weight {} is one of the written values", w);
        assert_eq!(graph.targets(&NodeId::from(i), EdgeType::Cites), vec![NodeId::from(i + 1)]);
    }
}

#[test]
fn edges_resolve_against_nodes_from_another_session() {
    let graph = FosGraph::new();

    thread::scope(|s| {
        s.spawn(|| {
            let mut session = IngestSession::new(&graph);
            session.ingest_edges(vec![EdgeRecord::new("1", "2", EdgeType::InL3)]);
            // keep retrying until the other session's nodes land
            while session.queued() > 0 {
                session.ingest_nodes(Vec::new());
                thread::yield_now();
            }
            session.finalize();
        });
        s.spawn(|| {
            GraphBuilder::new()
                .venue("1", "VenueA")
                .node("2", "AI & IP", &[Role::L3])
                .apply(&graph);
        });
    });

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(resolve_path(&graph, &"1".into()).unwrap().name_at(Level::L3), Some("AI & IP"));
}

#[test]
fn readers_see_whole_nodes_during_writes() {
    let (graph, _) = ingest_fixture();
    let graph = &graph;

    thread::scope(|s| {
        s.spawn(move || {
            for round in 0..200 {
                let mut session = IngestSession::new(graph);
                session.ingest_nodes(vec![
                    NodeRecord::new("40", "cluster_40", RoleSet::from([Role::L4]))
                        .with_attribute("round", round.to_string()),
                ]);
                session.finalize();
            }
        });
        s.spawn(move || {
            for _ in 0..200 {
                let node = graph.get_node(&"40".into()).unwrap();
                assert!(node.has_role(Role::L4));
                assert_eq!(node.display_name(), "Graph Mining");
                let path = resolve_path(graph, &"61".into()).unwrap();
                assert!(path.is_complete_to(Level::L6));
            }
        });
    });

    assert!(validate_all(graph).is_clean());
}
