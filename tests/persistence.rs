//! Snapshot, config and export files

mod common;

use common::ingest_fixture;
use fosgraph::taxonomy::{write_json, write_jsonl};
use fosgraph::{
    validate, EngineConfig, FosGraph, GraphStore, IngestSession, JsonStore, Level, NodeId, OpenStore, RoleSet,
    TaxonomyExporter, TaxonomyRecord,
};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

#[test]
fn snapshot_roundtrip_preserves_graph() {
    let (graph, _) = ingest_fixture();
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path().join("graph.json")).unwrap();
    store.save(&graph).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.nodes().len(), graph.nodes().len());
    for (a, b) in graph.nodes().iter().zip(loaded.nodes().iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.roles, b.roles);
        assert_eq!(a.attributes, b.attributes);
        assert_eq!(a.full_names, b.full_names);
    }
    assert_eq!(loaded.edges(), graph.edges());
    assert_eq!(
        fosgraph::resolve_path(&loaded, &"2".into()).unwrap(),
        fosgraph::resolve_path(&graph, &"2".into()).unwrap()
    );
}

#[test]
fn pending_nodes_survive_save_and_load() {
    let (graph, _) = ingest_fixture();
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path().join("graph.json")).unwrap();
    store.save(&graph).unwrap();
    assert!(store.load().unwrap().pending().is_empty());

    let mut session = IngestSession::new(&graph);
    session.ingest_node_rows(Cursor::new("77|stray keyword|is_L6\n"));
    let report = session.finalize();
    assert!(!report.is_clean());
    store.save(&graph).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.pending(), vec![NodeId::from("77")]);
    let validation = validate(&loaded);
    assert_eq!(validation.checked, vec![NodeId::from("77")]);
    assert_eq!(validation.errors().count(), 1);
}

#[test]
fn loading_into_a_populated_graph_merges() {
    let (graph, _) = ingest_fixture();
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path().join("graph.json")).unwrap();
    store.save(&graph).unwrap();

    let other = FosGraph::new();
    let mut session = IngestSession::new(&other);
    session.ingest_node_rows(Cursor::new("id|name|roles\n1|VenueA|L4\n99|Extra|venue\n"));
    session.finalize();

    let summary = store.load_into(&other).unwrap();
    assert_eq!(summary.nodes, 11);
    assert_eq!(other.node_count(), 12);
    let venue = other.get_node(&"1".into()).unwrap();
    assert_eq!(venue.roles, RoleSet::from([fosgraph::Role::Venue, fosgraph::Role::L4]));
}

#[test]
fn config_drives_row_format_and_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "ingest:\n  delimiter: \";\"\n  missing_marker: \"NA\"\nclassify:\n  level: L3\nexport:\n  keyword_delimiter: \" / \"\n",
    )
    .unwrap();
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.classify.level, Level::L3);

    let graph = FosGraph::new();
    let mut session = IngestSession::with_format(&graph, config.ingest.row_format());
    session.ingest_node_rows(Cursor::new(
        "10;Natural Sciences;L1\n20;Computer Science;L2\n30;AI & IP;L3\n\
         40;cluster_40;Graph Mining;NA;L4\n50;topic_50;NA;NA;L5\n61;gnn;is_L6\n62;gnn layers;is_L6\n",
    ));
    session.ingest_edge_rows(Cursor::new(
        "20;10;specializes_L1\n30;20;specializes_L2\n40;30;specializes_L3\n50;40;specializes_L4\n\
         61;50;in_L5;NA\n62;50;in_L5\n",
    ));
    let report = session.finalize();
    assert!(report.is_clean(), "{:?}", report);

    let export = TaxonomyExporter::new(&graph)
        .keyword_delimiter(config.export.keyword_delimiter.clone())
        .export();
    assert_eq!(export.records.len(), 1);
    assert_eq!(export.records[0].level_4, "Graph Mining");
    assert_eq!(export.records[0].level_6, "gnn / gnn layers");
}

#[test]
fn taxonomy_files_parse_back() {
    let (graph, _) = ingest_fixture();
    let export = TaxonomyExporter::new(&graph).export();
    let dir = TempDir::new().unwrap();

    let json_path = dir.path().join("taxonomy.json");
    write_json(&export.records, fs::File::create(&json_path).unwrap()).unwrap();
    let parsed: Vec<TaxonomyRecord> = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed, export.records);

    let jsonl_path = dir.path().join("taxonomy.jsonl");
    write_jsonl(&export.records, fs::File::create(&jsonl_path).unwrap()).unwrap();
    let text = fs::read_to_string(&jsonl_path).unwrap();
    assert_eq!(text.lines().count(), export.records.len());
    let value: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(value["level_1"], "Natural Sciences");
    assert_eq!(value["level_4_id"], "40");
}
