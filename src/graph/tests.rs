//! Serialization tests against the snapshot/export fixtures

use serde_json::{json, Value};

/// Fixture: a venue that is also classified at L3, as written to snapshots
fn venue_node_fixture() -> Value {
    json!({
        "id": "4",
        "name": "Venue C",
        "roles": ["venue", "L3", "is_L6"],
        "attributes": {
            "l5_topic": "812"
        },
        "full_names": ["Venue Center"],
        "metadata": {
            "created_at": "2024-03-01T10:00:00Z"
        }
    })
}

/// Fixture: a citation edge
fn cites_edge_fixture() -> Value {
    json!({
        "source": "1",
        "target": "3",
        "type": "cites",
        "weight": 5.0
    })
}

/// Fixture: an unweighted hierarchy edge
fn specializes_edge_fixture() -> Value {
    json!({
        "source": "20",
        "target": "10",
        "type": "specializes_L1"
    })
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::graph::{attr, Edge, EdgeType, Level, Node, NodeId, Role, RoleSet};

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from_string("42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"42\"");
    }

    #[test]
    fn node_id_deserializes_from_string() {
        let id: NodeId = serde_json::from_str("\"venue:acl\"").unwrap();
        assert_eq!(id.as_str(), "venue:acl");
    }

    #[test]
    fn roles_serialize_as_exporter_tokens() {
        let roles = RoleSet::from([Role::IsL6, Role::Venue, Role::L4]);
        let json = serde_json::to_value(&roles).unwrap();
        assert_eq!(json, json!(["venue", "L4", "is_L6"]));
    }

    #[test]
    fn edge_type_serializes_as_exporter_name() {
        let json = serde_json::to_string(&EdgeType::SpecializesL3).unwrap();
        assert_eq!(json, "\"specializes_L3\"");

        let ty: EdgeType = serde_json::from_str("\"in_L5\"").unwrap();
        assert_eq!(ty, EdgeType::InL5);
    }

    #[test]
    fn level_serializes_by_name() {
        assert_eq!(serde_json::to_string(&Level::L4).unwrap(), "\"L4\"");
    }

    #[test]
    fn node_roundtrip() {
        let node = Node::new("7", "topic modelling", RoleSet::from([Role::L5]))
            .with_attribute(attr::L5_NAME, "Topic Models");

        let json = serde_json::to_string(&node).unwrap();
        let node2: Node = serde_json::from_str(&json).unwrap();

        assert_eq!(node.id, node2.id);
        assert_eq!(node.name, node2.name);
        assert_eq!(node.roles, node2.roles);
        assert_eq!(node.attributes, node2.attributes);
    }

    #[test]
    fn edge_roundtrip() {
        let edge = Edge::new("1", "3", EdgeType::Cites).with_weight(5.0);

        let json = serde_json::to_string(&edge).unwrap();
        let edge2: Edge = serde_json::from_str(&json).unwrap();

        assert_eq!(edge, edge2);
    }

    #[test]
    fn can_deserialize_venue_node_fixture() {
        let result: Result<Node, _> = serde_json::from_value(venue_node_fixture());
        assert!(result.is_ok(), "Failed to deserialize node fixture: {:?}", result.err());

        let node = result.unwrap();
        assert_eq!(node.id.as_str(), "4");
        assert!(node.is_venue());
        assert!(node.has_role(Role::L3));
        assert!(node.has_role(Role::IsL6));
        assert_eq!(node.attribute_str(attr::L5_TOPIC), Some("812"));
        assert!(node.full_names.contains("Venue Center"));
    }

    #[test]
    fn can_deserialize_edge_fixtures() {
        let cites: Edge = serde_json::from_value(cites_edge_fixture()).unwrap();
        assert_eq!(cites.edge_type, EdgeType::Cites);
        assert_eq!(cites.weight, Some(5.0));

        let parent: Edge = serde_json::from_value(specializes_edge_fixture()).unwrap();
        assert_eq!(parent.edge_type, EdgeType::SpecializesL1);
        assert_eq!(parent.weight, None);
        assert_eq!(parent.weight(), 1.0);
    }

    #[test]
    fn serialized_edge_omits_absent_weight() {
        let edge = Edge::new("20", "10", EdgeType::SpecializesL1);
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["type"], "specializes_L1");
        assert!(json.get("weight").is_none());
        assert!(json.get("edge_type").is_none());
    }

    #[test]
    fn serialized_node_skips_empty_collections() {
        let node = Node::new("1", "Venue A", RoleSet::from([Role::Venue]));
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["roles"], json!(["venue"]));
        assert!(json.get("attributes").is_none());
        assert!(json.get("full_names").is_none());
        assert!(json["metadata"].is_object());
    }
}
