//! Typed, optionally weighted edges

use super::node::{Level, NodeId, Role};
use serde::{Deserialize, Serialize};

/// The fixed relationship set of the FoS taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeType {
    /// Venue cites venue; weight is the citation count
    #[serde(rename = "cites")]
    Cites,
    #[serde(rename = "in_L1")]
    InL1,
    #[serde(rename = "in_L2")]
    InL2,
    #[serde(rename = "in_L3")]
    InL3,
    #[serde(rename = "in_L4")]
    InL4,
    /// Keyword belongs to a topic
    #[serde(rename = "in_L5")]
    InL5,
    #[serde(rename = "specializes_L1")]
    SpecializesL1,
    #[serde(rename = "specializes_L2")]
    SpecializesL2,
    #[serde(rename = "specializes_L3")]
    SpecializesL3,
    #[serde(rename = "specializes_L4")]
    SpecializesL4,
    /// Keyword co-occurrence strength
    #[serde(rename = "weight")]
    Weight,
}

impl EdgeType {
    /// Every edge type, in index order
    pub const ALL: [EdgeType; 11] = [
        EdgeType::Cites,
        EdgeType::InL1,
        EdgeType::InL2,
        EdgeType::InL3,
        EdgeType::InL4,
        EdgeType::InL5,
        EdgeType::SpecializesL1,
        EdgeType::SpecializesL2,
        EdgeType::SpecializesL3,
        EdgeType::SpecializesL4,
        EdgeType::Weight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Cites => "cites",
            EdgeType::InL1 => "in_L1",
            EdgeType::InL2 => "in_L2",
            EdgeType::InL3 => "in_L3",
            EdgeType::InL4 => "in_L4",
            EdgeType::InL5 => "in_L5",
            EdgeType::SpecializesL1 => "specializes_L1",
            EdgeType::SpecializesL2 => "specializes_L2",
            EdgeType::SpecializesL3 => "specializes_L3",
            EdgeType::SpecializesL4 => "specializes_L4",
            EdgeType::Weight => "weight",
        }
    }

    pub fn parse(s: &str) -> Option<EdgeType> {
        EdgeType::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// `in_Lk` edge pointing at a node of `level`
    pub fn assignment(level: Level) -> Option<EdgeType> {
        match level {
            Level::L1 => Some(EdgeType::InL1),
            Level::L2 => Some(EdgeType::InL2),
            Level::L3 => Some(EdgeType::InL3),
            Level::L4 => Some(EdgeType::InL4),
            Level::L5 => Some(EdgeType::InL5),
            Level::L6 => None,
        }
    }

    /// `specializes_Lk` edge leaving a node of `child` level
    pub fn specializes_from(child: Level) -> Option<EdgeType> {
        match child {
            Level::L2 => Some(EdgeType::SpecializesL1),
            Level::L3 => Some(EdgeType::SpecializesL2),
            Level::L4 => Some(EdgeType::SpecializesL3),
            Level::L5 => Some(EdgeType::SpecializesL4),
            Level::L1 | Level::L6 => None,
        }
    }

    /// Level of the target node for `in_*` and `specializes_*` edges
    pub fn target_level(self) -> Option<Level> {
        match self {
            EdgeType::InL1 | EdgeType::SpecializesL1 => Some(Level::L1),
            EdgeType::InL2 | EdgeType::SpecializesL2 => Some(Level::L2),
            EdgeType::InL3 | EdgeType::SpecializesL3 => Some(Level::L3),
            EdgeType::InL4 | EdgeType::SpecializesL4 => Some(Level::L4),
            EdgeType::InL5 => Some(Level::L5),
            EdgeType::Cites | EdgeType::Weight => None,
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            EdgeType::InL1 | EdgeType::InL2 | EdgeType::InL3 | EdgeType::InL4 | EdgeType::InL5
        )
    }

    pub fn is_specialization(self) -> bool {
        matches!(
            self,
            EdgeType::SpecializesL1
                | EdgeType::SpecializesL2
                | EdgeType::SpecializesL3
                | EdgeType::SpecializesL4
        )
    }

    /// Whether the weight carries meaning for this type (citation count or
    /// co-occurrence strength)
    pub fn is_weighted(self) -> bool {
        matches!(self, EdgeType::Cites | EdgeType::Weight)
    }

    /// Role the source endpoint must hold
    pub fn source_role(self) -> Role {
        match self {
            EdgeType::Cites
            | EdgeType::InL1
            | EdgeType::InL2
            | EdgeType::InL3
            | EdgeType::InL4 => Role::Venue,
            EdgeType::InL5 | EdgeType::Weight => Role::IsL6,
            EdgeType::SpecializesL1 => Role::L2,
            EdgeType::SpecializesL2 => Role::L3,
            EdgeType::SpecializesL3 => Role::L4,
            EdgeType::SpecializesL4 => Role::L5,
        }
    }

    /// Role the target endpoint must hold
    pub fn target_role(self) -> Role {
        match self {
            EdgeType::Cites => Role::Venue,
            EdgeType::Weight => Role::IsL6,
            other => other.target_level().map(Level::role).unwrap_or(Role::Venue),
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::parse(s).ok_or_else(|| format!("unknown edge type '{}'", s))
    }
}

/// Deduplication key of an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
    pub edge_type: EdgeType,
}

impl EdgeKey {
    pub fn new(source: NodeId, target: NodeId, edge_type: EdgeType) -> Self {
        Self {
            source,
            target,
            edge_type,
        }
    }
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-[{}]->{}", self.source, self.edge_type, self.target)
    }
}

/// A directed, typed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Relationship type
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Citation count, co-occurrence strength or assignment strength
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, edge_type: EdgeType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Weight with the 1.0 default applied
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source.clone(), self.target.clone(), self.edge_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_type_names_round_trip() {
        for t in EdgeType::ALL {
            assert_eq!(EdgeType::parse(t.as_str()), Some(t));
        }
        assert_eq!(EdgeType::parse("in_L6"), None);
    }

    #[test]
    fn role_constraints_follow_taxonomy() {
        assert_eq!(EdgeType::InL5.source_role(), Role::IsL6);
        assert_eq!(EdgeType::InL5.target_role(), Role::L5);
        assert_eq!(EdgeType::SpecializesL4.source_role(), Role::L5);
        assert_eq!(EdgeType::SpecializesL4.target_role(), Role::L4);
        assert_eq!(EdgeType::InL3.source_role(), Role::Venue);
        assert_eq!(EdgeType::InL3.target_role(), Role::L3);
        assert_eq!(EdgeType::Weight.target_role(), Role::IsL6);
    }

    #[test]
    fn specializes_maps_child_to_parent_level() {
        assert_eq!(EdgeType::specializes_from(Level::L2), Some(EdgeType::SpecializesL1));
        assert_eq!(EdgeType::specializes_from(Level::L1), None);
        assert_eq!(EdgeType::SpecializesL3.target_level(), Some(Level::L3));
    }

    #[test]
    fn missing_weight_defaults_to_one() {
        let edge = Edge::new("1", "2", EdgeType::InL3);
        assert_eq!(edge.weight(), 1.0);
        assert_eq!(edge.with_weight(5.0).weight(), 5.0);
    }
}
