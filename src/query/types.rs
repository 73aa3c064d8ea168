//! Query result structures

use super::budget::Cutoff;
use crate::graph::{Level, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One resolved level of a FoS path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStep {
    pub id: NodeId,
    pub name: String,
    /// Taken from the node's own `in_Lk` edge rather than reached by walking up
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub assigned: bool,
}

/// Result of resolving a node's chain of FoS ancestors
///
/// Levels that could not be resolved are absent; a partial path is a valid
/// result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FosPath {
    /// Node the path was resolved for
    pub origin: NodeId,
    pub levels: BTreeMap<Level, PathStep>,
    /// Levels where several parents existed and the lowest id was followed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ambiguous: Vec<Level>,
}

impl FosPath {
    pub fn new(origin: NodeId) -> Self {
        Self {
            origin,
            levels: BTreeMap::new(),
            ambiguous: Vec::new(),
        }
    }

    pub fn get(&self, level: Level) -> Option<&PathStep> {
        self.levels.get(&level)
    }

    /// Display name at a level
    pub fn name_at(&self, level: Level) -> Option<&str> {
        self.get(level).map(|s| s.name.as_str())
    }

    pub fn id_at(&self, level: Level) -> Option<&NodeId> {
        self.get(level).map(|s| &s.id)
    }

    /// Whether every level from L1 down to `level` is present
    pub fn is_complete_to(&self, level: Level) -> bool {
        Level::ALL
            .iter()
            .take_while(|l| **l <= level)
            .all(|l| self.levels.contains_key(l))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous.is_empty()
    }
}

/// Where a classification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The venue's own assignment edges
    Direct,
    /// Propagated from labeled citation neighbors
    Citation,
}

/// A label with its normalized score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: NodeId,
    pub name: String,
    pub score: f64,
}

/// Label distribution for a venue at one level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub venue: NodeId,
    pub level: Level,
    pub origin: Origin,
    /// Descending score, ties by label id
    pub scores: Vec<LabelScore>,
    /// Citation neighbors reached
    pub reached: usize,
    /// Propagation stopped early; see `cutoff`
    pub partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<Cutoff>,
}

impl Classification {
    pub fn top(&self) -> Option<&LabelScore> {
        self.scores.first()
    }

    pub fn score_of(&self, label: &NodeId) -> Option<f64> {
        self.scores.iter().find(|s| &s.label == label).map(|s| s.score)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// A co-occurring keyword
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordNeighbor {
    pub keyword: NodeId,
    pub name: String,
    pub weight: f64,
}

/// How many nodes of a role carry an edge of a type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coverage {
    pub total: usize,
    pub annotated: usize,
    pub ratio: f64,
}

impl Coverage {
    pub fn new(total: usize, annotated: usize) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            annotated as f64 / total as f64
        };
        Self { total, annotated, ratio }
    }
}

/// A venue assigned to a FoS node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueAssignment {
    pub venue: NodeId,
    pub name: String,
    pub full_names: Vec<String>,
    pub weight: f64,
}
