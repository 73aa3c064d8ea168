//! Node representation in the FoS graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Namespace for ids derived from node names when a record carries none.
const NAME_NAMESPACE: Uuid = Uuid::from_u128(0x6f05_2a1e_8c3d_4b7a_9e21_5d4c_3b2a_1908);

/// Unique identifier for a node
///
/// Serializes as a plain string. Ordering is numeric-aware so that the
/// integer ids produced by the upstream exporter sort as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id for a node first seen by name only
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&NAME_NAMESPACE, name.as_bytes()).to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for NodeId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// A level of the FoS hierarchy, L1 broadest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
}

impl Level {
    pub const ALL: [Level; 6] = [Level::L1, Level::L2, Level::L3, Level::L4, Level::L5, Level::L6];

    /// 1-based depth of the level
    pub fn depth(self) -> u8 {
        match self {
            Level::L1 => 1,
            Level::L2 => 2,
            Level::L3 => 3,
            Level::L4 => 4,
            Level::L5 => 5,
            Level::L6 => 6,
        }
    }

    pub fn from_depth(depth: u8) -> Option<Level> {
        match depth {
            1 => Some(Level::L1),
            2 => Some(Level::L2),
            3 => Some(Level::L3),
            4 => Some(Level::L4),
            5 => Some(Level::L5),
            6 => Some(Level::L6),
            _ => None,
        }
    }

    /// The next broader level, `None` for L1
    pub fn parent(self) -> Option<Level> {
        Level::from_depth(self.depth() - 1)
    }

    /// The role a node at this level carries
    pub fn role(self) -> Role {
        match self {
            Level::L1 => Role::L1,
            Level::L2 => Role::L2,
            Level::L3 => Role::L3,
            Level::L4 => Role::L4,
            Level::L5 => Role::L5,
            Level::L6 => Role::IsL6,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.depth())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(['L', 'l'])
            .and_then(|d| d.parse::<u8>().ok())
            .and_then(Level::from_depth)
            .ok_or_else(|| format!("unknown level '{}'", s))
    }
}

/// A role a node can hold; a node may hold several at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "venue")]
    Venue,
    L1,
    L2,
    L3,
    L4,
    L5,
    #[serde(rename = "is_L6")]
    IsL6,
}

impl Role {
    /// The hierarchy level this role places a node at, `None` for venues
    pub fn level(self) -> Option<Level> {
        match self {
            Role::Venue => None,
            Role::L1 => Some(Level::L1),
            Role::L2 => Some(Level::L2),
            Role::L3 => Some(Level::L3),
            Role::L4 => Some(Level::L4),
            Role::L5 => Some(Level::L5),
            Role::IsL6 => Some(Level::L6),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Role::Venue => "venue",
            Role::L1 => "L1",
            Role::L2 => "L2",
            Role::L3 => "L3",
            Role::L4 => "L4",
            Role::L5 => "L5",
            Role::IsL6 => "is_L6",
        }
    }

    /// Parse a single role token as written by the upstream exporter
    pub fn from_token(token: &str) -> Option<Role> {
        match token {
            "venue" => Some(Role::Venue),
            "L1" => Some(Role::L1),
            "L2" => Some(Role::L2),
            "L3" => Some(Role::L3),
            "L4" => Some(Role::L4),
            "L5" => Some(Role::L5),
            "is_L6" => Some(Role::IsL6),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Set of roles held by one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    /// Union `other` into this set, returning true if anything was added
    pub fn merge(&mut self, other: &RoleSet) -> bool {
        let before = self.0.len();
        self.0.extend(other.0.iter().copied());
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// FoS levels held, broadest first
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.0.iter().filter_map(|r| r.level())
    }

    /// Deepest FoS level held, if any
    pub fn deepest_level(&self) -> Option<Level> {
        self.levels().max()
    }

    /// Colon-joined role tokens, the inverse of record parsing
    pub fn to_tokens(&self) -> String {
        self.0.iter().map(|r| r.token()).collect::<Vec<_>>().join(":")
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

/// Role-specific attributes, ordered for stable serialization
pub type Attributes = BTreeMap<String, PropertyValue>;

/// Well-known attribute keys
pub mod attr {
    /// Display name of an L4 cluster
    pub const L4_NAME: &str = "l4_name";
    /// Display name of an L5 topic
    pub const L5_NAME: &str = "l5_name";
    /// Id of the L5 topic an `is_L6` keyword originates from
    pub const L5_TOPIC: &str = "l5_topic";
}

/// Node metadata, not part of graph-state equality
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// When the node was first ingested
    pub created_at: Option<DateTime<Utc>>,
    /// When the node was last merged
    pub modified_at: Option<DateTime<Utc>>,
}

/// A node in the FoS graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Venue name or FoS label
    pub name: String,
    /// Roles held by this node
    pub roles: RoleSet,
    /// Role-specific attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Alternate full names (venues)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub full_names: BTreeSet<String>,
    /// Node metadata
    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl Node {
    /// Create a new node
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, roles: RoleSet) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            roles,
            attributes: Attributes::new(),
            full_names: BTreeSet::new(),
            metadata: NodeMetadata {
                created_at: Some(now),
                modified_at: Some(now),
            },
        }
    }

    /// Add an attribute to the node
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_venue(&self) -> bool {
        self.roles.contains(Role::Venue)
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(PropertyValue::as_str)
    }

    /// Display name for L4/L5 nodes, falling back to `name`
    pub fn display_name(&self) -> &str {
        self.attribute_str(attr::L5_NAME)
            .or_else(|| self.attribute_str(attr::L4_NAME))
            .unwrap_or(&self.name)
    }

    /// Merge a re-ingested record into this node: roles are unioned,
    /// attributes and name are last-write-wins. Returns true if anything changed.
    pub(crate) fn merge(&mut self, name: String, roles: &RoleSet, attributes: Attributes) -> bool {
        let mut changed = self.roles.merge(roles);
        if self.name != name {
            self.name = name;
            changed = true;
        }
        for (k, v) in attributes {
            if self.attributes.get(&k) != Some(&v) {
                self.attributes.insert(k, v);
                changed = true;
            }
        }
        if changed {
            self.metadata.modified_at = Some(Utc::now());
        }
        changed
    }
}
