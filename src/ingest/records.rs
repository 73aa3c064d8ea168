//! Ingestion records and the delimited row format of the upstream exporter
//!
//! Node rows are `id|name|roles` or `id|name|L4_name|L5_name|roles`, full-name
//! rows `id|full_name` and edge rows `source|target|type[|weight]`. Roles are
//! colon-separated tokens. A header row and blank lines are skipped.

use crate::graph::{attr, Attributes, EdgeType, NodeId, PropertyValue, Role, RoleSet};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use thiserror::Error;

/// Why a record could not be applied
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MalformedKind {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: &'static str, found: usize },

    #[error("empty {field} field")]
    EmptyField { field: &'static str },

    #[error("no roles given")]
    NoRoles,

    #[error("unknown role token '{token}'")]
    UnknownRole { token: String },

    #[error("unknown edge type '{token}'")]
    UnknownEdgeType { token: String },

    #[error("invalid weight '{value}'")]
    InvalidWeight { value: String },

    #[error("unreadable row: {message}")]
    Unreadable { message: String },
}

/// A malformed record, located by its 1-based row in the batch
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("row {row}: {kind}")]
pub struct RecordError {
    pub row: usize,
    pub kind: MalformedKind,
}

impl RecordError {
    pub fn new(row: usize, kind: MalformedKind) -> Self {
        Self { row, kind }
    }
}

/// A node to merge into the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Caller-assigned id; derived from the name when absent
    pub id: Option<NodeId>,
    pub name: String,
    pub roles: RoleSet,
    #[serde(default)]
    pub attributes: Attributes,
}

impl NodeRecord {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, roles: impl Into<RoleSet>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            roles: roles.into(),
            attributes: Attributes::new(),
        }
    }

    /// A record without an id; the engine derives one from the name
    pub fn named(name: impl Into<String>, roles: impl Into<RoleSet>) -> Self {
        Self {
            id: None,
            name: name.into(),
            roles: roles.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The id this record merges into
    pub fn resolved_id(&self) -> NodeId {
        self.id.clone().unwrap_or_else(|| NodeId::from_name(&self.name))
    }

    pub(crate) fn check(&self, row: usize) -> Result<(), RecordError> {
        if self.id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "id" }));
        }
        if self.name.trim().is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "name" }));
        }
        if self.roles.is_empty() {
            return Err(RecordError::new(row, MalformedKind::NoRoles));
        }
        Ok(())
    }
}

/// An alternate full name for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullNameRecord {
    pub id: NodeId,
    pub full_name: String,
}

impl FullNameRecord {
    pub fn new(id: impl Into<NodeId>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
        }
    }

    pub(crate) fn check(&self, row: usize) -> Result<(), RecordError> {
        if self.id.as_str().trim().is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "id" }));
        }
        if self.full_name.trim().is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "full_name" }));
        }
        Ok(())
    }
}

/// A typed edge to merge into the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl EdgeRecord {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, edge_type: EdgeType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
            weight: None,
        }
    }

    pub fn weighted(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        edge_type: EdgeType,
        weight: f64,
    ) -> Self {
        Self::new(source, target, edge_type).with_weight(weight)
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub(crate) fn check(&self, row: usize) -> Result<(), RecordError> {
        if self.source.as_str().trim().is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "source" }));
        }
        if self.target.as_str().trim().is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "target" }));
        }
        if let Some(w) = self.weight {
            if !w.is_finite() || w < 0.0 {
                return Err(RecordError::new(row, MalformedKind::InvalidWeight { value: w.to_string() }));
            }
        }
        Ok(())
    }
}

/// Delimited row format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFormat {
    /// Column delimiter
    pub delimiter: char,
    /// Placeholder for an absent optional column
    pub missing_marker: String,
}

impl Default for RowFormat {
    fn default() -> Self {
        Self {
            delimiter: '|',
            missing_marker: "-".to_string(),
        }
    }
}

impl RowFormat {
    /// Lazily read data rows, numbered by their line in the input
    ///
    /// Blank lines and a leading header row are skipped.
    pub fn rows<R: BufRead>(&self, reader: R) -> impl Iterator<Item = Result<(usize, String), RecordError>> {
        let delimiter = self.delimiter;
        reader
            .lines()
            .enumerate()
            .map(|(i, line)| {
                line.map(|l| (i + 1, l))
                    .map_err(|e| RecordError::new(i + 1, MalformedKind::Unreadable { message: e.to_string() }))
            })
            .filter(move |row| match row {
                Ok((n, line)) => !line.trim().is_empty() && !(*n == 1 && is_header(line, delimiter)),
                Err(_) => true,
            })
    }

    fn columns<'a>(&self, line: &'a str) -> Vec<&'a str> {
        line.split(self.delimiter).map(str::trim).collect()
    }

    fn optional<'a>(&self, value: &'a str) -> Option<&'a str> {
        if value.is_empty() || value == self.missing_marker {
            None
        } else {
            Some(value)
        }
    }

    /// Parse `id|name|roles` or `id|name|L4_name|L5_name|roles`
    pub fn parse_node(&self, row: usize, line: &str) -> Result<NodeRecord, RecordError> {
        let cols = self.columns(line);
        let (id, name, l4_name, l5_name, roles) = match cols.as_slice() {
            [id, name, roles] => (*id, *name, None, None, *roles),
            [id, name, l4, l5, roles] => (*id, *name, self.optional(l4), self.optional(l5), *roles),
            _ => {
                return Err(RecordError::new(
                    row,
                    MalformedKind::ColumnCount {
                        expected: "3 or 5",
                        found: cols.len(),
                    },
                ))
            }
        };

        let roles = parse_roles(roles).map_err(|kind| RecordError::new(row, kind))?;
        let mut record = NodeRecord {
            id: self.optional(id).map(NodeId::from),
            name: name.to_string(),
            roles,
            attributes: Attributes::new(),
        };
        if let Some(l4) = l4_name {
            record.attributes.insert(attr::L4_NAME.to_string(), l4.into());
        }
        if let Some(l5) = l5_name {
            record.attributes.insert(attr::L5_NAME.to_string(), l5.into());
        }
        record.check(row)?;
        Ok(record)
    }

    /// Parse `id|full_name`; the full name may itself contain the delimiter
    pub fn parse_full_name(&self, row: usize, line: &str) -> Result<FullNameRecord, RecordError> {
        let Some((id, full_name)) = line.split_once(self.delimiter) else {
            return Err(RecordError::new(
                row,
                MalformedKind::ColumnCount {
                    expected: "2",
                    found: 1,
                },
            ));
        };
        let id = id.trim();
        if id.is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "id" }));
        }
        let record = FullNameRecord::new(id, full_name.trim());
        record.check(row)?;
        Ok(record)
    }

    /// Parse `source|target|type` or `source|target|type|weight`
    pub fn parse_edge(&self, row: usize, line: &str) -> Result<EdgeRecord, RecordError> {
        let cols = self.columns(line);
        let (source, target, ty, weight) = match cols.as_slice() {
            [s, t, ty] => (*s, *t, *ty, None),
            [s, t, ty, w] => (*s, *t, *ty, self.optional(w)),
            _ => {
                return Err(RecordError::new(
                    row,
                    MalformedKind::ColumnCount {
                        expected: "3 or 4",
                        found: cols.len(),
                    },
                ))
            }
        };
        if source.is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "source" }));
        }
        if target.is_empty() {
            return Err(RecordError::new(row, MalformedKind::EmptyField { field: "target" }));
        }
        let edge_type = EdgeType::parse(ty)
            .ok_or_else(|| RecordError::new(row, MalformedKind::UnknownEdgeType { token: ty.to_string() }))?;
        let weight = weight
            .map(|w| {
                w.parse::<f64>()
                    .map_err(|_| RecordError::new(row, MalformedKind::InvalidWeight { value: w.to_string() }))
            })
            .transpose()?;

        let record = EdgeRecord {
            source: source.into(),
            target: target.into(),
            edge_type,
            weight,
        };
        record.check(row)?;
        Ok(record)
    }
}

/// Parse colon-separated role tokens
pub fn parse_roles(tokens: &str) -> Result<RoleSet, MalformedKind> {
    let mut roles = RoleSet::new();
    for token in tokens.split(':').map(str::trim).filter(|t| !t.is_empty()) {
        let role = Role::from_token(token).ok_or_else(|| MalformedKind::UnknownRole { token: token.to_string() })?;
        roles.insert(role);
    }
    if roles.is_empty() {
        return Err(MalformedKind::NoRoles);
    }
    Ok(roles)
}

fn is_header(line: &str, delimiter: char) -> bool {
    let first = line.split(delimiter).next().unwrap_or("").trim();
    first == "id" || first == "source" || first == "abbreviation"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_three_column_node_row() {
        let record = RowFormat::default().parse_node(2, "4|Venue C|venue:L3:is_L6").unwrap();
        assert_eq!(record.id, Some(NodeId::from("4")));
        assert_eq!(record.name, "Venue C");
        assert_eq!(record.roles, RoleSet::from([Role::Venue, Role::L3, Role::IsL6]));
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn parses_five_column_node_row_with_display_names() {
        let format = RowFormat::default();
        let record = format.parse_node(3, "17|cluster_17|Graph Mining|-|L4").unwrap();
        assert_eq!(record.attributes.get(attr::L4_NAME), Some(&PropertyValue::from("Graph Mining")));
        assert!(record.attributes.get(attr::L5_NAME).is_none());
    }

    #[test]
    fn missing_id_is_derived_from_name() {
        let record = RowFormat::default().parse_node(1, "-|NeurIPS|venue").unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.resolved_id(), NodeId::from_name("NeurIPS"));
    }

    #[test]
    fn rejects_unknown_role_token() {
        let err = RowFormat::default().parse_node(5, "1|A|venue:L7").unwrap_err();
        assert_eq!(err.row, 5);
        assert_eq!(err.kind, MalformedKind::UnknownRole { token: "L7".into() });
    }

    #[test]
    fn rejects_wrong_column_count() {
        let err = RowFormat::default().parse_node(1, "1|A").unwrap_err();
        assert!(matches!(err.kind, MalformedKind::ColumnCount { found: 2, .. }));
    }

    #[test]
    fn parses_edge_rows_with_and_without_weight() {
        let format = RowFormat::default();
        let weighted = format.parse_edge(1, "1|3|cites|5").unwrap();
        assert_eq!(weighted.edge_type, EdgeType::Cites);
        assert_eq!(weighted.weight, Some(5.0));

        let plain = format.parse_edge(2, "20|10|specializes_L1").unwrap();
        assert_eq!(plain.weight, None);

        let marker = format.parse_edge(3, "20|10|specializes_L1|-").unwrap();
        assert_eq!(marker.weight, None);
    }

    #[test]
    fn rejects_bad_edge_fields() {
        let format = RowFormat::default();
        assert_eq!(
            format.parse_edge(1, "1|3|links_to").unwrap_err().kind,
            MalformedKind::UnknownEdgeType { token: "links_to".into() }
        );
        assert_eq!(
            format.parse_edge(2, "1|3|cites|lots").unwrap_err().kind,
            MalformedKind::InvalidWeight { value: "lots".into() }
        );
        assert_eq!(
            format.parse_edge(3, "1|3|cites|-2").unwrap_err().kind,
            MalformedKind::InvalidWeight { value: "-2".into() }
        );
        assert_eq!(
            format.parse_edge(4, "|3|cites").unwrap_err().kind,
            MalformedKind::EmptyField { field: "source" }
        );
    }

    #[test]
    fn full_name_keeps_embedded_delimiters() {
        let record = RowFormat::default()
            .parse_full_name(1, "12|Proceedings | Workshop on Graphs")
            .unwrap();
        assert_eq!(record.id, NodeId::from("12"));
        assert_eq!(record.full_name, "Proceedings | Workshop on Graphs");
    }

    #[test]
    fn rows_skip_header_and_blank_lines() {
        let input = "id|name|roles\n1|A|venue\n\n2|B|venue\n";
        let rows: Vec<_> = RowFormat::default()
            .rows(Cursor::new(input))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows, vec![(2, "1|A|venue".to_string()), (4, "2|B|venue".to_string())]);
    }

    #[test]
    fn custom_delimiter() {
        let format = RowFormat {
            delimiter: ',',
            missing_marker: "".into(),
        };
        let record = format.parse_edge(1, "1,2,in_L3,").unwrap();
        assert_eq!(record.edge_type, EdgeType::InL3);
        assert_eq!(record.weight, None);
    }

    #[test]
    fn typed_records_reject_empty_ids() {
        let node = NodeRecord::new(" ", "Venue A", RoleSet::from([Role::Venue]));
        assert_eq!(node.check(1).unwrap_err().kind, MalformedKind::EmptyField { field: "id" });

        let edge = EdgeRecord::new("", "4", EdgeType::InL4);
        assert_eq!(edge.check(2).unwrap_err().kind, MalformedKind::EmptyField { field: "source" });
        let edge = EdgeRecord::new("1", "", EdgeType::InL4);
        assert_eq!(edge.check(3).unwrap_err().kind, MalformedKind::EmptyField { field: "target" });

        let full_name = FullNameRecord::new("", "Venue A Long");
        assert_eq!(full_name.check(4).unwrap_err().kind, MalformedKind::EmptyField { field: "id" });

        assert!(EdgeRecord::new("1", "4", EdgeType::InL4).check(5).is_ok());
    }
}
