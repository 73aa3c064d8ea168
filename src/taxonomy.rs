//! Taxonomy export: one flat record per L5 topic
//!
//! Each record carries the names of the topic's L1..L4 ancestors, the topic
//! itself and its keywords. Topics whose chain does not reach L1 are skipped
//! and counted.

use crate::graph::{attr, EdgeType, FosGraph, Level, Node, NodeId, Role};
use crate::query::resolve_path;
use crate::storage::StorageResult;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info};

/// Default separator between keyword names in `level_6`
pub const DEFAULT_KEYWORD_DELIMITER: &str = ", ";

/// One row of the exported taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    pub level_1: String,
    pub level_2: String,
    pub level_3: String,
    pub level_4: String,
    pub level_4_id: NodeId,
    pub level_5: String,
    pub level_5_id: NodeId,
    /// Keyword names ordered by keyword id
    pub level_6: String,
    pub level_5_name: String,
}

/// Supplies a human-readable name for a topic that has none recorded
pub trait TopicNamer {
    fn name_topic(&self, topic: &Node, keywords: &[String]) -> Option<String>;
}

impl<F> TopicNamer for F
where
    F: Fn(&Node, &[String]) -> Option<String>,
{
    fn name_topic(&self, topic: &Node, keywords: &[String]) -> Option<String> {
        self(topic, keywords)
    }
}

/// Result of an export run
#[derive(Debug, Clone, Default)]
pub struct TaxonomyExport {
    pub records: Vec<TaxonomyRecord>,
    /// Topics whose chain did not resolve to L1
    pub skipped: Vec<NodeId>,
}

/// Builds taxonomy records from a graph
pub struct TaxonomyExporter<'a> {
    graph: &'a FosGraph,
    keyword_delimiter: String,
    namer: Option<&'a dyn TopicNamer>,
}

impl<'a> TaxonomyExporter<'a> {
    pub fn new(graph: &'a FosGraph) -> Self {
        Self {
            graph,
            keyword_delimiter: DEFAULT_KEYWORD_DELIMITER.to_string(),
            namer: None,
        }
    }

    pub fn keyword_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.keyword_delimiter = delimiter.into();
        self
    }

    pub fn namer(mut self, namer: &'a dyn TopicNamer) -> Self {
        self.namer = Some(namer);
        self
    }

    /// Export every L5 topic, ordered by topic id
    pub fn export(&self) -> TaxonomyExport {
        let mut export = TaxonomyExport::default();
        for topic in self.graph.nodes_with_role(Role::L5) {
            match self.record_for(&topic) {
                Some(record) => export.records.push(record),
                None => {
                    debug!(%topic, "topic does not resolve to a single L1 chain, skipped");
                    export.skipped.push(topic);
                }
            }
        }
        info!(
            records = export.records.len(),
            skipped = export.skipped.len(),
            "taxonomy exported"
        );
        export
    }

    fn record_for(&self, topic_id: &NodeId) -> Option<TaxonomyRecord> {
        let topic = self.graph.get_node(topic_id).ok()?;
        let path = resolve_path(self.graph, topic_id).ok()?;
        if !path.is_complete_to(Level::L5) || path.is_ambiguous() {
            return None;
        }
        let l4 = path.get(Level::L4)?;

        let keywords: Vec<String> = self
            .graph
            .sources(topic_id, EdgeType::InL5)
            .iter()
            .filter_map(|k| self.graph.name_of(k))
            .collect();

        let level_5_name = topic
            .attribute_str(attr::L5_NAME)
            .map(str::to_string)
            .or_else(|| self.namer.and_then(|n| n.name_topic(&topic, &keywords)))
            .unwrap_or_default();

        Some(TaxonomyRecord {
            level_1: path.name_at(Level::L1)?.to_string(),
            level_2: path.name_at(Level::L2)?.to_string(),
            level_3: path.name_at(Level::L3)?.to_string(),
            level_4: l4.name.clone(),
            level_4_id: l4.id.clone(),
            level_5: topic.name.clone(),
            level_5_id: topic_id.clone(),
            level_6: keywords.join(&self.keyword_delimiter),
            level_5_name,
        })
    }
}

/// Write records as one JSON array
pub fn write_json<W: Write>(records: &[TaxonomyRecord], writer: W) -> StorageResult<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// Write records as JSON lines
pub fn write_jsonl<W: Write>(records: &[TaxonomyRecord], mut writer: W) -> StorageResult<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
