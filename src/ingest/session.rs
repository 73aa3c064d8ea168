//! Multi-batch ingestion sessions
//!
//! A session applies node, full-name and edge batches to a shared graph.
//! Records whose nodes have not arrived yet are queued and retried after
//! every node batch; `finalize` retries once more, reports what is still
//! unresolved as dangling and validates the touched part of the graph.

use super::records::{EdgeRecord, FullNameRecord, NodeRecord, RecordError, RowFormat};
use crate::graph::{Change, FosGraph, GraphError};
use crate::validate::{self, ValidationReport};
use serde::Serialize;
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Which record kind a batch carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Nodes,
    FullNames,
    Edges,
}

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Position of the batch within its session
    pub batch: usize,
    pub kind: BatchKind,
    /// Records read, malformed ones included
    pub records: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Records queued until their nodes appear
    pub deferred: usize,
    /// Queued records from earlier batches that this batch resolved
    pub resolved: usize,
    /// Every malformed record, in input order
    pub malformed: Vec<RecordError>,
}

impl BatchReport {
    fn new(batch: usize, kind: BatchKind) -> Self {
        Self {
            batch,
            kind,
            records: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            deferred: 0,
            resolved: 0,
            malformed: Vec::new(),
        }
    }

    fn count(&mut self, change: Change) {
        match change {
            Change::Created => self.created += 1,
            Change::Updated => self.updated += 1,
            Change::Unchanged => self.unchanged += 1,
        }
    }

    /// Records that reached the graph
    pub fn applied(&self) -> usize {
        self.created + self.updated + self.unchanged
    }

    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// A queued record that never resolved
#[derive(Debug, Clone, Serialize)]
pub struct Dangling {
    pub batch: usize,
    pub row: usize,
    #[serde(serialize_with = "display")]
    pub error: GraphError,
}

fn display<S: serde::Serializer>(error: &GraphError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Outcome of a whole session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub batches: Vec<BatchReport>,
    /// Records dropped because a referenced node never appeared
    pub dangling: Vec<Dangling>,
    /// Validation of every node the session touched
    pub validation: ValidationReport,
}

impl SessionReport {
    pub fn malformed(&self) -> impl Iterator<Item = &RecordError> {
        self.batches.iter().flat_map(|b| b.malformed.iter())
    }

    /// No malformed rows, no dangling records and no error-level violations
    pub fn is_clean(&self) -> bool {
        self.malformed().next().is_none() && self.dangling.is_empty() && self.validation.is_clean()
    }
}

#[derive(Debug, Clone)]
enum Deferred {
    Edge(EdgeRecord),
    FullName(FullNameRecord),
}

#[derive(Debug, Clone)]
struct Queued {
    batch: usize,
    row: usize,
    record: Deferred,
}

/// An ingestion session over a shared graph
///
/// Sessions on different threads may target the same graph; each record is
/// merged atomically under its own node or edge key.
pub struct IngestSession<'g> {
    graph: &'g FosGraph,
    format: RowFormat,
    queue: Vec<Queued>,
    batches: Vec<BatchReport>,
}

impl<'g> IngestSession<'g> {
    pub fn new(graph: &'g FosGraph) -> Self {
        Self::with_format(graph, RowFormat::default())
    }

    pub fn with_format(graph: &'g FosGraph, format: RowFormat) -> Self {
        Self {
            graph,
            format,
            queue: Vec::new(),
            batches: Vec::new(),
        }
    }

    /// Records still waiting for their nodes
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    // --- Nodes ---

    /// Merge a batch of node records
    pub fn ingest_nodes(&mut self, records: impl IntoIterator<Item = NodeRecord>) -> BatchReport {
        self.apply_nodes(records.into_iter().enumerate().map(|(i, r)| Ok((i + 1, r))))
    }

    /// Read and merge node rows
    pub fn ingest_node_rows(&mut self, reader: impl BufRead) -> BatchReport {
        let format = self.format.clone();
        let rows = format
            .rows(reader)
            .map(|row| row.and_then(|(n, line)| format.parse_node(n, &line).map(|r| (n, r))));
        self.apply_nodes(rows)
    }

    fn apply_nodes(
        &mut self,
        records: impl IntoIterator<Item = Result<(usize, NodeRecord), RecordError>>,
    ) -> BatchReport {
        let mut report = BatchReport::new(self.batches.len() + 1, BatchKind::Nodes);
        for record in records {
            report.records += 1;
            match record.and_then(|(row, r)| r.check(row).map(|_| r)) {
                Ok(record) => {
                    let id = record.resolved_id();
                    let change = self
                        .graph
                        .upsert_node(id, record.name, record.roles, record.attributes);
                    report.count(change);
                }
                Err(e) => {
                    warn!(batch = report.batch, "malformed node record: {}", e);
                    report.malformed.push(e);
                }
            }
        }
        report.resolved = self.retry_queue();
        self.finish_batch(report)
    }

    // --- Full names ---

    /// Attach a batch of alternate full names
    pub fn ingest_full_names(&mut self, records: impl IntoIterator<Item = FullNameRecord>) -> BatchReport {
        self.apply_full_names(records.into_iter().enumerate().map(|(i, r)| Ok((i + 1, r))))
    }

    /// Read and attach full-name rows
    pub fn ingest_full_name_rows(&mut self, reader: impl BufRead) -> BatchReport {
        let format = self.format.clone();
        let rows = format
            .rows(reader)
            .map(|row| row.and_then(|(n, line)| format.parse_full_name(n, &line).map(|r| (n, r))));
        self.apply_full_names(rows)
    }

    fn apply_full_names(
        &mut self,
        records: impl IntoIterator<Item = Result<(usize, FullNameRecord), RecordError>>,
    ) -> BatchReport {
        let mut report = BatchReport::new(self.batches.len() + 1, BatchKind::FullNames);
        for record in records {
            report.records += 1;
            match record.and_then(|(row, r)| r.check(row).map(|_| (row, r))) {
                Ok((row, record)) => match self.graph.add_full_name(&record.id, record.full_name.clone()) {
                    Ok(added) => report.count(if added { Change::Created } else { Change::Unchanged }),
                    Err(_) => {
                        debug!(node = %record.id, "full name deferred until node appears");
                        report.deferred += 1;
                        self.queue.push(Queued {
                            batch: report.batch,
                            row,
                            record: Deferred::FullName(record),
                        });
                    }
                },
                Err(e) => {
                    warn!(batch = report.batch, "malformed full-name record: {}", e);
                    report.malformed.push(e);
                }
            }
        }
        self.finish_batch(report)
    }

    // --- Edges ---

    /// Merge a batch of edge records
    pub fn ingest_edges(&mut self, records: impl IntoIterator<Item = EdgeRecord>) -> BatchReport {
        self.apply_edges(records.into_iter().enumerate().map(|(i, r)| Ok((i + 1, r))))
    }

    /// Read and merge edge rows
    pub fn ingest_edge_rows(&mut self, reader: impl BufRead) -> BatchReport {
        let format = self.format.clone();
        let rows = format
            .rows(reader)
            .map(|row| row.and_then(|(n, line)| format.parse_edge(n, &line).map(|r| (n, r))));
        self.apply_edges(rows)
    }

    fn apply_edges(
        &mut self,
        records: impl IntoIterator<Item = Result<(usize, EdgeRecord), RecordError>>,
    ) -> BatchReport {
        let mut report = BatchReport::new(self.batches.len() + 1, BatchKind::Edges);
        for record in records {
            report.records += 1;
            match record.and_then(|(row, r)| r.check(row).map(|_| (row, r))) {
                Ok((row, record)) => match self.upsert_edge(&record) {
                    Ok(change) => report.count(change),
                    Err(GraphError::DanglingReference { missing, .. }) => {
                        debug!(edge = %record.edge_type, %missing, "edge deferred until node appears");
                        report.deferred += 1;
                        self.queue.push(Queued {
                            batch: report.batch,
                            row,
                            record: Deferred::Edge(record),
                        });
                    }
                    Err(e) => {
                        warn!(batch = report.batch, row, "edge rejected: {}", e);
                    }
                },
                Err(e) => {
                    warn!(batch = report.batch, "malformed edge record: {}", e);
                    report.malformed.push(e);
                }
            }
        }
        self.finish_batch(report)
    }

    fn upsert_edge(&self, record: &EdgeRecord) -> Result<Change, GraphError> {
        self.graph
            .upsert_edge(&record.source, &record.target, record.edge_type, record.weight)
    }

    fn apply_queued(&self, queued: &Queued) -> Result<Change, GraphError> {
        match &queued.record {
            Deferred::Edge(edge) => self.upsert_edge(edge),
            Deferred::FullName(name) => self
                .graph
                .add_full_name(&name.id, name.full_name.clone())
                .map(|added| if added { Change::Created } else { Change::Unchanged }),
        }
    }

    /// Apply queued records whose nodes now exist; returns how many resolved
    fn retry_queue(&mut self) -> usize {
        let before = self.queue.len();
        let queue = std::mem::take(&mut self.queue);
        let remaining: Vec<Queued> = queue
            .into_iter()
            .filter(|queued| self.apply_queued(queued).is_err())
            .collect();
        self.queue = remaining;
        before - self.queue.len()
    }

    fn finish_batch(&mut self, report: BatchReport) -> BatchReport {
        info!(
            batch = report.batch,
            kind = ?report.kind,
            records = report.records,
            created = report.created,
            updated = report.updated,
            deferred = report.deferred,
            resolved = report.resolved,
            malformed = report.malformed.len(),
            "batch ingested"
        );
        self.batches.push(report.clone());
        report
    }

    /// Close the session: resolve or drop queued records, then validate
    pub fn finalize(mut self) -> SessionReport {
        let resolved = self.retry_queue();
        if resolved > 0 {
            debug!(resolved, "queued records resolved at finalize");
        }

        let dangling: Vec<Dangling> = self
            .queue
            .iter()
            .filter_map(|queued| {
                self.apply_queued(queued).err().map(|error| Dangling {
                    batch: queued.batch,
                    row: queued.row,
                    error,
                })
            })
            .collect();
        for d in &dangling {
            warn!(batch = d.batch, row = d.row, "dropping record: {}", d.error);
        }

        let validation = validate::validate(self.graph);
        self.graph.clear_pending(validation.clean_marks());

        info!(
            batches = self.batches.len(),
            dangling = dangling.len(),
            violations = validation.violations.len(),
            "ingestion session finalized"
        );
        SessionReport {
            batches: self.batches,
            dangling,
            validation,
        }
    }
}
