//! Citation propagation: labeling venues from their citation neighbors
//!
//! A venue's distribution at a level is the influence-weighted mix of its
//! neighbors' assignments. Hop-1 influence is the citation weight between the
//! two venues (both directions summed); each further hop passes on a share of
//! its parent's influence proportional to the citation weight, damped by
//! `hop_decay`.

use super::budget::{Budget, CancellationToken, Cutoff};
use super::types::{Classification, LabelScore, Origin};
use crate::graph::{EdgeType, FosGraph, GraphError, GraphResult, Level, NodeId, Role};
use crate::ingest::EdgeRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Default cap on propagation depth, whatever `hops` asks for
pub const MAX_HOPS: usize = 4;

/// Parameters for citation propagation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyParams {
    /// Level to classify at (L1..L4)
    pub level: Level,
    /// Citation hops to follow
    pub hops: usize,
    /// Cap on `hops`
    pub max_hops: usize,
    /// Influence multiplier applied per hop beyond the first
    pub hop_decay: f64,
    /// Use deeper assignments rolled up through `specializes_*` when a
    /// neighbor has none at the level itself
    pub roll_up: bool,
    /// Ignore citation edges lighter than this
    pub min_citation_weight: f64,
    /// Ignore assignment edges lighter than this
    pub min_assignment_weight: f64,
    /// Keep only the best labels
    pub top_n: Option<usize>,
    /// Propagate even when the venue already has a direct assignment
    pub overwrite: bool,
    /// Budget on neighbors reached
    pub max_nodes: usize,
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            level: Level::L4,
            hops: 1,
            max_hops: MAX_HOPS,
            hop_decay: 0.5,
            roll_up: false,
            min_citation_weight: 0.0,
            min_assignment_weight: 0.0,
            top_n: None,
            overwrite: false,
            max_nodes: 10_000,
            cancel: None,
        }
    }
}

impl ClassifyParams {
    /// Default parameters at a level
    pub fn at(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn hop_decay(mut self, hop_decay: f64) -> Self {
        self.hop_decay = hop_decay;
        self
    }

    pub fn roll_up(mut self, roll_up: bool) -> Self {
        self.roll_up = roll_up;
        self
    }

    pub fn min_citation_weight(mut self, weight: f64) -> Self {
        self.min_citation_weight = weight;
        self
    }

    pub fn min_assignment_weight(mut self, weight: f64) -> Self {
        self.min_assignment_weight = weight;
        self
    }

    pub fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Classify a venue at `params.level` from its citation neighborhood
///
/// Returns the venue's own assignment when it has one, unless
/// `params.overwrite` is set.
pub fn classify_by_citation(
    graph: &FosGraph,
    venue: &NodeId,
    params: &ClassifyParams,
) -> GraphResult<Classification> {
    let level = params.level;
    let Some(assignment) = EdgeType::assignment(level).filter(|_| level <= Level::L4) else {
        return Err(GraphError::InvalidLevel {
            level,
            operation: "classify_by_citation",
        });
    };
    graph.get_node(venue)?;

    if !params.overwrite {
        let direct = label_weights(graph, venue, assignment, params.min_assignment_weight);
        if !direct.is_empty() {
            let scores = ranked(graph, direct, params.top_n);
            return Ok(Classification {
                venue: venue.clone(),
                level,
                origin: Origin::Direct,
                scores,
                reached: 0,
                partial: false,
                cutoff: None,
            });
        }
    }

    let propagation = Propagation::new(graph, params).run(venue);

    let mut totals: BTreeMap<NodeId, f64> = BTreeMap::new();
    for (neighbor, influence) in &propagation.influence {
        let labels = neighbor_labels(graph, neighbor, params);
        let sum: f64 = labels.values().sum();
        if sum <= 0.0 {
            continue;
        }
        for (label, weight) in labels {
            *totals.entry(label).or_insert(0.0) += influence * weight / sum;
        }
    }

    let scores = ranked(graph, totals, params.top_n);
    debug!(
        %venue,
        %level,
        reached = propagation.influence.len(),
        labels = scores.len(),
        cutoff = ?propagation.cutoff,
        "classified by citation"
    );
    Ok(Classification {
        venue: venue.clone(),
        level,
        origin: Origin::Citation,
        scores,
        reached: propagation.influence.len(),
        partial: propagation.cutoff.is_some(),
        cutoff: propagation.cutoff,
    })
}

/// Infer `in_Lk` edges for every venue without an assignment at the level
///
/// Returns records to feed back through ingestion; the graph is not
/// modified. With `overwrite` every venue is reclassified. At most `top_n`
/// labels (two when unset) are kept per venue.
pub fn infer_assignments(graph: &FosGraph, params: &ClassifyParams) -> GraphResult<Vec<EdgeRecord>> {
    let level = params.level;
    let Some(assignment) = EdgeType::assignment(level).filter(|_| level <= Level::L4) else {
        return Err(GraphError::InvalidLevel {
            level,
            operation: "infer_assignments",
        });
    };

    let reclassify = params.overwrite;
    let params = ClassifyParams {
        overwrite: true,
        top_n: Some(params.top_n.unwrap_or(2)),
        ..params.clone()
    };
    let mut records = Vec::new();
    let mut classified = 0usize;

    for venue in graph.nodes_with_role(Role::Venue) {
        if params.is_cancelled() {
            debug!("inference cancelled");
            break;
        }
        if !reclassify && !graph.targets(&venue, assignment).is_empty() {
            continue;
        }
        let classification = classify_by_citation(graph, &venue, &params)?;
        if classification.is_empty() {
            continue;
        }
        classified += 1;
        records.extend(
            classification
                .scores
                .into_iter()
                .map(|s| EdgeRecord::weighted(venue.clone(), s.label, assignment, s.score)),
        );
    }

    info!(%level, venues = classified, edges = records.len(), "assignments inferred");
    Ok(records)
}

/// Influence reached by citation propagation
struct Propagation<'a> {
    graph: &'a FosGraph,
    params: &'a ClassifyParams,
    budget: Budget<'a>,
    influence: BTreeMap<NodeId, f64>,
    cutoff: Option<Cutoff>,
}

impl<'a> Propagation<'a> {
    fn new(graph: &'a FosGraph, params: &'a ClassifyParams) -> Self {
        Self {
            graph,
            params,
            budget: Budget::new(params.max_nodes, params.cancel.as_ref()),
            influence: BTreeMap::new(),
            cutoff: None,
        }
    }

    fn run(mut self, venue: &NodeId) -> Self {
        let hops = self.params.hops.min(self.params.max_hops);
        if hops < self.params.hops {
            debug!(requested = self.params.hops, cap = self.params.max_hops, "hop count capped");
        }

        let mut visited: BTreeSet<NodeId> = BTreeSet::from([venue.clone()]);
        let mut frontier: BTreeMap<NodeId, f64> = BTreeMap::from([(venue.clone(), 1.0)]);

        for hop in 0..hops {
            let mut next: BTreeMap<NodeId, f64> = BTreeMap::new();
            let finished = self.expand(hop, &frontier, &visited, &mut next);
            for (neighbor, influence) in &next {
                visited.insert(neighbor.clone());
                self.influence.insert(neighbor.clone(), *influence);
            }
            if !finished || next.is_empty() {
                self.cutoff = self.budget.cutoff();
                return self;
            }
            frontier = next;
        }

        if hops < self.params.hops && self.reaches_beyond(&frontier, &visited) {
            self.budget.cut(Cutoff::Hops);
        }
        self.cutoff = self.budget.cutoff();
        self
    }

    /// Spread each frontier venue's influence to its unvisited neighbors
    ///
    /// Hop 0 passes the raw citation weight; later hops pass a damped share
    /// of the parent's influence. Returns false when the budget stopped it.
    fn expand(
        &mut self,
        hop: usize,
        frontier: &BTreeMap<NodeId, f64>,
        visited: &BTreeSet<NodeId>,
        next: &mut BTreeMap<NodeId, f64>,
    ) -> bool {
        for (parent, parent_influence) in frontier {
            if !self.budget.proceed() {
                return false;
            }
            let neighbors = self.citation_neighbors(parent);
            let total: f64 = neighbors.values().sum();
            if total <= 0.0 {
                continue;
            }
            for (neighbor, weight) in neighbors {
                if visited.contains(&neighbor) {
                    continue;
                }
                let share = if hop == 0 {
                    weight
                } else {
                    parent_influence * weight / total * self.params.hop_decay
                };
                if let Some(influence) = next.get_mut(&neighbor) {
                    *influence += share;
                    continue;
                }
                if !self.budget.admit(self.influence.len() + next.len()) {
                    return false;
                }
                next.insert(neighbor, share);
            }
        }
        true
    }

    fn reaches_beyond(&self, frontier: &BTreeMap<NodeId, f64>, visited: &BTreeSet<NodeId>) -> bool {
        frontier
            .keys()
            .any(|id| self.citation_neighbors(id).keys().any(|n| !visited.contains(n)))
    }

    /// `cites` neighbors in both directions, weights summed per neighbor
    fn citation_neighbors(&self, id: &NodeId) -> BTreeMap<NodeId, f64> {
        let mut neighbors: BTreeMap<NodeId, f64> = BTreeMap::new();
        let min = self.params.min_citation_weight;
        let outgoing = self
            .graph
            .edges_from(id, Some(EdgeType::Cites))
            .into_iter()
            .map(|e| (e.weight(), e.target));
        let incoming = self
            .graph
            .edges_to(id, Some(EdgeType::Cites))
            .into_iter()
            .map(|e| (e.weight(), e.source));
        for (weight, neighbor) in outgoing.chain(incoming) {
            if weight < min || &neighbor == id {
                continue;
            }
            *neighbors.entry(neighbor).or_insert(0.0) += weight;
        }
        neighbors
    }
}

/// Assignment targets of one type with their weights
fn label_weights(graph: &FosGraph, id: &NodeId, assignment: EdgeType, min: f64) -> BTreeMap<NodeId, f64> {
    graph
        .edges_from(id, Some(assignment))
        .into_iter()
        .filter(|e| e.weight() >= min)
        .map(|e| (e.target.clone(), e.weight()))
        .collect()
}

/// A neighbor's labels at the requested level, rolled up from the nearest
/// deeper level when allowed and needed
fn neighbor_labels(graph: &FosGraph, id: &NodeId, params: &ClassifyParams) -> BTreeMap<NodeId, f64> {
    let min = params.min_assignment_weight;
    let direct = EdgeType::assignment(params.level)
        .map(|ty| label_weights(graph, id, ty, min))
        .unwrap_or_default();
    if !direct.is_empty() || !params.roll_up {
        return direct;
    }

    let mut deeper = params.level;
    while let Some(level) = Level::from_depth(deeper.depth() + 1).filter(|l| *l <= Level::L4) {
        deeper = level;
        let Some(ty) = EdgeType::assignment(level) else {
            break;
        };
        let labels = label_weights(graph, id, ty, min);
        if labels.is_empty() {
            continue;
        }
        let mut rolled: BTreeMap<NodeId, f64> = BTreeMap::new();
        for (label, weight) in labels {
            if let Some(ancestor) = ancestor_at(graph, label, level, params.level) {
                *rolled.entry(ancestor).or_insert(0.0) += weight;
            }
        }
        return rolled;
    }
    BTreeMap::new()
}

/// Walk `specializes_*` edges from a node at `from` up to `to`, following the
/// lowest id on ambiguity
fn ancestor_at(graph: &FosGraph, id: NodeId, from: Level, to: Level) -> Option<NodeId> {
    let mut current = id;
    let mut level = from;
    while level > to {
        let edge_type = EdgeType::specializes_from(level)?;
        current = graph.targets(&current, edge_type).into_iter().next()?;
        level = level.parent()?;
    }
    Some(current)
}

/// Normalize to sum 1, order by descending score then label id, truncate
fn ranked(graph: &FosGraph, totals: BTreeMap<NodeId, f64>, top_n: Option<usize>) -> Vec<LabelScore> {
    let sum: f64 = totals.values().sum();
    if sum <= 0.0 {
        return Vec::new();
    }
    let mut scores: Vec<LabelScore> = totals
        .into_iter()
        .map(|(label, total)| LabelScore {
            name: graph
                .get_node(&label)
                .map(|n| n.display_name().to_string())
                .unwrap_or_default(),
            label,
            score: total / sum,
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
    if let Some(n) = top_n {
        scores.truncate(n);
    }
    scores
}
