//! Limits on citation propagation
//!
//! Propagation stops at the first of three limits: the hop cap, the node
//! budget, or a cancelled token. Whatever was reached before the stop is
//! kept and the cause is reported as a [`Cutoff`].

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cancels a running classification from any thread
///
/// Checked before each venue is expanded.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Why propagation stopped before exhausting the neighborhood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Unvisited neighbors remained past the hop cap
    Hops,
    /// `max_nodes` neighbors were reached
    Nodes,
    Cancelled,
}

/// Running limits for one propagation
pub(crate) struct Budget<'a> {
    max_nodes: usize,
    token: Option<&'a CancellationToken>,
    cutoff: Option<Cutoff>,
}

impl<'a> Budget<'a> {
    pub(crate) fn new(max_nodes: usize, token: Option<&'a CancellationToken>) -> Self {
        Self {
            max_nodes,
            token,
            cutoff: None,
        }
    }

    /// False once cut off or cancelled
    pub(crate) fn proceed(&mut self) -> bool {
        if self.cutoff.is_some() {
            return false;
        }
        if self.token.is_some_and(CancellationToken::is_cancelled) {
            self.cut(Cutoff::Cancelled);
            return false;
        }
        true
    }

    /// Whether one more node fits after `reached`
    pub(crate) fn admit(&mut self, reached: usize) -> bool {
        if reached >= self.max_nodes {
            self.cut(Cutoff::Nodes);
            return false;
        }
        true
    }

    /// Record the first cause only
    pub(crate) fn cut(&mut self, cutoff: Cutoff) {
        if self.cutoff.is_none() {
            debug!(?cutoff, max_nodes = self.max_nodes, "propagation cut off");
            self.cutoff = Some(cutoff);
        }
    }

    pub(crate) fn cutoff(&self) -> Option<Cutoff> {
        self.cutoff
    }
}
