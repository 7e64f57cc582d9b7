//! Graph maintenance: archive stale elements, trim evidence history.
//!
//! Archival is non-destructive — edges flip inactive, nodes flip to
//! archived — so a later build pass touching the same natural key revives
//! the element. Only evidence rows are actually deleted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PruneResult;
use crate::graph::NodeStatus;
use crate::scope::Scope;
use crate::store::GraphStore;

/// Configuration for one pruning pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Edges unseen for this many days are archived.
    pub edge_stale_days: i64,
    /// Nodes must be unseen this long AND low-degree to be archived.
    pub node_stale_days: i64,
    /// Active-edge degree at or above this protects a node from archival.
    pub min_degree: usize,
    /// Evidence rows kept per edge.
    pub keep_edge_evidence: usize,
    /// Evidence rows kept per node.
    pub keep_node_evidence: usize,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            edge_stale_days: 90,
            node_stale_days: 180,
            min_degree: 3,
            keep_edge_evidence: 5,
            keep_node_evidence: 10,
        }
    }
}

/// Summary of one pruning pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    pub edges_archived: usize,
    pub nodes_archived: usize,
    pub edge_evidence_deleted: usize,
    pub node_evidence_deleted: usize,
}

impl std::fmt::Display for PruneReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "prune report")?;
        writeln!(f, "  edges archived:        {}", self.edges_archived)?;
        writeln!(f, "  nodes archived:        {}", self.nodes_archived)?;
        writeln!(f, "  edge evidence deleted: {}", self.edge_evidence_deleted)?;
        writeln!(f, "  node evidence deleted: {}", self.node_evidence_deleted)?;
        Ok(())
    }
}

/// Periodically rewrites the graph store to bound its size.
pub struct GraphMaintainer {
    store: Arc<GraphStore>,
}

impl GraphMaintainer {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Prune a scope relative to the current time.
    pub fn prune(&self, scope: Scope, config: &PruneConfig) -> PruneResult<PruneReport> {
        self.prune_at(scope, config, Utc::now())
    }

    /// Prune a scope relative to an explicit reference time.
    ///
    /// The edge pass runs first: node degree is evaluated against the
    /// post-archival active edge set, so stale edges never protect a stale
    /// node.
    pub fn prune_at(
        &self,
        scope: Scope,
        config: &PruneConfig,
        now: DateTime<Utc>,
    ) -> PruneResult<PruneReport> {
        let mut report = PruneReport::default();

        // 1) Stale edges, regardless of endpoint degree.
        let edge_cutoff = now - Duration::days(config.edge_stale_days);
        for edge in self.store.edges_in_scope(scope) {
            if edge.is_active && edge.last_seen_at < edge_cutoff {
                if self.store.archive_edge(edge.id)? {
                    report.edges_archived += 1;
                }
            }
        }

        // 2) Stale nodes, unless well-connected. Degree counts active edges
        //    in both directions.
        let node_cutoff = now - Duration::days(config.node_stale_days);
        for node in self.store.nodes_in_scope(scope) {
            if node.status == NodeStatus::Archived || node.last_seen_at >= node_cutoff {
                continue;
            }
            if self.store.active_degree(node.id) < config.min_degree {
                if self.store.archive_node(node.id)? {
                    report.nodes_archived += 1;
                }
            }
        }

        // 3) Evidence retention, for every parent in scope.
        for edge in self.store.edges_in_scope(scope) {
            report.edge_evidence_deleted += self
                .store
                .trim_edge_evidence(edge.id, config.keep_edge_evidence)?;
        }
        for node in self.store.nodes_in_scope(scope) {
            report.node_evidence_deleted += self
                .store
                .trim_node_evidence(node.id, config.keep_node_evidence)?;
        }

        tracing::info!(
            %scope,
            edges_archived = report.edges_archived,
            nodes_archived = report.nodes_archived,
            edge_evidence_deleted = report.edge_evidence_deleted,
            node_evidence_deleted = report.node_evidence_deleted,
            "prune complete"
        );

        Ok(report)
    }
}
