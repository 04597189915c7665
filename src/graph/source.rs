//! Snapshot providers.
//!
//! The engine never builds graphs itself: a [`SnapshotSource`] hands it
//! immutable snapshots, either the latest one for a graph or its full history
//! in chronological order.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::snapshot::GraphSnapshot;

/// Supplier of graph snapshots, keyed by graph id.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Latest snapshot of `graph_id`.
    async fn snapshot(&self, graph_id: &str) -> Result<GraphSnapshot>;

    /// Every recorded snapshot of `graph_id`, oldest first. Unknown graphs
    /// have an empty history.
    async fn history(&self, graph_id: &str) -> Result<Vec<GraphSnapshot>>;
}

/// In-memory source backed by `tokio::sync::RwLock`.
#[derive(Default)]
pub struct InMemorySnapshotSource {
    histories: RwLock<HashMap<String, Vec<GraphSnapshot>>>,
}

impl InMemorySnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot to the history of `graph_id`.
    pub async fn insert(&self, graph_id: impl Into<String>, snapshot: GraphSnapshot) {
        self.histories
            .write()
            .await
            .entry(graph_id.into())
            .or_default()
            .push(snapshot);
    }

    /// Number of snapshots recorded for `graph_id`.
    pub async fn len(&self, graph_id: &str) -> usize {
        self.histories
            .read()
            .await
            .get(graph_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl SnapshotSource for InMemorySnapshotSource {
    async fn snapshot(&self, graph_id: &str) -> Result<GraphSnapshot> {
        self.histories
            .read()
            .await
            .get(graph_id)
            .and_then(|h| h.last())
            .cloned()
            .ok_or_else(|| anyhow!("no snapshot recorded for graph '{}'", graph_id))
    }

    async fn history(&self, graph_id: &str) -> Result<Vec<GraphSnapshot>> {
        Ok(self
            .histories
            .read()
            .await
            .get(graph_id)
            .cloned()
            .unwrap_or_default())
    }
}
