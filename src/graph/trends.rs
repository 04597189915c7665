//! Trend analysis over a chronological sequence of snapshots.
//!
//! Snapshots are taken in the order given; nothing is sorted or re-timestamped
//! here. Fewer than two snapshots is a normal outcome and is reported as
//! [`TrendAnalysis::Insufficient`], not as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::GraphSnapshot;
use super::structure::{clustering_coefficient, network_density};

/// Minimum number of snapshots for a trend.
pub const MIN_TREND_SNAPSHOTS: usize = 2;

/// Not enough history to compute a trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsufficientData {
    pub snapshot_count: usize,
    pub required: usize,
}

/// Parallel metric series, one entry per snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub node_counts: Vec<usize>,
    pub link_counts: Vec<usize>,
    pub densities: Vec<f64>,
    pub clustering: Vec<f64>,
    pub captured_at: Vec<Option<DateTime<Utc>>>,
    /// Last minus first node count
    pub node_growth: i64,
    /// Last minus first link count
    pub link_growth: i64,
    /// Last minus first density
    pub density_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendAnalysis {
    Insufficient(InsufficientData),
    Trends(TrendReport),
}

impl TrendAnalysis {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::Insufficient(_))
    }

    pub fn report(&self) -> Option<&TrendReport> {
        match self {
            Self::Trends(report) => Some(report),
            Self::Insufficient(_) => None,
        }
    }
}

/// Compute metric series across `snapshots`, oldest first.
pub fn analyze_trends(snapshots: &[GraphSnapshot]) -> TrendAnalysis {
    if snapshots.len() < MIN_TREND_SNAPSHOTS {
        tracing::debug!(snapshots = snapshots.len(), "not enough history for trends");
        return TrendAnalysis::Insufficient(InsufficientData {
            snapshot_count: snapshots.len(),
            required: MIN_TREND_SNAPSHOTS,
        });
    }

    let node_counts: Vec<usize> = snapshots.iter().map(GraphSnapshot::node_count).collect();
    let link_counts: Vec<usize> = snapshots.iter().map(GraphSnapshot::link_count).collect();
    let densities: Vec<f64> = snapshots.iter().map(network_density).collect();
    let clustering: Vec<f64> = snapshots.iter().map(clustering_coefficient).collect();
    let captured_at = snapshots.iter().map(GraphSnapshot::captured_at).collect();

    let last = snapshots.len() - 1;
    TrendAnalysis::Trends(TrendReport {
        node_growth: node_counts[last] as i64 - node_counts[0] as i64,
        link_growth: link_counts[last] as i64 - link_counts[0] as i64,
        density_change: densities[last] - densities[0],
        node_counts,
        link_counts,
        densities,
        clustering,
        captured_at,
    })
}
