//! Similarity, influence and anomaly ranking.
//!
//! Similarity is Jaccard over distinct neighbor sets. Influence is the mean of
//! degree centrality and PageRank. Anomalies are degree-centrality z-score
//! outliers (population standard deviation).

use std::cmp::Ordering;
use std::collections::HashMap;

use super::centrality::{degree_centrality, pagerank};
use super::models::{
    AnalyticsConfig, Anomaly, ScoredNode, DEGREE_ANOMALY_HIGH, DEGREE_ANOMALY_LOW,
};
use super::snapshot::GraphSnapshot;

// ============================================================================
// Similarity
// ============================================================================

/// Jaccard similarity of the neighbor sets of `a` and `b`.
///
/// `0.0` if either id is unknown or both nodes are isolated.
pub fn node_similarity(graph: &GraphSnapshot, a: &str, b: &str) -> f64 {
    let (Some(ia), Some(ib)) = (graph.get_index(a), graph.get_index(b)) else {
        return 0.0;
    };
    let na = graph.neighbor_set(ia);
    let nb = graph.neighbor_set(ib);
    let union = na.union(&nb).count();
    if union == 0 {
        return 0.0;
    }
    na.intersection(&nb).count() as f64 / union as f64
}

/// Every other node scoring at least `threshold`, best first (ties by id).
pub fn find_similar_nodes(graph: &GraphSnapshot, id: &str, threshold: f64) -> Vec<ScoredNode> {
    if !graph.contains(id) {
        return vec![];
    }
    let mut similar: Vec<ScoredNode> = graph
        .nodes()
        .filter(|n| n.id != id)
        .filter_map(|n| {
            let score = node_similarity(graph, id, &n.id);
            (score >= threshold).then(|| ScoredNode {
                node: n.clone(),
                score,
            })
        })
        .collect();
    sort_scored(&mut similar);
    similar
}

// ============================================================================
// Influence
// ============================================================================

/// Combine precomputed degree centrality and PageRank into influence scores.
pub fn combine_influence(
    degree: &HashMap<String, f64>,
    pagerank: &HashMap<String, f64>,
) -> HashMap<String, f64> {
    degree
        .iter()
        .map(|(id, d)| {
            let pr = pagerank.get(id).copied().unwrap_or(0.0);
            (id.clone(), (d + pr) / 2.0)
        })
        .collect()
}

/// Influence of every node.
pub fn influence_scores(graph: &GraphSnapshot, config: &AnalyticsConfig) -> HashMap<String, f64> {
    combine_influence(&degree_centrality(graph), &pagerank(graph, config))
}

/// Influence of one node; `0.0` for unknown ids.
pub fn influence_score(graph: &GraphSnapshot, id: &str, config: &AnalyticsConfig) -> f64 {
    if !graph.contains(id) {
        return 0.0;
    }
    influence_scores(graph, config).get(id).copied().unwrap_or(0.0)
}

/// The `top_k` most influential nodes, best first (ties by id).
pub fn find_influential_nodes(
    graph: &GraphSnapshot,
    config: &AnalyticsConfig,
    top_k: usize,
) -> Vec<ScoredNode> {
    top_scored(graph, &influence_scores(graph, config), top_k)
}

/// Rank a score map, keeping the best `top_k`.
pub fn top_scored(
    graph: &GraphSnapshot,
    scores: &HashMap<String, f64>,
    top_k: usize,
) -> Vec<ScoredNode> {
    let mut ranked: Vec<ScoredNode> = scores
        .iter()
        .filter_map(|(id, &score)| {
            graph.get_node(id).map(|node| ScoredNode {
                node: node.clone(),
                score,
            })
        })
        .collect();
    sort_scored(&mut ranked);
    ranked.truncate(top_k);
    ranked
}

fn sort_scored(scored: &mut [ScoredNode]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
}

// ============================================================================
// Anomaly Detection
// ============================================================================

/// Degree-centrality outliers with `|z| > z_threshold`.
pub fn detect_anomalies(graph: &GraphSnapshot, z_threshold: f64) -> Vec<Anomaly> {
    anomalies_from_degree(graph, &degree_centrality(graph), z_threshold)
}

/// Same as [`detect_anomalies`] over a precomputed degree-centrality map.
///
/// Sorted by `|z|` descending, then id. A flat distribution has no outliers.
pub fn anomalies_from_degree(
    graph: &GraphSnapshot,
    degree: &HashMap<String, f64>,
    z_threshold: f64,
) -> Vec<Anomaly> {
    let n = degree.len();
    if n == 0 {
        return vec![];
    }
    let mean = degree.values().sum::<f64>() / n as f64;
    let variance = degree.values().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();
    if std_dev < f64::EPSILON {
        return vec![];
    }

    let mut anomalies: Vec<Anomaly> = degree
        .iter()
        .filter_map(|(id, d)| {
            let z = (d - mean) / std_dev;
            if z.abs() <= z_threshold {
                return None;
            }
            let reason = if z > 0.0 {
                DEGREE_ANOMALY_HIGH
            } else {
                DEGREE_ANOMALY_LOW
            };
            graph.get_node(id).map(|node| Anomaly {
                node: node.clone(),
                score: z,
                reason: reason.to_string(),
            })
        })
        .collect();

    anomalies.sort_by(|a, b| {
        b.score
            .abs()
            .partial_cmp(&a.score.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    if !anomalies.is_empty() {
        tracing::debug!(count = anomalies.len(), mean, std_dev, "degree anomalies found");
    }
    anomalies
}

// ============================================================================
// Tests
// ============================================================================
