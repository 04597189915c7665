//! Centrality calculator.
//!
//! - **Degree**: distinct-neighbor count normalized by `N - 1`
//! - **Closeness**: `(reachable - 1) / total distance to reachable nodes`
//! - **Betweenness**: one shortest path per unordered pair, strict
//!   intermediates counted, normalized by `N·(N-1)/2`
//! - **PageRank**: power iteration with a convergence test and a hard cap
//!
//! Closeness and betweenness build one [`ShortestPathTree`] per source and
//! switch to rayon above [`PARALLEL_THRESHOLD`] nodes. Both are quadratic or
//! worse and are intended for graphs up to the low thousands of nodes; pass an
//! [`Interrupt`] to bound their latency.

use petgraph::graph::{EdgeIndex, NodeIndex};
use rayon::prelude::*;
use std::collections::HashMap;

use super::error::AnalysisResult;
use super::interrupt::Interrupt;
use super::models::AnalyticsConfig;
use super::paths::ShortestPathTree;
use super::snapshot::GraphSnapshot;

/// Node count from which per-source sweeps run in parallel.
pub const PARALLEL_THRESHOLD: usize = 200;

fn by_id(graph: &GraphSnapshot, scores: Vec<f64>) -> HashMap<String, f64> {
    graph
        .graph()
        .node_indices()
        .map(|idx| (graph.node(idx).id.clone(), scores[idx.index()]))
        .collect()
}

// ============================================================================
// Degree
// ============================================================================

/// Normalized degree centrality. Every score lies in `[0, 1]`; graphs with at
/// most one node score `0`.
pub fn degree_centrality(graph: &GraphSnapshot) -> HashMap<String, f64> {
    let n = graph.node_count();
    let scores = graph
        .graph()
        .node_indices()
        .map(|idx| {
            if n <= 1 {
                0.0
            } else {
                graph.degree(idx) as f64 / (n - 1) as f64
            }
        })
        .collect();
    by_id(graph, scores)
}

// ============================================================================
// Closeness
// ============================================================================

/// Closeness centrality over weighted shortest-path distances.
///
/// Nodes that reach nothing (or only through zero-weight links) score `0`.
pub fn closeness_centrality(
    graph: &GraphSnapshot,
    interrupt: &Interrupt,
) -> AnalysisResult<HashMap<String, f64>> {
    graph.check_weights()?;
    let adjacency = graph.adjacency();
    let n = adjacency.len();

    let closeness_from = |s: usize| -> AnalysisResult<f64> {
        interrupt.check()?;
        let tree = ShortestPathTree::build(graph, &adjacency, NodeIndex::new(s), None);
        let (reachable, total) = tree
            .reachable()
            .fold((0usize, 0.0f64), |(count, sum), (_, d)| (count + 1, sum + d));
        Ok(if total > 0.0 {
            (reachable - 1) as f64 / total
        } else {
            0.0
        })
    };

    let scores: Vec<f64> = if n >= PARALLEL_THRESHOLD {
        (0..n).into_par_iter().map(closeness_from).collect::<AnalysisResult<_>>()?
    } else {
        (0..n).map(closeness_from).collect::<AnalysisResult<_>>()?
    };
    Ok(by_id(graph, scores))
}

// ============================================================================
// Betweenness
// ============================================================================

fn accumulate_intermediates(
    graph: &GraphSnapshot,
    adjacency: &[Vec<(usize, EdgeIndex)>],
    source: usize,
    counts: &mut [f64],
) {
    let tree = ShortestPathTree::build(graph, adjacency, NodeIndex::new(source), None);
    for target in (source + 1)..adjacency.len() {
        for mid in tree.intermediates(NodeIndex::new(target)) {
            counts[mid] += 1.0;
        }
    }
}

/// Betweenness centrality, normalized to `[0, 1]`.
///
/// Unreachable pairs contribute nothing. With tied shortest paths an
/// arbitrary one is counted.
pub fn betweenness_centrality(
    graph: &GraphSnapshot,
    interrupt: &Interrupt,
) -> AnalysisResult<HashMap<String, f64>> {
    graph.check_weights()?;
    let adjacency = graph.adjacency();
    let n = adjacency.len();
    if n < 2 {
        return Ok(by_id(graph, vec![0.0; n]));
    }

    let mut counts = if n >= PARALLEL_THRESHOLD {
        (0..n)
            .into_par_iter()
            .try_fold(
                || vec![0.0; n],
                |mut acc: Vec<f64>, s| -> AnalysisResult<Vec<f64>> {
                    interrupt.check()?;
                    accumulate_intermediates(graph, &adjacency, s, &mut acc);
                    Ok(acc)
                },
            )
            .try_reduce(
                || vec![0.0; n],
                |mut a: Vec<f64>, b: Vec<f64>| -> AnalysisResult<Vec<f64>> {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y;
                    }
                    Ok(a)
                },
            )?
    } else {
        let mut acc = vec![0.0; n];
        for s in 0..n {
            interrupt.check()?;
            accumulate_intermediates(graph, &adjacency, s, &mut acc);
        }
        acc
    };

    let pairs = (n * (n - 1)) as f64 / 2.0;
    for c in counts.iter_mut() {
        *c /= pairs;
    }
    Ok(by_id(graph, counts))
}

// ============================================================================
// PageRank (power iteration)
// ============================================================================

/// Compute PageRank scores for all nodes in the graph.
///
/// Each iteration gives every node the `(1 - d) / N` baseline plus
/// `d · rank / degree` from each neighbor, where degree counts incident
/// non-loop links. Stops when the largest per-node change drops below
/// `pagerank_tolerance`, or after `pagerank_max_iterations`.
///
/// Isolated nodes have nowhere to send their rank, so that mass is lost rather
/// than spread uniformly; scores then sum to less than `1.0`.
pub fn pagerank(graph: &GraphSnapshot, config: &AnalyticsConfig) -> HashMap<String, f64> {
    let adjacency = graph.adjacency();
    let n = adjacency.len();
    if n == 0 {
        return HashMap::new();
    }

    let damping = config.pagerank_damping;
    let base = (1.0 - damping) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.pagerank_max_iterations {
        iterations += 1;
        next.iter_mut().for_each(|s| *s = base);

        for (i, neighbors) in adjacency.iter().enumerate() {
            if neighbors.is_empty() {
                continue;
            }
            let share = damping * scores[i] / neighbors.len() as f64;
            for &(j, _) in neighbors {
                next[j] += share;
            }
        }

        let delta = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f64, f64::max);

        std::mem::swap(&mut scores, &mut next);

        if delta < config.pagerank_tolerance {
            converged = true;
            break;
        }
    }

    tracing::debug!(iterations, converged, nodes = n, "pagerank finished");
    by_id(graph, scores)
}

// ============================================================================
// Tests
// ============================================================================
