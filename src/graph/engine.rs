//! Analytics engine: runs the full pipeline over one snapshot.
//!
//! [`compute_report`] runs every analyzer and assembles a [`GraphReport`].
//! [`GraphAnalyticsEngine`] wraps it as a stateless service over a
//! [`SnapshotSource`]: build one with [`GraphAnalyticsEngine::new`] and share
//! it behind an `Arc`. The [`AnalyticsEngine`] trait is the async entry point
//! for consumers that only know a graph id.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::centrality::{betweenness_centrality, closeness_centrality, degree_centrality, pagerank};
use super::community::{community_membership, detect_communities, modularity};
use super::error::{AnalysisError, AnalysisResult};
use super::interrupt::Interrupt;
use super::models::{AnalyticsConfig, Cluster, CommunityAlgorithm, GraphReport, NodeMetrics};
use super::ranking::{anomalies_from_degree, combine_influence, top_scored};
use super::snapshot::GraphSnapshot;
use super::source::SnapshotSource;
use super::structure::{
    clustering_coefficient, connected_components, find_articulation_points, find_bridges,
    local_clustering, network_density,
};
use super::trends::{analyze_trends, TrendAnalysis};

// ============================================================================
// Orchestrator: compute_report
// ============================================================================

/// Run every analyzer over `graph` and assemble a [`GraphReport`].
///
/// Execution order:
/// 1. Degree, closeness, betweenness, PageRank
/// 2. Influence (degree + PageRank)
/// 3. Local clustering and connected components
/// 4. Communities and modularity
/// 5. Bridges and articulation points
/// 6. Anomalies and top influential nodes (reuse the maps above)
pub fn compute_report(
    graph: &GraphSnapshot,
    config: &AnalyticsConfig,
    interrupt: &Interrupt,
) -> AnalysisResult<GraphReport> {
    let start = Instant::now();
    config.validate()?;

    // 1. Centrality
    let degree = degree_centrality(graph);
    let closeness = closeness_centrality(graph, interrupt)?;
    let betweenness = betweenness_centrality(graph, interrupt)?;
    let pr = pagerank(graph, config);

    // 2. Influence
    let influence = combine_influence(&degree, &pr);

    // 3. Structure
    let local_cc = local_clustering(graph);
    let (comp_map, components) = connected_components(graph);

    // 4. Communities
    let communities = detect_communities(graph, config.community_algorithm, config, interrupt)?;
    let comm_map = community_membership(&communities);
    let modularity = modularity(graph, &communities);

    // 5. Cut structure
    let bridges = find_bridges(graph, interrupt)?
        .into_iter()
        .map(|l| l.id)
        .collect();
    let articulation_points = find_articulation_points(graph, interrupt)?
        .into_iter()
        .map(|n| n.id)
        .collect();

    // 6. Rankings
    let anomalies = anomalies_from_degree(graph, &degree, config.anomaly_z_threshold);
    let influential = top_scored(graph, &influence, config.influence_top_k);

    let score = |map: &HashMap<String, f64>, id: &str| map.get(id).copied().unwrap_or(0.0);
    let metrics: HashMap<String, NodeMetrics> = graph
        .nodes()
        .map(|node| {
            let id = node.id.as_str();
            let m = NodeMetrics {
                degree: score(&degree, id),
                closeness: score(&closeness, id),
                betweenness: score(&betweenness, id),
                pagerank: score(&pr, id),
                influence: score(&influence, id),
                clustering_coefficient: score(&local_cc, id),
                community_id: comm_map.get(id).cloned(),
                component_id: comp_map.get(id).copied().unwrap_or(0),
            };
            (node.id.clone(), m)
        })
        .collect();

    let report = GraphReport {
        metrics,
        communities,
        components,
        bridges,
        articulation_points,
        anomalies,
        influential,
        modularity,
        density: network_density(graph),
        clustering_coefficient: clustering_coefficient(graph),
        node_count: graph.node_count(),
        link_count: graph.link_count(),
        computation_ms: start.elapsed().as_millis() as u64,
        computed_at: Utc::now(),
    };

    tracing::info!(
        nodes = report.node_count,
        links = report.link_count,
        communities = report.communities.len(),
        modularity = report.modularity,
        computation_ms = report.computation_ms,
        "graph report computed"
    );
    Ok(report)
}

// ============================================================================
// Trait
// ============================================================================

/// Analytics engine trait, addressed by graph id.
///
/// Consumers use `Arc<dyn AnalyticsEngine>` for dependency injection.
#[async_trait]
pub trait AnalyticsEngine: Send + Sync {
    /// Fetch the latest snapshot of `graph_id` and compute its full report.
    async fn analyze_graph(&self, graph_id: &str) -> Result<GraphReport>;

    /// Fetch the history of `graph_id` and compute its trends.
    async fn analyze_history(&self, graph_id: &str) -> Result<TrendAnalysis>;
}

// ============================================================================
// Concrete implementation
// ============================================================================

/// Stateless analytics service over a [`SnapshotSource`].
pub struct GraphAnalyticsEngine {
    source: Arc<dyn SnapshotSource>,
    config: AnalyticsConfig,
}

impl GraphAnalyticsEngine {
    pub fn new(source: Arc<dyn SnapshotSource>, config: AnalyticsConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Interrupt derived from the configured timeout.
    pub fn interrupt(&self) -> Interrupt {
        Interrupt::from_timeout_ms(self.config.timeout_ms)
    }

    /// Full report, bounded by the configured timeout.
    pub fn report(&self, snapshot: &GraphSnapshot) -> AnalysisResult<GraphReport> {
        self.report_with(snapshot, &self.interrupt())
    }

    /// Full report under a caller-supplied interrupt.
    pub fn report_with(
        &self,
        snapshot: &GraphSnapshot,
        interrupt: &Interrupt,
    ) -> AnalysisResult<GraphReport> {
        compute_report(snapshot, &self.config, interrupt).inspect_err(|e| {
            if matches!(e, AnalysisError::Cancelled | AnalysisError::DeadlineExceeded) {
                tracing::warn!(error = %e, nodes = snapshot.node_count(), "graph report interrupted");
            }
        })
    }

    /// Partition `snapshot` with the algorithm named by `algorithm`.
    pub fn communities(
        &self,
        snapshot: &GraphSnapshot,
        algorithm: &str,
    ) -> AnalysisResult<Vec<Cluster>> {
        let algorithm: CommunityAlgorithm = algorithm.parse()?;
        detect_communities(snapshot, algorithm, &self.config, &self.interrupt())
    }
}

#[async_trait]
impl AnalyticsEngine for GraphAnalyticsEngine {
    async fn analyze_graph(&self, graph_id: &str) -> Result<GraphReport> {
        let snapshot = self.source.snapshot(graph_id).await?;
        Ok(self.report(&snapshot)?)
    }

    async fn analyze_history(&self, graph_id: &str) -> Result<TrendAnalysis> {
        let history = self.source.history(graph_id).await?;
        Ok(analyze_trends(&history))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::source::InMemorySnapshotSource;
    use crate::test_helpers::{path_graph, star_graph, triangle, two_cliques};
    use std::sync::atomic::AtomicBool;

    fn engine_with(source: InMemorySnapshotSource, config: AnalyticsConfig) -> GraphAnalyticsEngine {
        GraphAnalyticsEngine::new(Arc::new(source), config)
    }

    #[test]
    fn test_compute_report_assembles_all_metrics() {
        let g = two_cliques(4);
        let report = compute_report(&g, &AnalyticsConfig::default(), &Interrupt::none()).unwrap();

        assert_eq!(report.node_count, 8);
        assert_eq!(report.link_count, 13);
        assert_eq!(report.metrics.len(), 8);
        assert_eq!(report.communities.len(), 2);
        assert_eq!(report.components.len(), 1);
        assert_eq!(report.bridges, vec!["a_0-b_0".to_string()]);
        assert_eq!(report.articulation_points.len(), 2);
        assert!(report.modularity > 0.0);

        for (id, m) in &report.metrics {
            assert!(m.community_id.is_some(), "{id} has no community");
            assert!((0.0..=1.0).contains(&m.degree));
            assert!((0.0..=1.0).contains(&m.betweenness));
        }
        let a0 = &report.metrics["a_0"];
        let a1 = &report.metrics["a_1"];
        assert!(a0.betweenness > a1.betweenness, "bridge endpoint should dominate");
        assert_ne!(
            report.metrics["a_1"].community_id,
            report.metrics["b_1"].community_id
        );
    }

    #[test]
    fn test_compute_report_star() {
        let report =
            compute_report(&star_graph("X", 5), &AnalyticsConfig::default(), &Interrupt::none())
                .unwrap();
        assert_eq!(report.influential[0].node.id, "X");
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.articulation_points, vec!["X".to_string()]);
        assert_eq!(report.bridges.len(), 5);
        assert_eq!(report.clustering_coefficient, 0.0);
    }

    #[test]
    fn test_compute_report_empty_graph() {
        let report = compute_report(
            &GraphSnapshot::empty(),
            &AnalyticsConfig::default(),
            &Interrupt::none(),
        )
        .unwrap();
        assert_eq!(report.node_count, 0);
        assert!(report.metrics.is_empty());
        assert_eq!(report.density, 0.0);
        assert_eq!(report.modularity, 0.0);
    }

    #[test]
    fn test_compute_report_rejects_invalid_config() {
        let config = AnalyticsConfig {
            pagerank_damping: 1.5,
            ..Default::default()
        };
        let err = compute_report(&triangle(), &config, &Interrupt::none()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_report_with_cancelled_interrupt() {
        let engine = engine_with(InMemorySnapshotSource::new(), AnalyticsConfig::default());
        let interrupt = Interrupt::none().with_flag(Arc::new(AtomicBool::new(true)));
        let err = engine.report_with(&two_cliques(3), &interrupt).unwrap_err();
        assert_eq!(err, AnalysisError::Cancelled);
    }

    #[test]
    fn test_engine_communities_by_name() {
        let engine = engine_with(InMemorySnapshotSource::new(), AnalyticsConfig::default());
        let g = two_cliques(4);
        assert_eq!(engine.communities(&g, "modularity").unwrap().len(), 2);
        assert_eq!(engine.communities(&g, "components").unwrap().len(), 1);
        assert_eq!(
            engine.communities(&g, "spectral").unwrap_err(),
            AnalysisError::InvalidAlgorithm("spectral".to_string())
        );
    }

    #[tokio::test]
    async fn test_analyze_graph_uses_latest_snapshot() {
        let source = InMemorySnapshotSource::new();
        source.insert("vault", path_graph(&["A", "B", "C", "D"])).await;
        source.insert("vault", triangle()).await;
        let engine = engine_with(source, AnalyticsConfig::default());

        let report = engine.analyze_graph("vault").await.unwrap();
        assert_eq!(report.node_count, 3);
        assert!((report.clustering_coefficient - 1.0).abs() < f64::EPSILON);

        assert!(engine.analyze_graph("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_analyze_history() {
        let source = InMemorySnapshotSource::new();
        source.insert("vault", path_graph(&["A", "B"])).await;
        let engine: Arc<dyn AnalyticsEngine> =
            Arc::new(engine_with(source, AnalyticsConfig::default()));

        let trends = engine.analyze_history("vault").await.unwrap();
        assert!(trends.is_insufficient());
    }

    #[tokio::test]
    async fn test_analyze_history_trends() {
        let source = InMemorySnapshotSource::new();
        source.insert("vault", path_graph(&["A", "B"])).await;
        source.insert("vault", path_graph(&["A", "B", "C"])).await;
        let engine = engine_with(source, AnalyticsConfig::default());

        let trends = engine.analyze_history("vault").await.unwrap();
        let report = trends.report().unwrap();
        assert_eq!(report.node_counts, vec![2, 3]);
        assert_eq!(report.node_growth, 1);
    }
}
