//! Graph analysis engine.
//!
//! Pure, data-in/data-out analytics over an immutable [`GraphSnapshot`] of a
//! note-taking knowledge graph (notes, tags, folders, concepts and the links
//! between them). Every analyzer takes a snapshot by reference and returns a
//! value; nothing is mutated.
//!
//! ## Architecture
//!
//! ```text
//! SnapshotSource ──► GraphSnapshot (petgraph::UnGraph + id index)
//!                          │
//!        ┌────────┬────────┼──────────┬───────────┐
//!      paths  centrality structure  community  ranking
//!        └────────┴────────┼──────────┴───────────┘
//!                          │
//!                  GraphReport / TrendAnalysis
//!                          │
//!               AnalyticsEngine (orchestrator)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Nodes, links, paths, clusters, reports, `AnalyticsConfig`
//! - [`snapshot`]: `GraphSnapshot` construction, validation and (de)serialization
//! - [`paths`]: Dijkstra shortest path, bounded simple-path enumeration
//! - [`centrality`]: Degree, closeness, betweenness, PageRank
//! - [`structure`]: Components, clustering, density, bridges, articulation points
//! - [`community`]: Louvain and component partitions, modularity
//! - [`ranking`]: Jaccard similarity, influence, degree anomalies
//! - [`trends`]: Metric series over snapshot history
//! - [`source`]: `SnapshotSource` trait and in-memory implementation
//! - [`engine`]: `AnalyticsEngine` trait and `GraphAnalyticsEngine` service
//! - [`interrupt`]: Cancellation flag and deadline for long computations
//! - [`error`]: `AnalysisError`

pub mod centrality;
pub mod community;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod models;
pub mod paths;
pub mod ranking;
pub mod snapshot;
pub mod source;
pub mod structure;
pub mod trends;

// Re-export primary types for convenience
pub use engine::{compute_report, AnalyticsEngine, GraphAnalyticsEngine};
pub use error::{AnalysisError, AnalysisResult};
pub use interrupt::Interrupt;
pub use models::{
    AnalyticsConfig, Anomaly, Cluster, CommunityAlgorithm, ComponentInfo, GraphReport, Link,
    LinkType, Node, NodeMetrics, NodeType, Path, ScoredNode,
};
pub use snapshot::{GraphSnapshot, SnapshotData};
pub use source::{InMemorySnapshotSource, SnapshotSource};
pub use trends::{analyze_trends, InsufficientData, TrendAnalysis, TrendReport};
