//! Graph analytics data models.
//!
//! Defines the complete type system for graph analytics:
//!
//! ## Input types (snapshot)
//! - [`NodeType`] / [`Node`]: knowledge entities (notes, tags, folders, concepts)
//! - [`LinkType`] / [`Link`]: relationships between entities, always by plain id
//!
//! ## Output types (analytics)
//! - [`Path`]: an ordered walk through the graph with hop count and weight
//! - [`Cluster`]: one community of a partition
//! - [`ComponentInfo`]: metadata about a connected component
//! - [`ScoredNode`] / [`Anomaly`]: ranked nodes
//! - [`NodeMetrics`]: per-node scores gathered into a [`GraphReport`]
//!
//! ## Configuration
//! - [`AnalyticsConfig`]: tuning parameters for the analytics algorithms
//! - [`CommunityAlgorithm`]: partitioning strategy selector

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::error::{AnalysisError, AnalysisResult};

// ============================================================================
// Input types: Graph structure
// ============================================================================

/// Kind of knowledge entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Tag,
    Note,
    Folder,
    Concept,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag => write!(f, "tag"),
            Self::Note => write!(f, "note"),
            Self::Folder => write!(f, "folder"),
            Self::Concept => write!(f, "concept"),
        }
    }
}

/// A graph vertex. Identity and equality are by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Entity kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Free-form attributes carried through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_type,
            attributes: BTreeMap::new(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Kind of relationship between two entities.
///
/// Direction is metadata only; every traversal treats links as undirected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Note-to-note reference (wiki link, mention)
    #[default]
    Reference,
    /// Tag membership
    Tag,
    /// Folder / parent-child hierarchy
    Hierarchy,
    /// Loose association
    Related,
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Tag => write!(f, "tag"),
            Self::Hierarchy => write!(f, "hierarchy"),
            Self::Related => write!(f, "related"),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A graph edge between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Relationship kind
    #[serde(rename = "type", default)]
    pub link_type: LinkType,
    /// Traversal cost (default: 1.0)
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Link {
    /// A unit-weight reference link.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            link_type: LinkType::default(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

// ============================================================================
// Output types: Paths and partitions
// ============================================================================

/// A walk through the graph.
///
/// Invariant: `nodes.len() == links.len() + 1`, `length == links.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Hop count
    pub length: usize,
    /// Sum of traversed link weights
    pub weight: f64,
}

impl Path {
    /// Zero-hop path from a node to itself.
    pub fn trivial(node: Node) -> Self {
        Self {
            nodes: vec![node],
            links: vec![],
            length: 0,
            weight: 0.0,
        }
    }

    /// Build a path from its parts; length and weight are derived.
    pub fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let weight = links.iter().map(|l| l.weight).sum();
        Self {
            length: links.len(),
            nodes,
            links,
            weight,
        }
    }

    /// Node ids in traversal order.
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

/// One community of a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster identifier (`community-<n>`)
    pub id: String,
    /// Member node ids, sorted
    pub nodes: Vec<String>,
    /// Human-readable label derived from the most connected member
    pub label: String,
    /// Id of the most connected member
    pub centroid: Option<String>,
    /// Display color hint
    pub color: Option<String>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }
}

/// Metadata about a connected component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Component identifier
    pub id: u32,
    /// Number of nodes in this component
    pub size: usize,
    /// Node IDs belonging to this component
    pub members: Vec<String>,
    /// Whether this is the largest (main) component
    pub is_main: bool,
}

/// A node paired with a score (similarity, influence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node: Node,
    pub score: f64,
}

pub const DEGREE_ANOMALY_HIGH: &str = "degree anomaly: high";
pub const DEGREE_ANOMALY_LOW: &str = "degree anomaly: low";

/// A statistical outlier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub node: Node,
    /// Signed z-score of the node's degree centrality
    pub score: f64,
    pub reason: String,
}

// ============================================================================
// Aggregated analytics result
// ============================================================================

/// Per-node scores computed for a [`GraphReport`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Normalized degree centrality (0.0–1.0)
    pub degree: f64,
    /// Closeness centrality
    pub closeness: f64,
    /// Betweenness centrality (0.0–1.0)
    pub betweenness: f64,
    /// PageRank score
    pub pagerank: f64,
    /// Mean of degree centrality and PageRank
    pub influence: f64,
    /// Local clustering coefficient (0.0–1.0)
    pub clustering_coefficient: f64,
    /// Id of the cluster this node belongs to
    pub community_id: Option<String>,
    /// Connected component ID
    pub component_id: u32,
}

/// Complete result of analyzing one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphReport {
    /// Per-node metrics keyed by node ID
    pub metrics: HashMap<String, NodeMetrics>,
    /// Community partition
    pub communities: Vec<Cluster>,
    /// Connected component summaries
    pub components: Vec<ComponentInfo>,
    /// Ids of bridge links
    pub bridges: Vec<String>,
    /// Ids of articulation-point nodes
    pub articulation_points: Vec<String>,
    /// Degree outliers
    pub anomalies: Vec<Anomaly>,
    /// Top nodes by influence
    pub influential: Vec<ScoredNode>,
    /// Modularity of `communities`
    pub modularity: f64,
    /// Link density
    pub density: f64,
    /// Mean local clustering coefficient
    pub clustering_coefficient: f64,
    /// Total number of nodes analyzed
    pub node_count: usize,
    /// Total number of links analyzed
    pub link_count: usize,
    /// Computation time in milliseconds
    pub computation_ms: u64,
    /// When the report was computed
    pub computed_at: DateTime<Utc>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Partitioning strategy for community detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityAlgorithm {
    /// Greedy modularity optimization (local moves + aggregation)
    #[default]
    #[serde(alias = "modularity")]
    Louvain,
    /// One cluster per connected component
    #[serde(alias = "components")]
    ConnectedComponents,
}

impl FromStr for CommunityAlgorithm {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "louvain" | "modularity" => Ok(Self::Louvain),
            "components" | "connected_components" => Ok(Self::ConnectedComponents),
            other => Err(AnalysisError::InvalidAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for CommunityAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Louvain => write!(f, "louvain"),
            Self::ConnectedComponents => write!(f, "connected_components"),
        }
    }
}

/// Tuning parameters for graph analytics algorithms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// PageRank damping factor (default: 0.85)
    pub pagerank_damping: f64,
    /// PageRank convergence tolerance on the max per-node delta (default: 1e-6)
    pub pagerank_tolerance: f64,
    /// PageRank maximum iterations (default: 100)
    pub pagerank_max_iterations: usize,
    /// Hop bound for all-paths enumeration (default: 5)
    pub max_path_length: usize,
    /// Minimum Jaccard score for similar-node search (default: 0.1)
    pub similarity_threshold: f64,
    /// Number of influential nodes in a report (default: 10)
    pub influence_top_k: usize,
    /// |z| above which a degree is anomalous (default: 2.0)
    pub anomaly_z_threshold: f64,
    /// Community detection strategy (default: louvain)
    pub community_algorithm: CommunityAlgorithm,
    /// Louvain resolution parameter (default: 1.0, higher = smaller communities)
    pub louvain_resolution: f64,
    /// Louvain maximum local-move sweeps per level (default: 100)
    pub louvain_max_iterations: usize,
    /// Wall-clock budget for a full report, in milliseconds (default: none)
    pub timeout_ms: Option<u64>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_tolerance: 1e-6,
            pagerank_max_iterations: 100,
            max_path_length: 5,
            similarity_threshold: 0.1,
            influence_top_k: 10,
            anomaly_z_threshold: 2.0,
            community_algorithm: CommunityAlgorithm::Louvain,
            louvain_resolution: 1.0,
            louvain_max_iterations: 100,
            timeout_ms: None,
        }
    }
}

impl AnalyticsConfig {
    /// Reject out-of-range parameters.
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(0.0..=1.0).contains(&self.pagerank_damping) {
            return Err(AnalysisError::InvalidConfig(format!(
                "pagerank_damping must be within [0, 1], got {}",
                self.pagerank_damping
            )));
        }
        if !(self.pagerank_tolerance >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "pagerank_tolerance must be non-negative, got {}",
                self.pagerank_tolerance
            )));
        }
        if self.pagerank_max_iterations == 0 || self.louvain_max_iterations == 0 {
            return Err(AnalysisError::InvalidConfig(
                "iteration caps must be at least 1".to_string(),
            ));
        }
        if !(self.louvain_resolution > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "louvain_resolution must be positive, got {}",
                self.louvain_resolution
            )));
        }
        if !(self.similarity_threshold >= 0.0) || !(self.anomaly_z_threshold >= 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "thresholds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
