//! Immutable graph snapshot.
//!
//! [`GraphSnapshot`] wraps a `petgraph::UnGraph<Node, Link>` with an
//! id → `NodeIndex` map. It is the single input of every analysis routine and
//! is never mutated once built. Links always store plain node ids; resolved
//! endpoints are looked up through the index, never stored on the link.
//!
//! Snapshots (de)serialize through [`SnapshotData`], so a JSON document is
//! validated on load exactly like a snapshot built in code.

use chrono::{DateTime, Utc};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::{AnalysisError, AnalysisResult};
use super::models::{Link, Node};

/// Plain serializable form of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// When the snapshot was taken (metadata only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

/// Validated, immutable view of the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SnapshotData", into = "SnapshotData")]
pub struct GraphSnapshot {
    graph: UnGraph<Node, Link>,
    id_to_index: HashMap<String, NodeIndex>,
    captured_at: Option<DateTime<Utc>>,
}

impl GraphSnapshot {
    /// Build a snapshot, rejecting duplicate ids and dangling link endpoints.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> AnalysisResult<Self> {
        let mut graph = UnGraph::with_capacity(nodes.len(), links.len());
        let mut id_to_index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if id_to_index.contains_key(&node.id) {
                return Err(AnalysisError::MalformedGraph(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            let id = node.id.clone();
            let idx = graph.add_node(node);
            id_to_index.insert(id, idx);
        }

        let mut link_ids = HashSet::with_capacity(links.len());
        for link in links {
            if !link_ids.insert(link.id.clone()) {
                return Err(AnalysisError::MalformedGraph(format!(
                    "duplicate link id '{}'",
                    link.id
                )));
            }
            let (Some(&s), Some(&t)) = (id_to_index.get(&link.source), id_to_index.get(&link.target))
            else {
                return Err(AnalysisError::MalformedGraph(format!(
                    "link '{}' references unknown node ('{}' -> '{}')",
                    link.id, link.source, link.target
                )));
            };
            graph.add_edge(s, t, link);
        }

        Ok(Self {
            graph,
            id_to_index,
            captured_at: None,
        })
    }

    /// An empty snapshot.
    pub fn empty() -> Self {
        Self {
            graph: UnGraph::default(),
            id_to_index: HashMap::new(),
            captured_at: None,
        }
    }

    pub fn with_captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Parse and validate a JSON snapshot document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Whether a node with this id is part of the snapshot.
    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        let idx = self.id_to_index.get(id)?;
        self.graph.node_weight(*idx)
    }

    pub fn get_index(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    /// Underlying petgraph graph (node weights are `Node`, edge weights `Link`).
    pub fn graph(&self) -> &UnGraph<Node, Link> {
        &self.graph
    }

    /// Node at a dense index.
    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    /// Link at a dense index.
    pub fn link(&self, idx: EdgeIndex) -> &Link {
        &self.graph[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.graph.edge_weights()
    }

    /// Incident links of `idx` as `(other endpoint, link index)`, self-loops excluded.
    pub fn incident(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
        self.graph.edges(idx).filter_map(move |e| {
            let other = if e.source() == idx { e.target() } else { e.source() };
            (other != idx).then_some((other, e.id()))
        })
    }

    /// Distinct neighbors of `idx`, self excluded.
    pub fn neighbor_set(&self, idx: NodeIndex) -> HashSet<NodeIndex> {
        self.incident(idx).map(|(other, _)| other).collect()
    }

    /// Number of distinct neighbors.
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.neighbor_set(idx).len()
    }

    /// Dense adjacency lists `(neighbor, link)` indexed by `NodeIndex::index()`.
    ///
    /// Algorithms that sweep the whole graph repeatedly build this once.
    pub fn adjacency(&self) -> Vec<Vec<(usize, EdgeIndex)>> {
        self.graph
            .node_indices()
            .map(|idx| {
                self.incident(idx)
                    .map(|(other, e)| (other.index(), e))
                    .collect()
            })
            .collect()
    }

    /// Fail fast on weights that shortest-path routines cannot handle.
    pub fn check_weights(&self) -> AnalysisResult<()> {
        for link in self.links() {
            if !link.weight.is_finite() || link.weight < 0.0 {
                return Err(AnalysisError::InvalidWeight {
                    link_id: link.id.clone(),
                    weight: link.weight,
                });
            }
        }
        Ok(())
    }
}

impl Default for GraphSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<SnapshotData> for GraphSnapshot {
    type Error = AnalysisError;

    fn try_from(data: SnapshotData) -> Result<Self, Self::Error> {
        let snapshot = Self::new(data.nodes, data.links)?;
        Ok(Self {
            captured_at: data.captured_at,
            ..snapshot
        })
    }
}

impl From<GraphSnapshot> for SnapshotData {
    fn from(snapshot: GraphSnapshot) -> Self {
        let (nodes, edges) = snapshot.graph.into_nodes_edges();
        Self {
            nodes: nodes.into_iter().map(|n| n.weight).collect(),
            links: edges.into_iter().map(|e| e.weight).collect(),
            captured_at: snapshot.captured_at,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
