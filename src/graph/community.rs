//! Community detection and partition scoring.
//!
//! Two partitioners, selected by [`CommunityAlgorithm`]:
//!
//! - **Louvain**: greedy modularity optimization. Nodes are visited in index
//!   order and moved to the neighboring community with the best gain (ties go
//!   to the lowest community id), then communities are collapsed into single
//!   nodes and the process repeats until a level produces no move.
//! - **Connected components**: every component is one cluster.
//!
//! Both work on the unweighted multigraph: every non-loop link counts once,
//! whatever its weight.

use petgraph::graph::NodeIndex;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use super::error::AnalysisResult;
use super::interrupt::Interrupt;
use super::models::{AnalyticsConfig, Cluster, CommunityAlgorithm, NodeType};
use super::snapshot::GraphSnapshot;
use super::structure::connected_components;

const GAIN_EPSILON: f64 = 1e-12;

const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// Partition the graph into clusters.
///
/// Clusters are disjoint and cover every node. They are ordered by size
/// (largest first), then by smallest member id, and numbered `community-<n>`
/// in that order.
pub fn detect_communities(
    graph: &GraphSnapshot,
    algorithm: CommunityAlgorithm,
    config: &AnalyticsConfig,
    interrupt: &Interrupt,
) -> AnalysisResult<Vec<Cluster>> {
    let membership = match algorithm {
        CommunityAlgorithm::Louvain => louvain(graph, config, interrupt)?,
        CommunityAlgorithm::ConnectedComponents => {
            interrupt.check()?;
            component_membership(graph)
        }
    };
    let clusters = build_clusters(graph, &membership);
    tracing::debug!(%algorithm, clusters = clusters.len(), "community detection complete");
    Ok(clusters)
}

/// Node id → cluster id.
pub fn community_membership(clusters: &[Cluster]) -> HashMap<String, String> {
    clusters
        .iter()
        .flat_map(|c| c.nodes.iter().map(move |n| (n.clone(), c.id.clone())))
        .collect()
}

// ============================================================================
// Modularity
// ============================================================================

/// Score a partition: `Q = (1/2E) · Σ (1 - k_i·k_j / 2E)` over every non-loop
/// link whose endpoints share a cluster, `k` being the incident-link count.
///
/// Nodes missing from every cluster never share one. `0.0` without links.
pub fn modularity(graph: &GraphSnapshot, communities: &[Cluster]) -> f64 {
    let membership = community_membership(communities);
    let g = graph.graph();

    let incident: Vec<usize> = g
        .node_indices()
        .map(|idx| graph.incident(idx).count())
        .collect();
    let total = incident.iter().sum::<usize>() as f64; // 2E
    if total == 0.0 {
        return 0.0;
    }

    let mut q = 0.0;
    for edge in g.edge_indices() {
        let Some((a, b)) = g.edge_endpoints(edge) else {
            continue;
        };
        if a == b {
            continue;
        }
        let same = match (
            membership.get(&graph.node(a).id),
            membership.get(&graph.node(b).id),
        ) {
            (Some(ca), Some(cb)) => ca == cb,
            _ => false,
        };
        if same {
            q += 1.0 - (incident[a.index()] * incident[b.index()]) as f64 / total;
        }
    }
    q / total
}

// ============================================================================
// Louvain
// ============================================================================

/// One level of the Louvain hierarchy: collapsed communities as nodes.
struct Level {
    adj: Vec<BTreeMap<usize, f64>>,
    strength: Vec<f64>,
}

impl Level {
    fn from_snapshot(graph: &GraphSnapshot) -> Self {
        let adjacency = graph.adjacency();
        let mut adj = vec![BTreeMap::new(); adjacency.len()];
        let mut strength = vec![0.0; adjacency.len()];
        for (u, neighbors) in adjacency.iter().enumerate() {
            for &(v, _) in neighbors {
                *adj[u].entry(v).or_insert(0.0) += 1.0;
                strength[u] += 1.0;
            }
        }
        Self { adj, strength }
    }

    /// Collapse each community into one node; internal links vanish but keep
    /// their contribution to the node strength.
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut adj = vec![BTreeMap::new(); count];
        let mut strength = vec![0.0; count];
        for (u, neighbors) in self.adj.iter().enumerate() {
            let cu = community[u];
            strength[cu] += self.strength[u];
            for (&v, &w) in neighbors {
                let cv = community[v];
                if cu != cv {
                    *adj[cu].entry(cv).or_insert(0.0) += w;
                }
            }
        }
        Self { adj, strength }
    }
}

fn louvain(
    graph: &GraphSnapshot,
    config: &AnalyticsConfig,
    interrupt: &Interrupt,
) -> AnalysisResult<Vec<usize>> {
    let mut level = Level::from_snapshot(graph);
    let mut membership: Vec<usize> = (0..graph.node_count()).collect();
    let m2: f64 = level.strength.iter().sum();
    if m2 == 0.0 {
        return Ok(membership);
    }

    let mut depth = 0;
    loop {
        let (community, moved) = local_moves(&level, m2, config, interrupt)?;
        if !moved {
            break;
        }
        let (community, count) = renumber(&community);
        for m in membership.iter_mut() {
            *m = community[*m];
        }
        level = level.aggregate(&community, count);
        depth += 1;
        tracing::debug!(depth, communities = count, "louvain level aggregated");
    }

    Ok(membership)
}

/// Greedy local moves on one level. Returns the assignment and whether any
/// node changed community.
fn local_moves(
    level: &Level,
    m2: f64,
    config: &AnalyticsConfig,
    interrupt: &Interrupt,
) -> AnalysisResult<(Vec<usize>, bool)> {
    let n = level.adj.len();
    let resolution = config.louvain_resolution;
    let mut community: Vec<usize> = (0..n).collect();
    let mut sigma_tot = level.strength.clone();

    let mut moved_any = false;
    let mut improved = true;
    let mut iterations = 0;

    while improved && iterations < config.louvain_max_iterations {
        interrupt.check()?;
        improved = false;
        iterations += 1;

        for node in 0..n {
            let current = community[node];

            let mut comm_weights: BTreeMap<usize, f64> = BTreeMap::new();
            for (&neighbor, &w) in &level.adj[node] {
                *comm_weights.entry(community[neighbor]).or_insert(0.0) += w;
            }

            let ki = level.strength[node];
            let w_in_current = comm_weights.get(&current).copied().unwrap_or(0.0);
            let remove_cost =
                w_in_current / m2 - resolution * ki * (sigma_tot[current] - ki) / (m2 * m2);

            let mut best_comm = current;
            let mut best_gain = 0.0;
            for (&target, &w_to_target) in &comm_weights {
                if target == current {
                    continue;
                }
                let insert_cost = w_to_target / m2 - resolution * ki * sigma_tot[target] / (m2 * m2);
                let gain = insert_cost - remove_cost;
                if gain > best_gain + GAIN_EPSILON {
                    best_gain = gain;
                    best_comm = target;
                }
            }

            if best_comm != current {
                sigma_tot[current] -= ki;
                sigma_tot[best_comm] += ki;
                community[node] = best_comm;
                improved = true;
                moved_any = true;
            }
        }
    }

    Ok((community, moved_any))
}

/// Renumber to contiguous ids in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let renumbered = community
        .iter()
        .map(|c| {
            let next = remap.len();
            *remap.entry(*c).or_insert(next)
        })
        .collect();
    (renumbered, remap.len())
}

// ============================================================================
// Connected-components partition
// ============================================================================

fn component_membership(graph: &GraphSnapshot) -> Vec<usize> {
    let (node_map, _) = connected_components(graph);
    graph
        .graph()
        .node_indices()
        .map(|idx| node_map.get(&graph.node(idx).id).copied().unwrap_or(0) as usize)
        .collect()
}

// ============================================================================
// Cluster assembly
// ============================================================================

fn build_clusters(graph: &GraphSnapshot, membership: &[usize]) -> Vec<Cluster> {
    let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
    for (i, &c) in membership.iter().enumerate() {
        groups.entry(c).or_default().push(NodeIndex::new(i));
    }

    let mut groups: Vec<Vec<NodeIndex>> = groups.into_values().collect();
    for members in groups.iter_mut() {
        members.sort_by(|&a, &b| graph.node(a).id.cmp(&graph.node(b).id));
    }
    groups.sort_by(|a, b| {
        Reverse(a.len())
            .cmp(&Reverse(b.len()))
            .then_with(|| graph.node(a[0]).id.cmp(&graph.node(b[0]).id))
    });

    groups
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            let centroid = representative(graph, &members);
            let label = match centroid {
                Some(idx) if members.len() > 1 => {
                    format!("{} +{}", graph.node(idx).title, members.len() - 1)
                }
                Some(idx) => graph.node(idx).title.clone(),
                None => format!("community-{i}"),
            };
            Cluster {
                id: format!("community-{i}"),
                nodes: members.iter().map(|&m| graph.node(m).id.clone()).collect(),
                label,
                centroid: centroid.map(|idx| graph.node(idx).id.clone()),
                color: Some(PALETTE[i % PALETTE.len()].to_string()),
            }
        })
        .collect()
}

/// Most connected member, tags first, smallest id on ties.
fn representative(graph: &GraphSnapshot, members: &[NodeIndex]) -> Option<NodeIndex> {
    members.iter().copied().max_by(|&a, &b| {
        let (na, nb) = (graph.node(a), graph.node(b));
        (na.node_type == NodeType::Tag)
            .cmp(&(nb.node_type == NodeType::Tag))
            .then(graph.degree(a).cmp(&graph.degree(b)))
            .then(nb.id.cmp(&na.id))
    })
}

// ============================================================================
// Tests
// ============================================================================
