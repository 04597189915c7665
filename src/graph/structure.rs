//! Structural analyzer.
//!
//! - **Connected components**: BFS over the undirected view (shared with
//!   community detection and trend analysis)
//! - **Clustering coefficient**: local triangles / possible triangles
//! - **Density**: links over possible pairs
//! - **Bridges / articulation points**: Tarjan low-link DFS, linear time
//!
//! The low-link search runs on an explicit stack and skips the parent *link*
//! rather than the parent node, so parallel links are never reported as
//! bridges. Its output matches the removal definition: a link is a bridge (a
//! node an articulation point) exactly when deleting it raises the component
//! count.

use petgraph::graph::{EdgeIndex, NodeIndex};
use std::collections::{HashMap, VecDeque};

use super::error::AnalysisResult;
use super::interrupt::Interrupt;
use super::models::{ComponentInfo, Link, Node};
use super::snapshot::GraphSnapshot;

// ============================================================================
// Connected Components
// ============================================================================

/// Identify connected components.
///
/// Returns `(node_to_component, component_infos)`, components sorted by size
/// (largest first, discovery order among equals).
pub fn connected_components(graph: &GraphSnapshot) -> (HashMap<String, u32>, Vec<ComponentInfo>) {
    let adjacency = graph.adjacency();
    let n = adjacency.len();
    if n == 0 {
        return (HashMap::new(), vec![]);
    }

    let mut component_of: Vec<Option<u32>> = vec![None; n];
    let mut members: Vec<Vec<String>> = Vec::new();

    for start in 0..n {
        if component_of[start].is_some() {
            continue;
        }
        let component_id = members.len() as u32;
        let mut current_members = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        component_of[start] = Some(component_id);

        while let Some(current) = queue.pop_front() {
            current_members.push(graph.node(NodeIndex::new(current)).id.clone());
            for &(neighbor, _) in &adjacency[current] {
                if component_of[neighbor].is_none() {
                    component_of[neighbor] = Some(component_id);
                    queue.push_back(neighbor);
                }
            }
        }
        members.push(current_members);
    }

    let mut node_map = HashMap::with_capacity(n);
    for (id, m) in members.iter().enumerate() {
        for node_id in m {
            node_map.insert(node_id.clone(), id as u32);
        }
    }

    let max_size = members.iter().map(Vec::len).max().unwrap_or(0);
    let mut components: Vec<ComponentInfo> = members
        .into_iter()
        .enumerate()
        .map(|(id, members)| ComponentInfo {
            id: id as u32,
            size: members.len(),
            is_main: members.len() == max_size,
            members,
        })
        .collect();
    components.sort_by_key(|c| std::cmp::Reverse(c.size));

    (node_map, components)
}

/// Number of connected components.
pub fn component_count(graph: &GraphSnapshot) -> usize {
    petgraph::algo::connected_components(graph.graph())
}

// ============================================================================
// Clustering Coefficient
// ============================================================================

/// Local clustering coefficient per node; `0.0` for nodes with fewer than two
/// distinct neighbors.
pub fn local_clustering(graph: &GraphSnapshot) -> HashMap<String, f64> {
    let g = graph.graph();
    let mut result = HashMap::with_capacity(g.node_count());

    for idx in g.node_indices() {
        let neighbors: Vec<NodeIndex> = graph.neighbor_set(idx).into_iter().collect();
        let k = neighbors.len();
        if k < 2 {
            result.insert(graph.node(idx).id.clone(), 0.0);
            continue;
        }

        let mut triangles = 0usize;
        for i in 0..k {
            for j in (i + 1)..k {
                if g.contains_edge(neighbors[i], neighbors[j]) {
                    triangles += 1;
                }
            }
        }

        let possible = k * (k - 1) / 2;
        result.insert(graph.node(idx).id.clone(), triangles as f64 / possible as f64);
    }

    result
}

/// Mean local clustering coefficient over nodes of degree ≥ 2.
///
/// Nodes of lower degree are left out of the average; `0.0` when none qualify.
pub fn clustering_coefficient(graph: &GraphSnapshot) -> f64 {
    let local = local_clustering(graph);
    let eligible: Vec<f64> = graph
        .graph()
        .node_indices()
        .filter(|&idx| graph.degree(idx) >= 2)
        .filter_map(|idx| local.get(&graph.node(idx).id).copied())
        .collect();
    if eligible.is_empty() {
        0.0
    } else {
        eligible.iter().sum::<f64>() / eligible.len() as f64
    }
}

// ============================================================================
// Density
// ============================================================================

/// `links / (N·(N-1)/2)`; `0.0` for fewer than two nodes.
pub fn network_density(graph: &GraphSnapshot) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    let possible = (n * (n - 1)) as f64 / 2.0;
    graph.link_count() as f64 / possible
}

// ============================================================================
// Bridges & Articulation Points (Tarjan low-link)
// ============================================================================

const UNVISITED: usize = usize::MAX;

struct Frame {
    node: usize,
    parent_link: Option<EdgeIndex>,
    next: usize,
    children: usize,
}

struct CutStructure {
    bridges: Vec<EdgeIndex>,
    is_cut: Vec<bool>,
}

fn cut_structure(graph: &GraphSnapshot, interrupt: &Interrupt) -> AnalysisResult<CutStructure> {
    let adjacency = graph.adjacency();
    let n = adjacency.len();
    let mut disc = vec![UNVISITED; n];
    let mut low = vec![UNVISITED; n];
    let mut time = 0usize;
    let mut bridges = Vec::new();
    let mut is_cut = vec![false; n];

    for root in 0..n {
        if disc[root] != UNVISITED {
            continue;
        }
        interrupt.check()?;
        disc[root] = time;
        low[root] = time;
        time += 1;
        let mut stack = vec![Frame {
            node: root,
            parent_link: None,
            next: 0,
            children: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let u = frame.node;
            if frame.next < adjacency[u].len() {
                let (v, link) = adjacency[u][frame.next];
                frame.next += 1;
                if frame.parent_link == Some(link) {
                    continue;
                }
                if disc[v] == UNVISITED {
                    frame.children += 1;
                    interrupt.check()?;
                    disc[v] = time;
                    low[v] = time;
                    time += 1;
                    stack.push(Frame {
                        node: v,
                        parent_link: Some(link),
                        next: 0,
                        children: 0,
                    });
                } else {
                    low[u] = low[u].min(disc[v]);
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            match stack.last() {
                Some(parent) => {
                    let p = parent.node;
                    low[p] = low[p].min(low[done.node]);
                    if low[done.node] > disc[p] {
                        if let Some(link) = done.parent_link {
                            bridges.push(link);
                        }
                    }
                    if parent.parent_link.is_some() && low[done.node] >= disc[p] {
                        is_cut[p] = true;
                    }
                }
                None => {
                    if done.children > 1 {
                        is_cut[done.node] = true;
                    }
                }
            }
        }
    }

    bridges.sort();
    Ok(CutStructure { bridges, is_cut })
}

/// Links whose removal disconnects their endpoints.
pub fn find_bridges(graph: &GraphSnapshot, interrupt: &Interrupt) -> AnalysisResult<Vec<Link>> {
    let cuts = cut_structure(graph, interrupt)?;
    tracing::debug!(bridges = cuts.bridges.len(), "bridge search complete");
    Ok(cuts
        .bridges
        .into_iter()
        .map(|e| graph.link(e).clone())
        .collect())
}

/// Nodes whose removal increases the number of connected components.
pub fn find_articulation_points(
    graph: &GraphSnapshot,
    interrupt: &Interrupt,
) -> AnalysisResult<Vec<Node>> {
    let cuts = cut_structure(graph, interrupt)?;
    Ok(cuts
        .is_cut
        .iter()
        .enumerate()
        .filter(|&(_, &cut)| cut)
        .map(|(i, _)| graph.node(NodeIndex::new(i)).clone())
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
