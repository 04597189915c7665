//! Path engine.
//!
//! - **Shortest path**: Dijkstra over the undirected, weighted adjacency
//! - **All paths**: bounded DFS enumerating simple paths, sorted by weight
//! - **Path length**: summed shortest-path weights along a node sequence
//!
//! [`ShortestPathTree`] is shared with the centrality calculator, which runs
//! one single-source sweep per node instead of one query per pair.

use petgraph::graph::{EdgeIndex, NodeIndex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::error::AnalysisResult;
use super::interrupt::Interrupt;
use super::models::Path;
use super::snapshot::GraphSnapshot;

// ============================================================================
// Dijkstra
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    cost: f64,
    node: usize,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distances and predecessor links from a single source.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NodeIndex,
    dist: Vec<f64>,
    prev: Vec<Option<(usize, EdgeIndex)>>,
}

impl ShortestPathTree {
    /// Run Dijkstra from `source`. Stops early once `target` is settled.
    ///
    /// Weights must have been checked with [`GraphSnapshot::check_weights`].
    pub fn build(
        graph: &GraphSnapshot,
        adjacency: &[Vec<(usize, EdgeIndex)>],
        source: NodeIndex,
        target: Option<NodeIndex>,
    ) -> Self {
        let n = adjacency.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<(usize, EdgeIndex)>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        dist[source.index()] = 0.0;
        heap.push(State {
            cost: 0.0,
            node: source.index(),
        });

        while let Some(State { cost, node }) = heap.pop() {
            if cost > dist[node] {
                continue;
            }
            if target.map(|t| t.index()) == Some(node) {
                break;
            }
            for &(next, edge) in &adjacency[node] {
                let candidate = cost + graph.link(edge).weight;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    prev[next] = Some((node, edge));
                    heap.push(State {
                        cost: candidate,
                        node: next,
                    });
                }
            }
        }

        Self { source, dist, prev }
    }

    /// Weighted distance to `idx`, `None` when unreachable.
    pub fn distance(&self, idx: NodeIndex) -> Option<f64> {
        let d = self.dist[idx.index()];
        d.is_finite().then_some(d)
    }

    /// Finite distances, source included.
    pub fn reachable(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.dist
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
    }

    /// Node indices strictly between the source and `target`, nearest-to-target first.
    pub fn intermediates(&self, target: NodeIndex) -> Vec<usize> {
        let mut out = Vec::new();
        if self.distance(target).is_none() {
            return out;
        }
        let mut current = target.index();
        while let Some((before, _)) = self.prev[current] {
            if before == self.source.index() {
                break;
            }
            out.push(before);
            current = before;
        }
        out
    }

    /// Reconstruct the path to `target`.
    pub fn path_to(&self, graph: &GraphSnapshot, target: NodeIndex) -> Option<Path> {
        self.distance(target)?;
        let mut nodes = vec![graph.node(target).clone()];
        let mut links = Vec::new();
        let mut current = target.index();
        while let Some((before, edge)) = self.prev[current] {
            links.push(graph.link(edge).clone());
            nodes.push(graph.node(NodeIndex::new(before)).clone());
            current = before;
        }
        nodes.reverse();
        links.reverse();
        Some(Path::from_parts(nodes, links))
    }
}

// ============================================================================
// Shortest path
// ============================================================================

/// Shortest weighted path between two nodes.
///
/// Returns `Ok(None)` when either id is absent or the target is unreachable;
/// use [`GraphSnapshot::contains`] to tell the two apart. A node paired with
/// itself yields the trivial path. Among equally weighted paths any one may be
/// returned.
pub fn shortest_path(
    graph: &GraphSnapshot,
    source_id: &str,
    target_id: &str,
) -> AnalysisResult<Option<Path>> {
    graph.check_weights()?;
    let adjacency = graph.adjacency();
    Ok(shortest_path_in(graph, &adjacency, source_id, target_id))
}

fn shortest_path_in(
    graph: &GraphSnapshot,
    adjacency: &[Vec<(usize, EdgeIndex)>],
    source_id: &str,
    target_id: &str,
) -> Option<Path> {
    let source = graph.get_index(source_id)?;
    let target = graph.get_index(target_id)?;
    if source == target {
        return Some(Path::trivial(graph.node(source).clone()));
    }
    ShortestPathTree::build(graph, adjacency, source, Some(target)).path_to(graph, target)
}

// ============================================================================
// All simple paths
// ============================================================================

/// Every simple path of at most `max_length` hops, ascending by weight.
///
/// Exponential in the worst case; `max_length` and `interrupt` bound the work.
/// Parallel links yield distinct paths.
pub fn all_paths(
    graph: &GraphSnapshot,
    source_id: &str,
    target_id: &str,
    max_length: usize,
    interrupt: &Interrupt,
) -> AnalysisResult<Vec<Path>> {
    graph.check_weights()?;
    let (Some(source), Some(target)) = (graph.get_index(source_id), graph.get_index(target_id))
    else {
        return Ok(vec![]);
    };
    if source == target {
        return Ok(vec![Path::trivial(graph.node(source).clone())]);
    }

    let adjacency = graph.adjacency();
    let mut search = SimplePathSearch {
        adjacency: &adjacency,
        target: target.index(),
        max_length,
        interrupt,
        visited: vec![false; adjacency.len()],
        nodes: vec![source.index()],
        edges: Vec::with_capacity(max_length.min(adjacency.len())),
        found: Vec::new(),
    };
    search.visited[source.index()] = true;
    search.dfs(source.index())?;

    let mut paths: Vec<Path> = search
        .found
        .into_iter()
        .map(|(nodes, edges)| {
            Path::from_parts(
                nodes
                    .into_iter()
                    .map(|i| graph.node(NodeIndex::new(i)).clone())
                    .collect(),
                edges.into_iter().map(|e| graph.link(e).clone()).collect(),
            )
        })
        .collect();
    paths.sort_by(|a, b| {
        a.weight
            .total_cmp(&b.weight)
            .then_with(|| a.length.cmp(&b.length))
    });

    tracing::debug!(
        source = source_id,
        target = target_id,
        max_length,
        found = paths.len(),
        "all_paths search complete"
    );
    Ok(paths)
}

struct SimplePathSearch<'a> {
    adjacency: &'a [Vec<(usize, EdgeIndex)>],
    target: usize,
    max_length: usize,
    interrupt: &'a Interrupt,
    visited: Vec<bool>,
    nodes: Vec<usize>,
    edges: Vec<EdgeIndex>,
    found: Vec<(Vec<usize>, Vec<EdgeIndex>)>,
}

impl SimplePathSearch<'_> {
    fn dfs(&mut self, u: usize) -> AnalysisResult<()> {
        self.interrupt.check()?;
        if u == self.target {
            self.found.push((self.nodes.clone(), self.edges.clone()));
            return Ok(());
        }
        if self.edges.len() >= self.max_length {
            return Ok(());
        }
        let adjacency = self.adjacency;
        for &(v, edge) in adjacency[u].iter() {
            if self.visited[v] {
                continue;
            }
            self.visited[v] = true;
            self.nodes.push(v);
            self.edges.push(edge);
            self.dfs(v)?;
            self.edges.pop();
            self.nodes.pop();
            self.visited[v] = false;
        }
        Ok(())
    }
}

// ============================================================================
// Path length
// ============================================================================

/// Sum of shortest-path weights between consecutive ids.
///
/// Fewer than two ids → `0.0`; any unreachable (or absent) pair → `+∞`.
pub fn path_length(graph: &GraphSnapshot, ids: &[&str]) -> AnalysisResult<f64> {
    if ids.len() < 2 {
        return Ok(0.0);
    }
    graph.check_weights()?;
    let adjacency = graph.adjacency();

    let mut total = 0.0;
    for pair in ids.windows(2) {
        match shortest_path_in(graph, &adjacency, pair[0], pair[1]) {
            Some(path) => total += path.weight,
            None => return Ok(f64::INFINITY),
        }
    }
    Ok(total)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::error::AnalysisError;
    use crate::graph::models::Link;
    use crate::test_helpers::{disconnected_graph, note, path_graph, snapshot};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn weighted_triangle() -> GraphSnapshot {
        // A–B (1), B–C (1), A–C (5)
        GraphSnapshot::new(
            vec![note("A"), note("B"), note("C")],
            vec![
                Link::new("ab", "A", "B"),
                Link::new("bc", "B", "C"),
                Link::new("ac", "A", "C").with_weight(5.0),
            ],
        )
        .unwrap()
    }

    // --- shortest_path ---

    #[test]
    fn test_shortest_path_chain() {
        let g = path_graph(&["A", "B", "C", "D"]);
        let path = shortest_path(&g, "A", "D").unwrap().unwrap();
        assert_eq!(path.node_ids(), vec!["A", "B", "C", "D"]);
        assert_eq!(path.length, 3);
        assert!((path.weight - 3.0).abs() < f64::EPSILON);
        assert_eq!(path.nodes.len(), path.links.len() + 1);
    }

    #[test]
    fn test_shortest_path_prefers_lighter_route() {
        let g = weighted_triangle();
        let path = shortest_path(&g, "A", "C").unwrap().unwrap();
        assert_eq!(path.node_ids(), vec!["A", "B", "C"]);
        assert!((path.weight - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shortest_path_ignores_direction() {
        let g = path_graph(&["A", "B", "C"]);
        let path = shortest_path(&g, "C", "A").unwrap().unwrap();
        assert_eq!(path.node_ids(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_shortest_path_trivial() {
        let g = snapshot(&["solo"], &[]);
        let path = shortest_path(&g, "solo", "solo").unwrap().unwrap();
        assert_eq!(path.length, 0);
        assert!(path.links.is_empty());
        assert_eq!(path.node_ids(), vec!["solo"]);
    }

    #[test]
    fn test_shortest_path_unreachable_and_absent() {
        let g = disconnected_graph();
        assert!(shortest_path(&g, "c1_a", "c2_x").unwrap().is_none());
        assert!(shortest_path(&g, "c1_a", "missing").unwrap().is_none());
        assert!(shortest_path(&g, "missing", "missing").unwrap().is_none());
    }

    #[test]
    fn test_shortest_path_rejects_negative_weight() {
        let g = GraphSnapshot::new(
            vec![note("A"), note("B")],
            vec![Link::new("ab", "A", "B").with_weight(-3.0)],
        )
        .unwrap();
        assert!(matches!(
            shortest_path(&g, "A", "B"),
            Err(AnalysisError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_tree_intermediates() {
        let g = path_graph(&["A", "B", "C", "D"]);
        let a = g.get_index("A").unwrap();
        let tree = ShortestPathTree::build(&g, &g.adjacency(), a, None);
        let d = g.get_index("D").unwrap();
        let mid: Vec<&str> = tree
            .intermediates(d)
            .into_iter()
            .map(|i| g.node(NodeIndex::new(i)).id.as_str())
            .collect();
        assert_eq!(mid, vec!["C", "B"]);
        assert!(tree.intermediates(g.get_index("B").unwrap()).is_empty());
        assert_eq!(tree.reachable().count(), 4);
    }

    // --- all_paths ---

    #[test]
    fn test_all_paths_diamond_sorted_by_weight() {
        // A–B–D (1 + 1) and A–C–D (2 + 2)
        let g = GraphSnapshot::new(
            vec![note("A"), note("B"), note("C"), note("D")],
            vec![
                Link::new("ab", "A", "B"),
                Link::new("bd", "B", "D"),
                Link::new("ac", "A", "C").with_weight(2.0),
                Link::new("cd", "C", "D").with_weight(2.0),
            ],
        )
        .unwrap();
        let paths = all_paths(&g, "A", "D", 5, &Interrupt::none()).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].node_ids(), vec!["A", "B", "D"]);
        assert!((paths[0].weight - 2.0).abs() < f64::EPSILON);
        assert!((paths[1].weight - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_paths_respects_max_length() {
        let g = weighted_triangle();
        let all = all_paths(&g, "A", "C", 5, &Interrupt::none()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].length, 2); // A–B–C weighs 2, A–C weighs 5

        let direct_only = all_paths(&g, "A", "C", 1, &Interrupt::none()).unwrap();
        assert_eq!(direct_only.len(), 1);
        assert_eq!(direct_only[0].node_ids(), vec!["A", "C"]);
    }

    #[test]
    fn test_all_paths_unbounded_hop_limit() {
        let g = path_graph(&["A", "B", "C"]);
        let paths = all_paths(&g, "A", "C", usize::MAX, &Interrupt::none()).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].node_ids(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_all_paths_none_found() {
        let g = disconnected_graph();
        let paths = all_paths(&g, "c1_a", "c2_y", 5, &Interrupt::none()).unwrap();
        assert!(paths.is_empty());
        let paths = all_paths(&g, "c1_a", "ghost", 5, &Interrupt::none()).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_all_paths_cancelled() {
        let g = weighted_triangle();
        let interrupt = Interrupt::none().with_flag(Arc::new(AtomicBool::new(true)));
        assert_eq!(
            all_paths(&g, "A", "C", 5, &interrupt).unwrap_err(),
            AnalysisError::Cancelled
        );
    }

    // --- path_length ---

    #[test]
    fn test_path_length() {
        let g = weighted_triangle();
        assert!((path_length(&g, &["A", "C"]).unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((path_length(&g, &["A", "B", "A"]).unwrap() - 2.0).abs() < f64::EPSILON);
        assert_eq!(path_length(&g, &["A"]).unwrap(), 0.0);
        assert_eq!(path_length(&g, &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_path_length_unreachable_is_infinite() {
        let g = disconnected_graph();
        assert!(path_length(&g, &["c1_a", "c1_c", "c2_x"])
            .unwrap()
            .is_infinite());
    }
}
