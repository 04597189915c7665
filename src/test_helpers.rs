//! Shared graph fixtures for unit tests.

use crate::graph::models::{Link, Node, NodeType};
use crate::graph::snapshot::GraphSnapshot;

/// A note node whose title is the upper-cased id.
pub fn note(id: &str) -> Node {
    Node::new(id, id.to_uppercase(), NodeType::Note)
}

/// A tag node whose title is the upper-cased id.
pub fn tag(id: &str) -> Node {
    Node::new(id, id.to_uppercase(), NodeType::Tag)
}

/// Unit-weight link with id `"<a>-<b>"`.
pub fn link(a: &str, b: &str) -> Link {
    Link::new(format!("{a}-{b}"), a, b)
}

/// Build a snapshot of note nodes and unit-weight links.
pub fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
    GraphSnapshot::new(
        ids.iter().map(|id| note(id)).collect(),
        edges.iter().map(|(a, b)| link(a, b)).collect(),
    )
    .expect("fixture graph is well formed")
}

/// Linear chain: ids[0] – ids[1] – … – ids[n-1]
pub fn path_graph(ids: &[&str]) -> GraphSnapshot {
    let edges: Vec<(&str, &str)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
    snapshot(ids, &edges)
}

/// Star graph: `center` linked to `leaf_0 … leaf_{n-1}`.
pub fn star_graph(center: &str, n_leaves: usize) -> GraphSnapshot {
    let mut nodes = vec![note(center)];
    let mut links = Vec::new();
    for i in 0..n_leaves {
        let id = format!("leaf_{i}");
        links.push(link(center, &id));
        nodes.push(note(&id));
    }
    GraphSnapshot::new(nodes, links).expect("fixture graph is well formed")
}

/// Complete graph K_n on `node_0 … node_{n-1}`.
pub fn complete_graph(n: usize) -> GraphSnapshot {
    let names: Vec<String> = (0..n).map(|i| format!("node_{i}")).collect();
    let mut links = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            links.push(link(&names[i], &names[j]));
        }
    }
    GraphSnapshot::new(names.iter().map(|n| note(n)).collect(), links)
        .expect("fixture graph is well formed")
}

/// Triangle A – B – C – A
pub fn triangle() -> GraphSnapshot {
    snapshot(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")])
}

/// Two cliques `a_*` and `b_*` joined by the single link `a_0 – b_0`.
pub fn two_cliques(size: usize) -> GraphSnapshot {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    for prefix in ["a", "b"] {
        let names: Vec<String> = (0..size).map(|i| format!("{prefix}_{i}")).collect();
        for i in 0..size {
            for j in (i + 1)..size {
                links.push(link(&names[i], &names[j]));
            }
        }
        nodes.extend(names.iter().map(|n| note(n)));
    }
    links.push(link("a_0", "b_0"));
    GraphSnapshot::new(nodes, links).expect("fixture graph is well formed")
}

/// Two components: c1_a – c1_b – c1_c and c2_x – c2_y
pub fn disconnected_graph() -> GraphSnapshot {
    snapshot(
        &["c1_a", "c1_b", "c1_c", "c2_x", "c2_y"],
        &[("c1_a", "c1_b"), ("c1_b", "c1_c"), ("c2_x", "c2_y")],
    )
}

/// Same nodes, every link except `link_id`.
pub fn without_link(graph: &GraphSnapshot, link_id: &str) -> GraphSnapshot {
    GraphSnapshot::new(
        graph.nodes().cloned().collect(),
        graph.links().filter(|l| l.id != link_id).cloned().collect(),
    )
    .expect("subgraph of a valid graph is valid")
}

/// Every node except `node_id`, and every link not touching it.
pub fn without_node(graph: &GraphSnapshot, node_id: &str) -> GraphSnapshot {
    GraphSnapshot::new(
        graph.nodes().filter(|n| n.id != node_id).cloned().collect(),
        graph
            .links()
            .filter(|l| l.source != node_id && l.target != node_id)
            .cloned()
            .collect(),
    )
    .expect("subgraph of a valid graph is valid")
}
