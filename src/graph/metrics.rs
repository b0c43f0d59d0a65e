//! Structural metrics and node centralities for correlation graphs.
//!
//! Weighted betweenness treats an edge of weight `w` as a path segment of
//! length `1 / |w|`: the stronger the correlation, the shorter the hop.
//! Closeness is unweighted (hop counts).

use crate::graph::types::CorrelationGraph;
use crate::ticker::Ticker;
use ordered_float::OrderedFloat;
use petgraph::algo::connected_components;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// Relative tolerance when comparing weighted path lengths.
const PATH_EPSILON: f64 = 1e-12;

/// Whole-graph statistics for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub nodes: usize,
    pub edges: usize,
    /// 2E / (N(N-1))
    pub density: f64,
    /// 2E / N
    pub average_degree: f64,
    pub average_clustering: f64,
    pub components: usize,
    pub largest_component: usize,
}

/// Centrality scores for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCentrality {
    pub ticker: Ticker,
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
}

/// Adjacency lists indexed like the graph's nodes.
fn neighbors(graph: &CorrelationGraph) -> Vec<Vec<(usize, f64)>> {
    let inner = graph.inner();
    inner
        .node_indices()
        .map(|node| {
            inner
                .edges(node)
                .map(|edge| {
                    let other = if edge.source() == node {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    (other.index(), *edge.weight())
                })
                .collect()
        })
        .collect()
}

/// Sizes of connected components, largest first.
pub fn component_sizes(graph: &CorrelationGraph) -> Vec<usize> {
    let inner = graph.inner();
    let mut sets = UnionFind::new(inner.node_count());
    for edge in inner.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let labels = sets.into_labeling();
    let mut sizes = vec![0usize; labels.len()];
    for label in labels {
        sizes[label] += 1;
    }
    sizes.retain(|&size| size > 0);
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

/// Local clustering coefficient of every node (0 for degree < 2).
pub fn clustering_coefficients(graph: &CorrelationGraph) -> Vec<f64> {
    let inner = graph.inner();
    inner
        .node_indices()
        .map(|node| {
            let adjacent: Vec<_> = inner.neighbors(node).collect();
            let k = adjacent.len();
            if k < 2 {
                return 0.0;
            }
            let mut triangles = 0usize;
            for (position, &u) in adjacent.iter().enumerate() {
                for &w in &adjacent[position + 1..] {
                    if inner.contains_edge(u, w) {
                        triangles += 1;
                    }
                }
            }
            2.0 * triangles as f64 / (k * (k - 1)) as f64
        })
        .collect()
}

/// Whole-graph statistics, or `None` for an edgeless graph.
pub fn compute_window_metrics(graph: &CorrelationGraph) -> Option<WindowMetrics> {
    let n = graph.node_count();
    let e = graph.edge_count();
    if e == 0 || n == 0 {
        return None;
    }

    let clustering = clustering_coefficients(graph);
    let sizes = component_sizes(graph);
    let nodes = n as f64;
    let edges = e as f64;

    Some(WindowMetrics {
        nodes: n,
        edges: e,
        density: if n > 1 { 2.0 * edges / (nodes * (nodes - 1.0)) } else { 0.0 },
        average_degree: 2.0 * edges / nodes,
        average_clustering: clustering.iter().sum::<f64>() / nodes,
        components: connected_components(graph.inner()),
        largest_component: sizes.first().copied().unwrap_or(0),
    })
}

/// Degree, weighted betweenness and closeness centrality for every node,
/// in node order.
pub fn compute_node_centralities(graph: &CorrelationGraph) -> Vec<NodeCentrality> {
    let adjacency = neighbors(graph);
    let degree = degree_centrality(&adjacency);
    let betweenness = betweenness_centrality(&adjacency);
    let closeness = closeness_centrality(&adjacency);

    graph
        .tickers()
        .into_iter()
        .enumerate()
        .map(|(index, ticker)| NodeCentrality {
            ticker: ticker.clone(),
            degree: degree[index],
            betweenness: betweenness[index],
            closeness: closeness[index],
        })
        .collect()
}

fn degree_centrality(adjacency: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let n = adjacency.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    adjacency.iter().map(|edges| edges.len() as f64 * scale).collect()
}

/// Brandes' algorithm with Dijkstra shortest paths over `1 / |weight|`,
/// normalized by `(n-1)(n-2)` for an undirected graph.
fn betweenness_centrality(adjacency: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut centrality = vec![0.0; n];
    if n <= 2 {
        return centrality;
    }

    for source in 0..n {
        let mut order = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut paths = vec![0.0f64; n];
        let mut distance = vec![f64::INFINITY; n];
        let mut settled = vec![false; n];
        let mut heap = BinaryHeap::new();

        paths[source] = 1.0;
        distance[source] = 0.0;
        heap.push(Reverse((OrderedFloat(0.0), source)));

        while let Some(Reverse((OrderedFloat(dist), node))) = heap.pop() {
            if settled[node] {
                continue;
            }
            settled[node] = true;
            order.push(node);

            for &(next, weight) in &adjacency[node] {
                if settled[next] {
                    continue;
                }
                let candidate = dist + 1.0 / weight.abs();
                let tolerance = PATH_EPSILON * candidate.max(1.0);
                if candidate < distance[next] - tolerance {
                    distance[next] = candidate;
                    paths[next] = paths[node];
                    predecessors[next].clear();
                    predecessors[next].push(node);
                    heap.push(Reverse((OrderedFloat(candidate), next)));
                } else if (candidate - distance[next]).abs() <= tolerance {
                    paths[next] += paths[node];
                    predecessors[next].push(node);
                }
            }
        }

        let mut dependency = vec![0.0; n];
        while let Some(node) = order.pop() {
            for &previous in &predecessors[node] {
                dependency[previous] += paths[previous] / paths[node] * (1.0 + dependency[node]);
            }
            if node != source {
                centrality[node] += dependency[node];
            }
        }
    }

    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    centrality.iter_mut().for_each(|value| *value *= scale);
    centrality
}

/// Hop-count closeness with Wasserman-Faust scaling for disconnected graphs.
fn closeness_centrality(adjacency: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let n = adjacency.len();
    (0..n)
        .map(|source| {
            let mut hops = vec![usize::MAX; n];
            let mut queue = VecDeque::from([source]);
            hops[source] = 0;
            let mut reachable = 1usize;
            let mut total = 0usize;

            while let Some(node) = queue.pop_front() {
                for &(next, _) in &adjacency[node] {
                    if hops[next] == usize::MAX {
                        hops[next] = hops[node] + 1;
                        total += hops[next];
                        reachable += 1;
                        queue.push_back(next);
                    }
                }
            }

            if total == 0 || n <= 1 {
                return 0.0;
            }
            let others = (reachable - 1) as f64;
            (others / total as f64) * (others / (n - 1) as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::correlation::CorrelationMatrix;
    use crate::graph::builder::to_graph;

    /// Builds a graph from an explicit edge list via a synthetic correlation matrix.
    fn graph_from_edges(symbols: &[&str], edges: &[(usize, usize, f64)]) -> CorrelationGraph {
        let n = symbols.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
        }
        for &(a, b, weight) in edges {
            values[a][b] = weight;
            values[b][a] = weight;
        }
        let tickers = symbols.iter().map(|s| Ticker::new(*s).unwrap()).collect();
        let corr = CorrelationMatrix::from_values(tickers, values, 10).unwrap();
        to_graph(&corr, 0.3, None).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn path_graph_window_metrics() {
        let graph = graph_from_edges(
            &["A", "B", "C", "D"],
            &[(0, 1, 0.9), (1, 2, 0.9), (2, 3, 0.9)],
        );
        let metrics = compute_window_metrics(&graph).unwrap();
        assert_eq!(metrics.nodes, 4);
        assert_eq!(metrics.edges, 3);
        assert!(close(metrics.density, 0.5));
        assert!(close(metrics.average_degree, 1.5));
        assert_eq!(metrics.average_clustering, 0.0);
        assert_eq!(metrics.components, 1);
        assert_eq!(metrics.largest_component, 4);
    }

    #[test]
    fn edgeless_graph_has_no_metrics() {
        let graph = graph_from_edges(&["A", "B", "C"], &[]);
        assert!(compute_window_metrics(&graph).is_none());
    }

    #[test]
    fn components_count_isolates() {
        let graph = graph_from_edges(
            &["A", "B", "C", "D", "E"],
            &[(0, 1, 0.9), (1, 2, 0.8)],
        );
        let metrics = compute_window_metrics(&graph).unwrap();
        assert_eq!(metrics.components, 3);
        assert_eq!(metrics.largest_component, 3);
        assert_eq!(component_sizes(&graph), vec![3, 1, 1]);
    }

    #[test]
    fn triangle_with_tail_clustering() {
        // A-B-C triangle plus C-D tail
        let graph = graph_from_edges(
            &["A", "B", "C", "D"],
            &[(0, 1, 0.9), (1, 2, 0.9), (0, 2, 0.9), (2, 3, 0.9)],
        );
        let coefficients = clustering_coefficients(&graph);
        assert!(close(coefficients[0], 1.0));
        assert!(close(coefficients[1], 1.0));
        assert!(close(coefficients[2], 1.0 / 3.0));
        assert_eq!(coefficients[3], 0.0);

        let metrics = compute_window_metrics(&graph).unwrap();
        assert!(close(metrics.average_clustering, (2.0 + 1.0 / 3.0) / 4.0));
    }

    #[test]
    fn star_graph_centralities() {
        let graph = graph_from_edges(
            &["HUB", "A", "B", "C"],
            &[(0, 1, 0.9), (0, 2, 0.9), (0, 3, 0.9)],
        );
        let scores = compute_node_centralities(&graph);
        assert_eq!(scores[0].ticker.as_str(), "HUB");
        assert!(close(scores[0].degree, 1.0));
        assert!(close(scores[0].betweenness, 1.0));
        assert!(close(scores[0].closeness, 1.0));

        assert!(close(scores[1].degree, 1.0 / 3.0));
        assert_eq!(scores[1].betweenness, 0.0);
        assert!(close(scores[1].closeness, 3.0 / 5.0));
    }

    #[test]
    fn path_graph_betweenness() {
        let graph = graph_from_edges(
            &["A", "B", "C", "D"],
            &[(0, 1, 0.9), (1, 2, 0.9), (2, 3, 0.9)],
        );
        let scores = compute_node_centralities(&graph);
        let betweenness: Vec<f64> = scores.iter().map(|s| s.betweenness).collect();
        assert!(close(betweenness[0], 0.0));
        assert!(close(betweenness[1], 2.0 / 3.0));
        assert!(close(betweenness[2], 2.0 / 3.0));
        assert!(close(betweenness[3], 0.0));
    }

    #[test]
    fn strong_correlation_shortens_paths() {
        // Two strong hops (length 2.0) beat a weak direct edge (length 2.5).
        let graph = graph_from_edges(
            &["A", "B", "C"],
            &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 0.4)],
        );
        let scores = compute_node_centralities(&graph);
        assert!(close(scores[1].betweenness, 1.0));

        // A strong direct edge (length ~1.1) carries the traffic instead.
        let graph = graph_from_edges(
            &["A", "B", "C"],
            &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, -0.9)],
        );
        let scores = compute_node_centralities(&graph);
        assert!(close(scores[1].betweenness, 0.0));
    }

    #[test]
    fn equal_length_paths_split_dependency() {
        // A-B-C and the direct A-C edge both have length 2.0.
        let graph = graph_from_edges(
            &["A", "B", "C"],
            &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, -0.5)],
        );
        let scores = compute_node_centralities(&graph);
        assert!(close(scores[1].betweenness, 0.5));
    }

    #[test]
    fn isolated_node_centralities_are_zero() {
        let graph = graph_from_edges(&["A", "B", "C"], &[(0, 1, 0.9)]);
        let scores = compute_node_centralities(&graph);
        assert_eq!(scores[2].degree, 0.0);
        assert_eq!(scores[2].betweenness, 0.0);
        assert_eq!(scores[2].closeness, 0.0);
        // A reaches one of two other nodes at distance 1.
        assert!(close(scores[0].closeness, 0.5));
    }
}
