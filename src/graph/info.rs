use crate::graph::metrics::{clustering_coefficients, component_sizes};
use crate::graph::types::CorrelationGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary of a graph's size and shape, rendered by the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphInfo {
    pub name: String,
    pub nodes: usize,
    pub isolates: usize,
    pub edges: usize,
    pub self_loops: usize,
    pub average_degree: f64,
    pub max_degree: usize,
    /// Share of nodes in the largest component, in percent
    pub largest_component_pct: f64,
    pub components: usize,
    pub average_clustering: f64,
}

impl GraphInfo {
    pub fn from_graph(graph: &CorrelationGraph) -> Self {
        let inner = graph.inner();
        let nodes = inner.node_count();
        let edges = inner.edge_count();

        let degrees: Vec<usize> = inner
            .node_indices()
            .map(|node| inner.neighbors(node).count())
            .collect();
        let sizes = component_sizes(graph);
        let clustering = clustering_coefficients(graph);

        let (average_degree, largest_component_pct, average_clustering) = if nodes == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = nodes as f64;
            (
                2.0 * edges as f64 / n,
                100.0 * sizes.first().copied().unwrap_or(0) as f64 / n,
                clustering.iter().sum::<f64>() / n,
            )
        };

        GraphInfo {
            name: graph.name().to_string(),
            nodes,
            isolates: degrees.iter().filter(|&&degree| degree == 0).count(),
            edges,
            self_loops: inner
                .edge_indices()
                .filter_map(|edge| inner.edge_endpoints(edge))
                .filter(|(a, b)| a == b)
                .count(),
            average_degree,
            max_degree: degrees.iter().copied().max().unwrap_or(0),
            largest_component_pct,
            components: sizes.len(),
            average_clustering,
        }
    }
}

impl fmt::Display for GraphInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} | '{}'", "Graph", self.name)?;
        writeln!(f, "{:>12} | {} ({})", "Nodes", self.nodes, self.isolates)?;
        writeln!(f, "{:>12} | {} ({})", "Edges", self.edges, self.self_loops)?;
        writeln!(
            f,
            "{:>12} | {:.2} ({})",
            "Degree", self.average_degree, self.max_degree
        )?;
        writeln!(
            f,
            "{:>12} | {:.1}% ({})",
            "LCC", self.largest_component_pct, self.components
        )?;
        writeln!(f, "{:>12} | {:.4}", "Clustering", self.average_clustering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::correlation::CorrelationMatrix;
    use crate::graph::builder::to_graph;
    use crate::ticker::Ticker;

    fn triangle_plus_isolate() -> CorrelationGraph {
        let tickers = ["A", "B", "C", "D"]
            .iter()
            .map(|s| Ticker::new(*s).unwrap())
            .collect();
        let values = vec![
            vec![1.0, 0.9, 0.8, 0.0],
            vec![0.9, 1.0, 0.75, 0.1],
            vec![0.8, 0.75, 1.0, 0.2],
            vec![0.0, 0.1, 0.2, 1.0],
        ];
        let corr = CorrelationMatrix::from_values(tickers, values, 20).unwrap();
        to_graph(&corr, 0.7, None).unwrap()
    }

    #[test]
    fn summarizes_graph_shape() {
        let info = GraphInfo::from_graph(&triangle_plus_isolate());
        assert_eq!(info.name, "correlations");
        assert_eq!(info.nodes, 4);
        assert_eq!(info.isolates, 1);
        assert_eq!(info.edges, 3);
        assert_eq!(info.self_loops, 0);
        assert_eq!(info.max_degree, 2);
        assert!((info.average_degree - 1.5).abs() < 1e-12);
        assert!((info.largest_component_pct - 75.0).abs() < 1e-12);
        assert_eq!(info.components, 2);
        assert!((info.average_clustering - 0.75).abs() < 1e-12);
    }

    #[test]
    fn renders_aligned_table() {
        let rendered = GraphInfo::from_graph(&triangle_plus_isolate()).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "       Graph | 'correlations'");
        assert_eq!(lines[1], "       Nodes | 4 (1)");
        assert_eq!(lines[3], "      Degree | 1.50 (2)");
        assert_eq!(lines[4], "         LCC | 75.0% (2)");
        assert_eq!(lines[5], "  Clustering | 0.7500");
    }
}
