use crate::classification::Classification;
use crate::ticker::Ticker;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which thresholding variant produced a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    /// Edges where |corr| clears the threshold, signed weights
    #[serde(rename = "all")]
    Combined,
    /// Edges where corr >= threshold
    #[serde(rename = "pos")]
    Positive,
    /// Edges where corr <= -threshold, weights stored as |corr|
    #[serde(rename = "neg")]
    Negative,
}

impl GraphKind {
    /// Graph name used in summaries.
    pub fn name(&self) -> &'static str {
        match self {
            GraphKind::Combined => "correlations",
            GraphKind::Positive => "pos_correlations",
            GraphKind::Negative => "neg_correlations",
        }
    }

    /// Short label used as a table column value.
    pub fn label(&self) -> &'static str {
        match self {
            GraphKind::Combined => "all",
            GraphKind::Positive => "pos",
            GraphKind::Negative => "neg",
        }
    }
}

impl std::fmt::Display for GraphKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Undirected, simple correlation graph over tickers.
///
/// Node `i` of the underlying petgraph graph is `tickers()[i]`. Graphs are
/// immutable once built; classification is carried as a side mapping.
#[derive(Debug, Clone)]
pub struct CorrelationGraph {
    kind: GraphKind,
    graph: UnGraph<Ticker, f64>,
    classifications: BTreeMap<Ticker, Classification>,
}

impl CorrelationGraph {
    pub(crate) fn new(
        kind: GraphKind,
        graph: UnGraph<Ticker, f64>,
        classifications: BTreeMap<Ticker, Classification>,
    ) -> Self {
        CorrelationGraph {
            kind,
            graph,
            classifications,
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Tickers in node order.
    pub fn tickers(&self) -> Vec<&Ticker> {
        self.graph.node_weights().collect()
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.node_index(ticker).is_some()
    }

    /// Edges as `(a, b, weight)` in construction order.
    pub fn edges(&self) -> Vec<(&Ticker, &Ticker, f64)> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    &self.graph[edge.source()],
                    &self.graph[edge.target()],
                    *edge.weight(),
                )
            })
            .collect()
    }

    pub fn edge_weight(&self, a: &Ticker, b: &Ticker) -> Option<f64> {
        let a = self.node_index(a)?;
        let b = self.node_index(b)?;
        self.graph
            .find_edge(a, b)
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    pub fn degree(&self, ticker: &Ticker) -> Option<usize> {
        self.node_index(ticker)
            .map(|index| self.graph.neighbors(index).count())
    }

    pub fn classification(&self, ticker: &Ticker) -> Option<&Classification> {
        self.classifications.get(ticker)
    }

    pub(crate) fn inner(&self) -> &UnGraph<Ticker, f64> {
        &self.graph
    }

    fn node_index(&self, ticker: &Ticker) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&index| &self.graph[index] == ticker)
    }
}

/// Positive- and negative-correlation graphs over the same node set.
#[derive(Debug, Clone)]
pub struct PosNegGraphPair {
    pub positive: CorrelationGraph,
    pub negative: CorrelationGraph,
}

/// Invalid graph-builder input.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Threshold must be finite and in (0, 1]
    InvalidThreshold(f64),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidThreshold(value) => {
                write!(f, "Invalid threshold {}: expected a value in (0, 1]", value)
            }
        }
    }
}

impl std::error::Error for GraphError {}
