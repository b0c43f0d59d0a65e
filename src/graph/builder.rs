//! Thresholding a correlation matrix into graphs.
//!
//! The comparator is inclusive everywhere: a pair whose correlation magnitude
//! equals the threshold gets an edge. Pairs are visited in column order with
//! `i < j`, so edge enumeration is reproducible.

use crate::analytics::correlation::CorrelationMatrix;
use crate::classification::{Classification, ClassificationMap};
use crate::graph::types::{CorrelationGraph, GraphError, GraphKind, PosNegGraphPair};
use crate::ticker::Ticker;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), GraphError> {
    if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidThreshold(threshold))
    }
}

/// Adds one node per ticker (isolates included) and collects the available
/// classifications. A ticker without classification is added bare.
fn add_nodes(
    graph: &mut UnGraph<Ticker, f64>,
    tickers: &[Ticker],
    classification: Option<&ClassificationMap>,
) -> (Vec<NodeIndex>, BTreeMap<Ticker, Classification>) {
    let mut attributes = BTreeMap::new();
    let indices = tickers
        .iter()
        .map(|ticker| {
            if let Some(map) = classification {
                match map.get(ticker) {
                    Some(entry) => {
                        attributes.insert(ticker.clone(), entry.clone());
                    }
                    None => debug!(ticker = %ticker, "missing classification, adding bare node"),
                }
            }
            graph.add_node(ticker.clone())
        })
        .collect();
    (indices, attributes)
}

/// Builds a single graph with an edge wherever `|corr| >= threshold`.
/// Edge weights keep the sign of the correlation.
pub fn to_graph(
    corr: &CorrelationMatrix,
    threshold: f64,
    classification: Option<&ClassificationMap>,
) -> Result<CorrelationGraph, GraphError> {
    validate_threshold(threshold)?;

    let n = corr.len();
    let mut graph = UnGraph::with_capacity(n, 0);
    let (nodes, attributes) = add_nodes(&mut graph, corr.tickers(), classification);

    for i in 0..n {
        for j in (i + 1)..n {
            let value = corr.get(i, j);
            if value.abs() >= threshold {
                graph.add_edge(nodes[i], nodes[j], value);
            }
        }
    }

    Ok(CorrelationGraph::new(GraphKind::Combined, graph, attributes))
}

/// Splits strong correlations into a positive graph (`corr >= threshold`)
/// and a negative graph (`corr <= -threshold`). Both graphs carry every
/// ticker and store `|corr|` as the edge weight.
pub fn to_pos_neg_graphs(
    corr: &CorrelationMatrix,
    threshold: f64,
    classification: Option<&ClassificationMap>,
) -> Result<PosNegGraphPair, GraphError> {
    validate_threshold(threshold)?;

    let n = corr.len();
    let mut positive = UnGraph::with_capacity(n, 0);
    let mut negative = UnGraph::with_capacity(n, 0);
    let (pos_nodes, attributes) = add_nodes(&mut positive, corr.tickers(), classification);
    let (neg_nodes, _) = add_nodes(&mut negative, corr.tickers(), None);

    for i in 0..n {
        for j in (i + 1)..n {
            let value = corr.get(i, j);
            if value >= threshold {
                positive.add_edge(pos_nodes[i], pos_nodes[j], value.abs());
            } else if value <= -threshold {
                negative.add_edge(neg_nodes[i], neg_nodes[j], value.abs());
            }
        }
    }

    Ok(PosNegGraphPair {
        positive: CorrelationGraph::new(GraphKind::Positive, positive, attributes.clone()),
        negative: CorrelationGraph::new(GraphKind::Negative, negative, attributes),
    })
}
