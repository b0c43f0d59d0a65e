//! Correlation graphs
//!
//! Thresholds correlation matrices into undirected graphs keyed by ticker and
//! derives structural metrics and node centralities from them.

pub mod builder;
pub mod info;
pub mod metrics;
pub mod types;

pub use builder::{to_graph, to_pos_neg_graphs};
pub use info::GraphInfo;
pub use metrics::{compute_node_centralities, compute_window_metrics, NodeCentrality, WindowMetrics};
pub use types::{CorrelationGraph, GraphError, GraphKind, PosNegGraphPair};
