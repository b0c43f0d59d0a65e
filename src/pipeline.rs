//! Rolling correlation-graph pipeline
//!
//! Windows → correlation → graph(s) → metrics, assembled into long tables keyed
//! by window-end date. Windows are independent and computed in parallel; the
//! assembled output always follows window generation order.

use crate::analytics::correlation::{compute_correlation, WindowSkip};
use crate::analytics::windows::{generate_windows, TimeWindow, WindowError};
use crate::classification::ClassificationMap;
use crate::config::AnalysisConfig;
use crate::graph::builder::{to_graph, to_pos_neg_graphs, validate_threshold};
use crate::graph::metrics::{compute_node_centralities, compute_window_metrics, NodeCentrality, WindowMetrics};
use crate::graph::types::{CorrelationGraph, GraphError, GraphKind};
use crate::price_matrix::{DateRange, PriceMatrix};
use crate::ticker::Ticker;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Thresholding policy for each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    /// One graph over |corr| with signed weights
    #[default]
    Single,
    /// Separate positive and negative graphs
    PosNeg,
}

impl GraphMode {
    pub fn kinds(&self) -> &'static [GraphKind] {
        match self {
            GraphMode::Single => &[GraphKind::Combined],
            GraphMode::PosNeg => &[GraphKind::Positive, GraphKind::Negative],
        }
    }
}

impl std::str::FromStr for GraphMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "single" => Ok(GraphMode::Single),
            "pos_neg" | "posneg" | "split" => Ok(GraphMode::PosNeg),
            other => Err(format!("unknown graph mode '{}'", other)),
        }
    }
}

/// One row of the whole-graph statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStatsRow {
    pub window_end: NaiveDate,
    pub graph: GraphKind,
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub average_degree: f64,
    pub average_clustering: f64,
    pub components: usize,
    pub largest_component: usize,
}

impl WindowStatsRow {
    fn new(window_end: NaiveDate, graph: GraphKind, metrics: WindowMetrics) -> Self {
        WindowStatsRow {
            window_end,
            graph,
            nodes: metrics.nodes,
            edges: metrics.edges,
            density: metrics.density,
            average_degree: metrics.average_degree,
            average_clustering: metrics.average_clustering,
            components: metrics.components,
            largest_component: metrics.largest_component,
        }
    }
}

/// One row of the per-ticker centrality table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityRow {
    pub window_end: NaiveDate,
    pub graph: GraphKind,
    pub ticker: Ticker,
    pub sector: Option<String>,
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
}

/// Per-ticker centrality arrays aligned with the full window list.
///
/// A window that was skipped holds NaN for every ticker; a computed window
/// holds 0 for tickers absent from its graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickerSeries {
    pub degree: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub closeness: Vec<f64>,
}

impl TickerSeries {
    fn push(&mut self, degree: f64, betweenness: f64, closeness: f64) {
        self.degree.push(degree);
        self.betweenness.push(betweenness);
        self.closeness.push(closeness);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralitySeries {
    pub graph: GraphKind,
    pub window_ends: Vec<NaiveDate>,
    pub tickers: BTreeMap<Ticker, TickerSeries>,
}

impl CentralitySeries {
    fn new(graph: GraphKind, universe: &[Ticker]) -> Self {
        CentralitySeries {
            graph,
            window_ends: Vec::new(),
            tickers: universe
                .iter()
                .map(|ticker| (ticker.clone(), TickerSeries::default()))
                .collect(),
        }
    }

    fn push_skipped(&mut self, window_end: NaiveDate) {
        self.window_ends.push(window_end);
        for series in self.tickers.values_mut() {
            series.push(f64::NAN, f64::NAN, f64::NAN);
        }
    }

    fn push_scores(&mut self, window_end: NaiveDate, scores: &[NodeCentrality]) {
        self.window_ends.push(window_end);
        let by_ticker: BTreeMap<&Ticker, &NodeCentrality> =
            scores.iter().map(|score| (&score.ticker, score)).collect();
        for (ticker, series) in self.tickers.iter_mut() {
            match by_ticker.get(ticker) {
                Some(score) => series.push(score.degree, score.betweenness, score.closeness),
                None => series.push(0.0, 0.0, 0.0),
            }
        }
    }
}

/// Result of the pipeline for every generated window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub windows: Vec<TimeWindow>,
    pub window_stats: Vec<WindowStatsRow>,
    pub centralities: Vec<CentralityRow>,
    pub series: Vec<CentralitySeries>,
}

impl AnalysisReport {
    pub fn series_for(&self, graph: GraphKind) -> Option<&CentralitySeries> {
        self.series.iter().find(|series| series.graph == graph)
    }
}

/// Outcome of one graph within one window.
#[derive(Debug)]
enum GraphOutcome {
    Computed {
        metrics: WindowMetrics,
        scores: Vec<NodeCentrality>,
    },
    Degenerate,
}

#[derive(Debug)]
enum WindowOutcome {
    Skipped(WindowSkip),
    Graphs(Vec<(CorrelationGraph, GraphOutcome)>),
}

/// Errors that abort an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    Window(WindowError),
    Graph(GraphError),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Window(err) => write!(f, "Window error: {}", err),
            AnalysisError::Graph(err) => write!(f, "Graph error: {}", err),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<WindowError> for AnalysisError {
    fn from(err: WindowError) -> Self {
        AnalysisError::Window(err)
    }
}

impl From<GraphError> for AnalysisError {
    fn from(err: GraphError) -> Self {
        AnalysisError::Graph(err)
    }
}

/// Rolling-window correlation-graph analysis.
#[derive(Debug, Clone)]
pub struct RollingGraphAnalysis {
    threshold: f64,
    window_size_days: u32,
    step_days: u32,
    mode: GraphMode,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    classification: Option<ClassificationMap>,
}

impl RollingGraphAnalysis {
    pub fn new(threshold: f64, window_size_days: u32, step_days: u32, mode: GraphMode) -> Self {
        RollingGraphAnalysis {
            threshold,
            window_size_days,
            step_days,
            mode,
            start: None,
            end: None,
            classification: None,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        let mut analysis = Self::new(
            config.threshold,
            config.window_size_days,
            config.step_days,
            config.mode,
        );
        analysis.start = config.start;
        analysis.end = config.end;
        analysis
    }

    /// Restricts window generation to `range` instead of the matrix's dates.
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.start = Some(range.start);
        self.end = Some(range.end);
        self
    }

    /// Moves the first window start; the end still defaults to the last price date.
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Caps the last window end; the start still defaults to the first price date.
    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Attaches sector metadata to graph nodes and centrality rows.
    pub fn with_classification(mut self, classification: ClassificationMap) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    /// Windows this analysis would evaluate over `prices`.
    pub fn windows(&self, prices: &PriceMatrix) -> Result<Vec<TimeWindow>, WindowError> {
        let start = self.start.or_else(|| prices.dates().first().copied());
        let end = self.end.or_else(|| prices.dates().last().copied());
        match (start, end) {
            (Some(start), Some(end)) => {
                generate_windows(start, end, self.window_size_days, self.step_days)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Builds the graph(s) for a single window.
    pub fn graphs_for_window(
        &self,
        prices: &PriceMatrix,
        window: &TimeWindow,
    ) -> Result<Result<Vec<CorrelationGraph>, WindowSkip>, GraphError> {
        let corr = match compute_correlation(prices, window) {
            Ok(corr) => corr,
            Err(skip) => return Ok(Err(skip)),
        };
        let classification = self.classification.as_ref();
        let graphs = match self.mode {
            GraphMode::Single => vec![to_graph(&corr, self.threshold, classification)?],
            GraphMode::PosNeg => {
                let pair = to_pos_neg_graphs(&corr, self.threshold, classification)?;
                vec![pair.positive, pair.negative]
            }
        };
        Ok(Ok(graphs))
    }

    fn evaluate(&self, prices: &PriceMatrix, window: &TimeWindow) -> Result<WindowOutcome, GraphError> {
        let graphs = match self.graphs_for_window(prices, window)? {
            Ok(graphs) => graphs,
            Err(skip) => return Ok(WindowOutcome::Skipped(skip)),
        };

        let evaluated = graphs
            .into_iter()
            .map(|graph| {
                let outcome = match compute_window_metrics(&graph) {
                    Some(metrics) => GraphOutcome::Computed {
                        metrics,
                        scores: compute_node_centralities(&graph),
                    },
                    None => GraphOutcome::Degenerate,
                };
                (graph, outcome)
            })
            .collect();
        Ok(WindowOutcome::Graphs(evaluated))
    }

    /// Runs the full pipeline over `prices`.
    pub fn run(&self, prices: &PriceMatrix) -> Result<AnalysisReport, AnalysisError> {
        validate_threshold(self.threshold)?;
        let windows = self.windows(prices)?;
        info!(
            windows = windows.len(),
            tickers = prices.tickers().len(),
            threshold = self.threshold,
            mode = ?self.mode,
            "running rolling correlation-graph analysis"
        );

        let outcomes = windows
            .par_iter()
            .map(|window| self.evaluate(prices, window))
            .collect::<Result<Vec<_>, GraphError>>()?;

        let mut window_stats = Vec::new();
        let mut centralities = Vec::new();
        let mut series: Vec<CentralitySeries> = self
            .mode
            .kinds()
            .iter()
            .map(|&kind| CentralitySeries::new(kind, prices.tickers()))
            .collect();

        for (window, outcome) in windows.iter().zip(outcomes) {
            let window_end = window.end;
            match outcome {
                WindowOutcome::Skipped(reason) => {
                    debug!(window = %window, %reason, "skipping window");
                    series.iter_mut().for_each(|s| s.push_skipped(window_end));
                }
                WindowOutcome::Graphs(graphs) => {
                    for ((graph, outcome), kind_series) in graphs.into_iter().zip(series.iter_mut()) {
                        match outcome {
                            GraphOutcome::Degenerate => {
                                debug!(window = %window, graph = graph.name(), "graph has no edges");
                                kind_series.push_skipped(window_end);
                            }
                            GraphOutcome::Computed { metrics, scores } => {
                                kind_series.push_scores(window_end, &scores);
                                window_stats.push(WindowStatsRow::new(window_end, graph.kind(), metrics));
                                centralities.extend(scores.into_iter().map(|score| CentralityRow {
                                    window_end,
                                    graph: graph.kind(),
                                    sector: graph
                                        .classification(&score.ticker)
                                        .map(|entry| entry.sector.clone()),
                                    ticker: score.ticker,
                                    degree: score.degree,
                                    betweenness: score.betweenness,
                                    closeness: score.closeness,
                                }));
                            }
                        }
                    }
                }
            }
        }

        Ok(AnalysisReport {
            windows,
            window_stats,
            centralities,
            series,
        })
    }
}
