//! Tabular rendering of analysis results.
//!
//! Formatting only: writes the long tables as CSV to any writer. Where the
//! bytes end up is the caller's concern.

use crate::graph::{CorrelationGraph, GraphInfo};
use crate::pipeline::{AnalysisReport, CentralityRow, WindowStatsRow};
use std::io::Write;

/// Errors raised while writing a report.
#[derive(Debug)]
pub enum ReportError {
    Csv(csv::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Csv(err) => write!(f, "CSV error: {}", err),
            ReportError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

/// Writes one row per (window end, graph) with whole-graph statistics.
pub fn write_window_stats<W: Write>(rows: &[WindowStatsRow], writer: W) -> Result<(), ReportError> {
    write_rows(rows, writer)
}

/// Writes one row per (window end, graph, ticker) with centralities.
pub fn write_centralities<W: Write>(rows: &[CentralityRow], writer: W) -> Result<(), ReportError> {
    write_rows(rows, writer)
}

fn write_rows<T: serde::Serialize, W: Write>(rows: &[T], writer: W) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders a [`GraphInfo`] table per graph, separated by blank lines.
pub fn graph_info(graphs: &[CorrelationGraph]) -> String {
    graphs
        .iter()
        .map(|graph| GraphInfo::from_graph(graph).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short text summary of a run.
pub fn summary(report: &AnalysisReport) -> String {
    let computed = report
        .window_stats
        .iter()
        .map(|row| row.window_end)
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    format!(
        "{} windows, {} with graph statistics, {} statistics rows, {} centrality rows",
        report.windows.len(),
        computed,
        report.window_stats.len(),
        report.centralities.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphKind;
    use crate::ticker::Ticker;
    use chrono::NaiveDate;

    fn window_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn writes_window_stats_with_header() {
        let rows = vec![WindowStatsRow {
            window_end: window_end(),
            graph: GraphKind::Combined,
            nodes: 4,
            edges: 3,
            density: 0.5,
            average_degree: 1.5,
            average_clustering: 0.0,
            components: 1,
            largest_component: 4,
        }];
        let mut buffer = Vec::new();
        write_window_stats(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("window_end,graph,nodes,edges,density,average_degree,average_clustering,components,largest_component")
        );
        assert_eq!(lines.next(), Some("2024-02-01,all,4,3,0.5,1.5,0.0,1,4"));
    }

    #[test]
    fn writes_centralities_with_optional_sector() {
        let rows = vec![
            CentralityRow {
                window_end: window_end(),
                graph: GraphKind::Negative,
                ticker: Ticker::new("XOM").unwrap(),
                sector: Some("Energy".to_string()),
                degree: 1.0,
                betweenness: 0.0,
                closeness: 1.0,
            },
            CentralityRow {
                window_end: window_end(),
                graph: GraphKind::Negative,
                ticker: Ticker::new("AAPL").unwrap(),
                sector: None,
                degree: 0.5,
                betweenness: 0.25,
                closeness: 0.5,
            },
        ];
        let mut buffer = Vec::new();
        write_centralities(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "window_end,graph,ticker,sector,degree,betweenness,closeness");
        assert_eq!(lines[1], "2024-02-01,neg,XOM,Energy,1.0,0.0,1.0");
        assert_eq!(lines[2], "2024-02-01,neg,AAPL,,0.5,0.25,0.5");
    }

    #[test]
    fn renders_graph_info_per_graph() {
        use crate::analytics::CorrelationMatrix;
        use crate::graph::to_pos_neg_graphs;

        let corr = CorrelationMatrix::from_values(
            vec![Ticker::new("XOM").unwrap(), Ticker::new("CVX").unwrap(), Ticker::new("AAPL").unwrap()],
            vec![
                vec![1.0, 0.9, -0.8],
                vec![0.9, 1.0, -0.2],
                vec![-0.8, -0.2, 1.0],
            ],
            20,
        )
        .unwrap();
        let pair = to_pos_neg_graphs(&corr, 0.7, None).unwrap();
        let text = graph_info(&[pair.positive, pair.negative]);

        assert!(text.contains("'pos_correlations'"));
        assert!(text.contains("'neg_correlations'"));
        assert_eq!(text.matches("Nodes | 3 (1)").count(), 2);
        assert_eq!(text.matches("Edges | 1 (0)").count(), 2);
    }
}
