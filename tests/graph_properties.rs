use correlation_graphs::analytics::{compute_correlation, generate_windows, TimeWindow};
use correlation_graphs::graph::{compute_window_metrics, to_graph, to_pos_neg_graphs};
use correlation_graphs::{CorrelationMatrix, PriceMatrix, Ticker};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

fn tickers(symbols: &[&str]) -> Vec<Ticker> {
    symbols.iter().map(|s| Ticker::new(*s).unwrap()).collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Deterministic pseudo-random walk so the matrix mixes signs and magnitudes.
fn noisy_prices(columns: usize, rows: usize) -> PriceMatrix {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 1000) as f64 / 1000.0 - 0.5
    };

    let symbols: Vec<String> = (0..columns).map(|i| format!("T{:02}", i)).collect();
    let start = date(2023, 1, 1);
    let mut level = vec![100.0; columns];
    let mut dates = Vec::new();
    let mut values = Vec::new();
    for row in 0..rows {
        let market = next();
        let row_values: Vec<f64> = (0..columns)
            .map(|column| {
                let beta = if column % 3 == 0 { -1.0 } else { 1.0 };
                level[column] += beta * market + 0.5 * next();
                level[column]
            })
            .collect();
        dates.push(start + Duration::days(row as i64));
        values.push(row_values);
    }

    PriceMatrix::new(
        dates,
        symbols.iter().map(|s| Ticker::new(s.as_str()).unwrap()).collect(),
        values,
    )
    .unwrap()
}

fn edge_set(edges: Vec<(&Ticker, &Ticker, f64)>) -> BTreeSet<(String, String)> {
    edges
        .into_iter()
        .map(|(a, b, _)| (a.to_string(), b.to_string()))
        .collect()
}

#[test]
fn generated_windows_respect_length_step_and_end() {
    let start = date(2022, 1, 3);
    for &(total, size, step) in &[(365, 30, 7), (90, 30, 30), (40, 7, 1), (10, 10, 3), (31, 5, 100)] {
        let end = start + Duration::days(total);
        let windows = generate_windows(start, end, size, step).unwrap();
        assert!(!windows.is_empty(), "total={} size={} step={}", total, size, step);
        assert_eq!(windows[0].start, start);
        for window in &windows {
            assert_eq!(window.days(), i64::from(size));
            assert!(window.end <= end);
        }
        for pair in windows.windows(2) {
            assert_eq!((pair[1].start - pair[0].start).num_days(), i64::from(step));
        }
        let following_end = windows.last().unwrap().end + Duration::days(i64::from(step));
        assert!(following_end > end);
    }
}

#[test]
fn correlation_matrix_is_symmetric_for_every_window() {
    let prices = noisy_prices(8, 120);
    let windows = generate_windows(date(2023, 1, 1), date(2023, 4, 30), 20, 10).unwrap();
    for window in &windows {
        let corr = compute_correlation(&prices, window).unwrap();
        for i in 0..corr.len() {
            assert_eq!(corr.get(i, i), 1.0);
            for j in 0..corr.len() {
                assert_eq!(corr.get(i, j), corr.get(j, i));
                assert!(corr.get(i, j).abs() <= 1.0);
            }
        }
    }
}

#[test]
fn pos_neg_edges_partition_single_graph_edges() {
    let prices = noisy_prices(12, 60);
    let window = TimeWindow::new(date(2023, 1, 1), date(2023, 3, 1)).unwrap();
    let corr = compute_correlation(&prices, &window).unwrap();

    for &threshold in &[0.2, 0.5, 0.7, 0.9] {
        let single = edge_set(to_graph(&corr, threshold, None).unwrap().edges());
        let pair = to_pos_neg_graphs(&corr, threshold, None).unwrap();
        let positive = edge_set(pair.positive.edges());
        let negative = edge_set(pair.negative.edges());

        assert!(positive.is_disjoint(&negative));
        let union: BTreeSet<_> = positive.union(&negative).cloned().collect();
        assert_eq!(union, single, "threshold {}", threshold);
        assert_eq!(pair.positive.node_count(), corr.len());
        assert_eq!(pair.negative.node_count(), corr.len());
    }
}

#[test]
fn negative_pair_scenario() {
    let corr = CorrelationMatrix::from_values(
        tickers(&["A", "B"]),
        vec![vec![1.0, -0.9], vec![-0.9, 1.0]],
        30,
    )
    .unwrap();
    let pair = to_pos_neg_graphs(&corr, 0.7, None).unwrap();
    assert_eq!(pair.positive.edge_count(), 0);
    let edges = pair.negative.edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].0.as_str(), "A");
    assert_eq!(edges[0].1.as_str(), "B");
    assert!((edges[0].2 - 0.9).abs() < 1e-12);
}

#[test]
fn path_graph_scenario_metrics() {
    let corr = CorrelationMatrix::from_values(
        tickers(&["A", "B", "C", "D"]),
        vec![
            vec![1.0, 0.8, 0.1, 0.0],
            vec![0.8, 1.0, 0.9, 0.2],
            vec![0.1, 0.9, 1.0, -0.75],
            vec![0.0, 0.2, -0.75, 1.0],
        ],
        30,
    )
    .unwrap();
    let graph = to_graph(&corr, 0.7, None).unwrap();
    let metrics = compute_window_metrics(&graph).unwrap();
    assert_eq!(metrics.edges, 3);
    assert!((metrics.density - 0.5).abs() < 1e-12);
    assert!((metrics.average_degree - 1.5).abs() < 1e-12);
    assert_eq!(metrics.components, 1);
    assert_eq!(metrics.largest_component, 4);
}
