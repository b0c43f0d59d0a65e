//! Rolling correlation-graph analysis binary
//!
//! Run with: `cargo run --bin corr-graphs -- <bars.csv> <out_dir> [config.json]`
//!
//! `bars.csv` holds long-format daily bars (`date,ticker,open,close`). Two
//! tables are written to `out_dir`: `window_stats.csv` and `centralities.csv`.

use correlation_graphs::classification::{ClassificationSource, CsvClassificationSource};
use correlation_graphs::report::{graph_info, summary, write_centralities, write_window_stats};
use correlation_graphs::{
    AnalysisConfig, DateRange, InMemoryPriceSource, PriceSource, RollingGraphAnalysis,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level:
    //   RUST_LOG=debug cargo run --bin corr-graphs -- ...
    //   RUST_LOG=correlation_graphs::pipeline=debug  (pipeline only)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);
    let (bars_path, out_dir) = match (args.next(), args.next()) {
        (Some(bars), Some(out)) => (PathBuf::from(bars), PathBuf::from(out)),
        _ => {
            eprintln!("usage: corr-graphs <bars.csv> <out_dir> [config.json]");
            std::process::exit(2);
        }
    };

    let config = match args.next() {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    }
    .with_env_overrides()?;

    let source = InMemoryPriceSource::from_csv_path(&bars_path)?;
    let tickers = source.tickers();
    let range = DateRange::new(
        config.start.unwrap_or(chrono::NaiveDate::MIN),
        config.end.unwrap_or(chrono::NaiveDate::MAX),
    );
    let prices = source.price_matrix(&tickers, &range, config.price_field)?;
    tracing::info!(
        tickers = tickers.len(),
        rows = prices.len(),
        "loaded prices from {}",
        bars_path.display()
    );

    let mut analysis = RollingGraphAnalysis::from_config(&config);
    if let Ok(path) = std::env::var("CORR_CLASSIFICATION") {
        let classifications = CsvClassificationSource::new(path).classifications()?;
        analysis = analysis.with_classification(classifications);
    }

    let report = analysis.run(&prices)?;

    std::fs::create_dir_all(&out_dir)?;
    write_window_stats(
        &report.window_stats,
        BufWriter::new(File::create(out_dir.join("window_stats.csv"))?),
    )?;
    write_centralities(
        &report.centralities,
        BufWriter::new(File::create(out_dir.join("centralities.csv"))?),
    )?;

    // Shape of the most recent window's graph(s)
    if let Some(last) = report.windows.last() {
        match analysis.graphs_for_window(&prices, last)? {
            Ok(graphs) => println!("Window {}\n{}", last, graph_info(&graphs)),
            Err(reason) => tracing::debug!(window = %last, %reason, "last window skipped"),
        }
    }

    println!("{}", summary(&report));
    println!("Tables written to {}", out_dir.display());

    Ok(())
}
