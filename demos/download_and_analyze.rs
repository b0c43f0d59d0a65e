use correlation_graphs::report::{summary, write_centralities, write_window_stats};
use correlation_graphs::{
    DateRange, DownloaderConfig, GraphMode, PriceField, RollingGraphAnalysis, Ticker,
    YahooFinanceDownloader,
};
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufWriter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    println!("📥 Downloading prices...");

    let config = DownloaderConfig {
        max_retries: 3,
        timeout_seconds: 30,
        requests_per_second: 2.0,
    };
    let downloader = YahooFinanceDownloader::with_config(config)?;

    let tickers = ["AAPL", "MSFT", "GOOG", "XOM", "CVX", "BRK.B"]
        .iter()
        .map(|symbol| Ticker::new(*symbol))
        .collect::<Result<Vec<_>, _>>()?;
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).ok_or("invalid end date")?;
    let range = DateRange::new(start, end);

    println!(
        "Tickers: {}",
        tickers.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    );
    println!("Date range: {} to {}", start, end);

    let prices = downloader
        .fetch_price_matrix(&tickers, &range, PriceField::CloseOpenRatio)
        .await?;
    println!("✅ {} trading days downloaded", prices.len());

    let report = RollingGraphAnalysis::new(0.7, 30, 7, GraphMode::PosNeg)
        .with_range(range)
        .run(&prices)?;

    write_window_stats(
        &report.window_stats,
        BufWriter::new(File::create("window_stats.csv")?),
    )?;
    write_centralities(
        &report.centralities,
        BufWriter::new(File::create("centralities.csv")?),
    )?;

    println!("{}", summary(&report));
    println!("Tables written to window_stats.csv and centralities.csv");

    Ok(())
}
