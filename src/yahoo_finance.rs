use crate::price_matrix::{DailyBar, DateRange, PriceField, PriceMatrix};
use crate::ticker::Ticker;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for Yahoo Finance downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Maximum number of retry attempts (default: 3)
    pub max_retries: u32,
    /// Rate limit: requests per second (default: 1.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        DownloaderConfig {
            max_retries: 3,
            requests_per_second: 1.0,
            timeout_seconds: 30,
        }
    }
}

/// Yahoo Finance daily price downloader
///
/// Fetches daily open/close history per ticker and assembles a [`PriceMatrix`].
#[derive(Debug)]
pub struct YahooFinanceDownloader {
    client: Client,
    config: DownloaderConfig,
}

impl YahooFinanceDownloader {
    /// Creates a new Yahoo Finance downloader with default configuration.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_config(DownloaderConfig::default())
    }

    /// Creates a new Yahoo Finance downloader with custom configuration.
    ///
    /// # Returns
    /// Returns `Ok(YahooFinanceDownloader)` if successful, or an error if HTTP client creation fails.
    pub fn with_config(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownloadError::ClientCreation(e.to_string()))?;

        Ok(YahooFinanceDownloader { client, config })
    }

    /// Converts a ticker to Yahoo Finance symbol format.
    ///
    /// Share-class dots become dashes (e.g. "BRK.B" -> "BRK-B").
    pub fn ticker_to_symbol(&self, ticker: &Ticker) -> String {
        ticker.as_str().replace('.', "-")
    }

    /// Fetches the raw historical CSV for `symbol`.
    ///
    /// # Errors
    /// Returns `DownloadError` if the API request fails, network error occurs, or response cannot be read.
    pub async fn fetch_historical_data(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String, DownloadError> {
        let start_timestamp = start_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DownloadError::InvalidDate("Invalid start date".to_string()))?
            .and_utc()
            .timestamp();

        let end_timestamp = end_date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| DownloadError::InvalidDate("Invalid end date".to_string()))?
            .and_utc()
            .timestamp();

        let url = format!(
            "https://query1.finance.yahoo.com/v7/finance/download/{}?period1={}&period2={}&interval=1d&events=history",
            symbol, start_timestamp, end_timestamp
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ApiError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadError::ParseError(e.to_string()))
    }

    /// Fetches daily bars for one ticker, retrying network and API failures.
    pub async fn fetch_daily_bars(
        &self,
        ticker: &Ticker,
        date_range: &DateRange,
    ) -> Result<Vec<DailyBar>, DownloadError> {
        if !date_range.is_valid() {
            return Err(DownloadError::InvalidDate(format!(
                "start {} is after end {}",
                date_range.start, date_range.end
            )));
        }

        let symbol = self.ticker_to_symbol(ticker);
        let mut attempt = 0;
        loop {
            match self
                .fetch_historical_data(&symbol, date_range.start, date_range.end)
                .await
            {
                Ok(text) => return parse_daily_bars(&text),
                Err(err @ (DownloadError::NetworkError(_) | DownloadError::ApiError(_)))
                    if attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    log::warn!(
                        "Download of {} failed (attempt {}/{}): {}",
                        symbol,
                        attempt,
                        self.config.max_retries,
                        err
                    );
                    tokio::time::sleep(self.request_interval() * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Downloads every ticker and assembles a price matrix from `field`.
    ///
    /// A ticker that cannot be downloaded keeps its column with every value
    /// missing, so the correlation engine drops it per window.
    pub async fn fetch_price_matrix(
        &self,
        tickers: &[Ticker],
        date_range: &DateRange,
        field: PriceField,
    ) -> Result<PriceMatrix, DownloadError> {
        let started = Utc::now();
        let mut bars = BTreeMap::new();
        for (index, ticker) in tickers.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.request_interval()).await;
            }
            let series = match self.fetch_daily_bars(ticker, date_range).await {
                Ok(series) => series,
                Err(err @ DownloadError::InvalidDate(_)) => return Err(err),
                Err(err) => {
                    log::warn!("Giving up on {}: {}", ticker, err);
                    Vec::new()
                }
            };
            bars.insert(ticker.clone(), series);
        }

        log::info!(
            "Downloaded {} tickers in {}s",
            tickers.len(),
            (Utc::now() - started).num_seconds()
        );
        Ok(PriceMatrix::from_bars(&bars, field))
    }

    fn request_interval(&self) -> Duration {
        if self.config.requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / self.config.requests_per_second)
        } else {
            Duration::ZERO
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }
}

/// Parses Yahoo's history CSV (`Date,Open,High,Low,Close,Adj Close,Volume`).
/// `null` cells become missing values.
pub fn parse_daily_bars(text: &str) -> Result<Vec<DailyBar>, DownloadError> {
    #[derive(Deserialize)]
    struct HistoryRecord {
        #[serde(rename = "Date")]
        date: String,
        #[serde(rename = "Open")]
        open: String,
        #[serde(rename = "Close")]
        close: String,
    }

    fn number(cell: &str) -> f64 {
        cell.trim().parse::<f64>().unwrap_or(f64::NAN)
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut bars = Vec::new();
    for record in reader.deserialize::<HistoryRecord>() {
        let record = record.map_err(|e| DownloadError::ParseError(e.to_string()))?;
        let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
            .map_err(|e| DownloadError::ParseError(format!("date '{}': {}", record.date, e)))?;
        bars.push(DailyBar::new(date, number(&record.open), number(&record.close)));
    }
    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

/// Errors that can occur during Yahoo Finance data downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// HTTP client creation failed
    ClientCreation(String),
    /// Network error occurred
    NetworkError(String),
    /// API returned an error response
    ApiError(String),
    /// Failed to parse response data
    ParseError(String),
    /// Invalid date provided
    InvalidDate(String),
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadError::ClientCreation(msg) => write!(f, "Client creation error: {}", msg),
            DownloadError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DownloadError::ApiError(msg) => write!(f, "API error: {}", msg),
            DownloadError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DownloadError::InvalidDate(msg) => write!(f, "Invalid date: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}
