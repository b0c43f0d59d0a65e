use crate::ticker::{Ticker, TickerError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Date range for querying price data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Creates a DateRange from a standard Range.
    pub fn from_range(range: Range<NaiveDate>) -> Self {
        DateRange {
            start: range.start,
            end: range.end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// One trading day for a single ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

impl DailyBar {
    pub fn new(date: NaiveDate, open: f64, close: f64) -> Self {
        DailyBar { date, open, close }
    }
}

/// Which signal of a daily bar populates the price matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// Raw closing price
    Close,
    /// Intraday close / open ratio
    #[default]
    CloseOpenRatio,
}

impl PriceField {
    /// Extracts this field from a bar. Invalid inputs map to NaN so that the
    /// correlation engine treats them as missing.
    pub fn extract(&self, bar: &DailyBar) -> f64 {
        match self {
            PriceField::Close => bar.close,
            PriceField::CloseOpenRatio => {
                if bar.open <= 0.0 || bar.open.is_nan() || bar.close.is_nan() {
                    f64::NAN
                } else {
                    bar.close / bar.open
                }
            }
        }
    }
}

impl std::str::FromStr for PriceField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "close" => Ok(PriceField::Close),
            "close_open_ratio" | "ratio" => Ok(PriceField::CloseOpenRatio),
            other => Err(format!("unknown price field '{}'", other)),
        }
    }
}

/// Date-indexed table of per-ticker values.
///
/// Rows are strictly increasing by date and columns are unique tickers.
/// A missing observation is stored as `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<Ticker>,
    rows: Vec<Vec<f64>>,
}

impl PriceMatrix {
    /// Creates a matrix after validating its shape and ordering invariants.
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<Ticker>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, PriceMatrixError> {
        let mut seen = BTreeSet::new();
        for ticker in &tickers {
            if !seen.insert(ticker) {
                return Err(PriceMatrixError::DuplicateTicker(ticker.to_string()));
            }
        }

        if dates.len() != rows.len() {
            return Err(PriceMatrixError::ShapeMismatch(format!(
                "{} dates but {} rows",
                dates.len(),
                rows.len()
            )));
        }

        for (date, row) in dates.iter().zip(rows.iter()) {
            if row.len() != tickers.len() {
                return Err(PriceMatrixError::ShapeMismatch(format!(
                    "row {} has {} values, expected {}",
                    date,
                    row.len(),
                    tickers.len()
                )));
            }
        }

        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PriceMatrixError::UnorderedDates(pair[1]));
        }

        Ok(PriceMatrix {
            dates,
            tickers,
            rows,
        })
    }

    /// Builds a matrix from per-ticker bars.
    ///
    /// The row index is the union of all bar dates; a ticker without a bar on
    /// a given date gets a missing value there. Columns follow ticker order.
    pub fn from_bars(bars: &BTreeMap<Ticker, Vec<DailyBar>>, field: PriceField) -> Self {
        let dates: Vec<NaiveDate> = bars
            .values()
            .flat_map(|series| series.iter().map(|bar| bar.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let date_index: BTreeMap<NaiveDate, usize> = dates
            .iter()
            .enumerate()
            .map(|(index, date)| (*date, index))
            .collect();

        let mut rows = vec![vec![f64::NAN; bars.len()]; dates.len()];
        for (column, series) in bars.values().enumerate() {
            for bar in series {
                if let Some(&row) = date_index.get(&bar.date) {
                    rows[row][column] = field.extract(bar);
                }
            }
        }

        PriceMatrix {
            dates,
            tickers: bars.keys().cloned().collect(),
            rows,
        }
    }

    /// Reads a wide CSV table: a `date` column followed by one column per ticker.
    /// Empty cells and `NaN` are read as missing values.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PriceMatrixError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| PriceMatrixError::Parse(e.to_string()))?
            .clone();
        let tickers = headers
            .iter()
            .skip(1)
            .map(Ticker::new)
            .collect::<Result<Vec<_>, TickerError>>()
            .map_err(|e| PriceMatrixError::Parse(e.to_string()))?;

        let mut dates = Vec::new();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PriceMatrixError::Parse(e.to_string()))?;
            let raw_date = record.get(0).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .map_err(|e| PriceMatrixError::Parse(format!("date '{}': {}", raw_date, e)))?;
            let row = record
                .iter()
                .skip(1)
                .map(parse_cell)
                .collect::<Result<Vec<_>, _>>()?;
            dates.push(date);
            rows.push(row);
        }

        PriceMatrix::new(dates, tickers, rows)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_index(&self, ticker: &Ticker) -> Option<usize> {
        self.tickers.iter().position(|candidate| candidate == ticker)
    }

    /// Row index range covering `range` (both ends inclusive).
    pub fn row_span(&self, range: &DateRange) -> Range<usize> {
        let start = self.dates.partition_point(|date| *date < range.start);
        let end = self.dates.partition_point(|date| *date <= range.end);
        start..end.max(start)
    }

    /// Restricts the matrix to the given tickers and date range.
    pub fn select(&self, tickers: &[Ticker], range: &DateRange) -> Result<Self, PriceMatrixError> {
        let columns = tickers
            .iter()
            .map(|ticker| {
                self.column_index(ticker)
                    .ok_or_else(|| PriceMatrixError::UnknownTicker(ticker.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let span = self.row_span(range);
        let rows = self.rows[span.clone()]
            .iter()
            .map(|row| columns.iter().map(|&column| row[column]).collect())
            .collect();

        PriceMatrix::new(self.dates[span].to_vec(), tickers.to_vec(), rows)
    }
}

fn parse_cell(cell: &str) -> Result<f64, PriceMatrixError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| PriceMatrixError::Parse(format!("value '{}': {}", cell, e)))
}

/// Errors raised while building or reading a price matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceMatrixError {
    /// Two columns share a ticker label
    DuplicateTicker(String),
    /// Row dates are not strictly increasing
    UnorderedDates(NaiveDate),
    /// Dates, rows and columns disagree in size
    ShapeMismatch(String),
    /// Requested ticker is not a column
    UnknownTicker(String),
    /// Malformed source table
    Parse(String),
    /// A value breaks the table's invariants
    InvalidValue(String),
}

impl std::fmt::Display for PriceMatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceMatrixError::DuplicateTicker(ticker) => write!(f, "Duplicate ticker column: {}", ticker),
            PriceMatrixError::UnorderedDates(date) => {
                write!(f, "Dates must be strictly increasing (at {})", date)
            }
            PriceMatrixError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            PriceMatrixError::UnknownTicker(ticker) => write!(f, "Unknown ticker: {}", ticker),
            PriceMatrixError::Parse(msg) => write!(f, "Parse error: {}", msg),
            PriceMatrixError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for PriceMatrixError {}

/// Source of price matrices.
///
/// Implementations can be:
/// - In-memory bars (for testing or callers with resident data)
/// - CSV files of daily bars
/// - The Yahoo Finance downloader (see [`crate::yahoo_finance`])
pub trait PriceSource {
    /// Returns a matrix with one column per requested ticker, covering
    /// `date_range` (inclusive on both ends), filled from `field`.
    ///
    /// # Errors
    /// Returns an error if a ticker is unknown, the date range is invalid,
    /// or the underlying source cannot be read.
    fn price_matrix(
        &self,
        tickers: &[Ticker],
        date_range: &DateRange,
        field: PriceField,
    ) -> Result<PriceMatrix, PriceSourceError>;
}

/// Errors that can occur when querying a price source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSourceError {
    /// Ticker not present in the source
    TickerNotFound(String),
    /// Invalid date range (e.g., start > end)
    InvalidDateRange,
    /// Source data could not be read or parsed
    Source(String),
}

impl std::fmt::Display for PriceSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSourceError::TickerNotFound(ticker) => write!(f, "Ticker not found: {}", ticker),
            PriceSourceError::InvalidDateRange => write!(f, "Invalid date range"),
            PriceSourceError::Source(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PriceSourceError {}

impl From<PriceMatrixError> for PriceSourceError {
    fn from(err: PriceMatrixError) -> Self {
        PriceSourceError::Source(err.to_string())
    }
}

/// In-memory price source backed by daily bars keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    bars: BTreeMap<Ticker, Vec<DailyBar>>,
}

impl InMemoryPriceSource {
    /// Creates a new empty in-memory price source.
    pub fn new() -> Self {
        InMemoryPriceSource {
            bars: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the bars for a ticker.
    pub fn add_bars(&mut self, ticker: Ticker, mut bars: Vec<DailyBar>) {
        bars.sort_by_key(|bar| bar.date);
        self.bars.insert(ticker, bars);
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.bars.keys().cloned().collect()
    }

    /// Reads long-format bars: `date,ticker,open,close` with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PriceSourceError> {
        #[derive(Deserialize)]
        struct BarRecord {
            date: NaiveDate,
            ticker: String,
            open: Option<f64>,
            close: Option<f64>,
        }

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut grouped: BTreeMap<Ticker, Vec<DailyBar>> = BTreeMap::new();
        for record in reader.deserialize::<BarRecord>() {
            let record = record.map_err(|e| PriceSourceError::Source(e.to_string()))?;
            let ticker =
                Ticker::new(record.ticker).map_err(|e| PriceSourceError::Source(e.to_string()))?;
            grouped.entry(ticker).or_default().push(DailyBar::new(
                record.date,
                record.open.unwrap_or(f64::NAN),
                record.close.unwrap_or(f64::NAN),
            ));
        }

        let mut source = InMemoryPriceSource::new();
        for (ticker, bars) in grouped {
            source.add_bars(ticker, bars);
        }
        Ok(source)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, PriceSourceError> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            PriceSourceError::Source(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_csv_reader(file)
    }
}

impl PriceSource for InMemoryPriceSource {
    fn price_matrix(
        &self,
        tickers: &[Ticker],
        date_range: &DateRange,
        field: PriceField,
    ) -> Result<PriceMatrix, PriceSourceError> {
        if !date_range.is_valid() {
            return Err(PriceSourceError::InvalidDateRange);
        }

        let mut selected = BTreeMap::new();
        for ticker in tickers {
            let bars = self
                .bars
                .get(ticker)
                .ok_or_else(|| PriceSourceError::TickerNotFound(ticker.to_string()))?;
            let in_range: Vec<DailyBar> = bars
                .iter()
                .filter(|bar| date_range.contains(bar.date))
                .copied()
                .collect();
            selected.insert(ticker.clone(), in_range);
        }

        Ok(PriceMatrix::from_bars(&selected, field))
    }
}

/// Price source reading a wide CSV table (`date,TICKER1,TICKER2,...`).
///
/// Cells hold prepared values, so the requested [`PriceField`] is not applied.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvPriceSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvPriceSource {
    fn price_matrix(
        &self,
        tickers: &[Ticker],
        date_range: &DateRange,
        _field: PriceField,
    ) -> Result<PriceMatrix, PriceSourceError> {
        if !date_range.is_valid() {
            return Err(PriceSourceError::InvalidDateRange);
        }

        let file = std::fs::File::open(&self.path)
            .map_err(|e| PriceSourceError::Source(format!("{}: {}", self.path.display(), e)))?;
        let matrix = PriceMatrix::from_csv_reader(file)?;
        matrix.select(tickers, date_range).map_err(|err| match err {
            PriceMatrixError::UnknownTicker(ticker) => PriceSourceError::TickerNotFound(ticker),
            other => other.into(),
        })
    }
}
