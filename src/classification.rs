//! Sector classification for tickers.
//!
//! Classification is optional enrichment for graph nodes. It is kept as a
//! side mapping keyed by [`Ticker`] so graphs never depend on it.

use crate::ticker::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// GICS-style sector and sub-industry for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Sector (e.g., "Information Technology")
    pub sector: String,
    /// Sub-industry (e.g., "Semiconductors")
    pub sub_industry: String,
}

impl Classification {
    pub fn new(sector: impl Into<String>, sub_industry: impl Into<String>) -> Self {
        Classification {
            sector: sector.into(),
            sub_industry: sub_industry.into(),
        }
    }
}

/// Ticker to classification lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationMap {
    entries: BTreeMap<Ticker, Classification>,
}

impl ClassificationMap {
    pub fn new() -> Self {
        ClassificationMap {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, ticker: Ticker, classification: Classification) {
        self.entries.insert(ticker, classification);
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&Classification> {
        self.entries.get(ticker)
    }

    /// Removes tickers whose upstream listing is known to be stale.
    pub fn exclude(&mut self, tickers: &[Ticker]) {
        for ticker in tickers {
            self.entries.remove(ticker);
        }
    }

    /// Tickers in lexicographic order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a constituent table with `Symbol`, `GICS Sector` and
    /// `GICS Sub-Industry` columns. Extra columns are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ClassificationError> {
        #[derive(Deserialize)]
        struct ConstituentRecord {
            #[serde(rename = "Symbol")]
            symbol: String,
            #[serde(rename = "GICS Sector")]
            sector: String,
            #[serde(rename = "GICS Sub-Industry")]
            sub_industry: String,
        }

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut map = ClassificationMap::new();
        for record in reader.deserialize::<ConstituentRecord>() {
            let record = record.map_err(|e| ClassificationError::Parse(e.to_string()))?;
            let ticker = Ticker::new(record.symbol)
                .map_err(|e| ClassificationError::Parse(e.to_string()))?;
            map.insert(ticker, Classification::new(record.sector, record.sub_industry));
        }
        Ok(map)
    }
}

impl FromIterator<(Ticker, Classification)> for ClassificationMap {
    fn from_iter<I: IntoIterator<Item = (Ticker, Classification)>>(iter: I) -> Self {
        ClassificationMap {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Provider of ticker classifications (e.g. an index constituent list).
pub trait ClassificationSource {
    fn classifications(&self) -> Result<ClassificationMap, ClassificationError>;
}

/// Classification source reading a constituent CSV file.
#[derive(Debug, Clone)]
pub struct CsvClassificationSource {
    path: std::path::PathBuf,
    excluded: Vec<Ticker>,
}

impl CsvClassificationSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        CsvClassificationSource {
            path: path.into(),
            excluded: Vec::new(),
        }
    }

    /// Tickers to drop after loading.
    pub fn with_excluded(mut self, excluded: Vec<Ticker>) -> Self {
        self.excluded = excluded;
        self
    }
}

impl ClassificationSource for CsvClassificationSource {
    fn classifications(&self) -> Result<ClassificationMap, ClassificationError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| ClassificationError::Io(format!("{}: {}", self.path.display(), e)))?;
        let mut map = ClassificationMap::from_csv_reader(file)?;
        map.exclude(&self.excluded);
        Ok(map)
    }
}

/// Errors that can occur while loading classifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationError::Io(msg) => write!(f, "Classification I/O error: {}", msg),
            ClassificationError::Parse(msg) => write!(f, "Classification parse error: {}", msg),
        }
    }
}

impl std::error::Error for ClassificationError {}
