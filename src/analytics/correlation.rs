//! Per-window Pearson correlation matrices.

use crate::analytics::primitives::pearson;
use crate::analytics::windows::TimeWindow;
use crate::price_matrix::{PriceMatrix, PriceMatrixError};
use crate::ticker::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::trace;

/// Square, symmetric ticker × ticker correlation matrix with unit diagonal.
///
/// Entries are NaN where the correlation is undefined (a constant series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    tickers: Vec<Ticker>,
    values: Vec<Vec<f64>>,
    observations: usize,
}

impl CorrelationMatrix {
    /// Wraps precomputed values, e.g. from an external estimator.
    ///
    /// The matrix must be square with one row per ticker, have a unit
    /// diagonal, and be symmetric with entries in [-1, 1]. NaN marks an
    /// undefined correlation and must be mirrored.
    pub fn from_values(
        tickers: Vec<Ticker>,
        values: Vec<Vec<f64>>,
        observations: usize,
    ) -> Result<Self, PriceMatrixError> {
        let mut seen = BTreeSet::new();
        for ticker in &tickers {
            if !seen.insert(ticker) {
                return Err(PriceMatrixError::DuplicateTicker(ticker.to_string()));
            }
        }
        if values.len() != tickers.len() || values.iter().any(|row| row.len() != tickers.len()) {
            return Err(PriceMatrixError::ShapeMismatch(format!(
                "correlation matrix must be {0}x{0}",
                tickers.len()
            )));
        }
        for (i, row) in values.iter().enumerate() {
            if row[i] != 1.0 {
                return Err(PriceMatrixError::InvalidValue(format!(
                    "diagonal entry for {} is {}",
                    tickers[i], row[i]
                )));
            }
            for (j, &value) in row.iter().enumerate().skip(i + 1) {
                let mirror = values[j][i];
                let in_range = value.is_nan() || (-1.0..=1.0).contains(&value);
                if !in_range {
                    return Err(PriceMatrixError::InvalidValue(format!(
                        "correlation {} for ({}, {}) is outside [-1, 1]",
                        value, tickers[i], tickers[j]
                    )));
                }
                let symmetric = (value.is_nan() && mirror.is_nan()) || (value - mirror).abs() <= 1e-12;
                if !symmetric {
                    return Err(PriceMatrixError::InvalidValue(format!(
                        "entries for ({}, {}) differ: {} vs {}",
                        tickers[i], tickers[j], value, mirror
                    )));
                }
            }
        }
        Ok(CorrelationMatrix {
            tickers,
            values,
            observations,
        })
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Number of observation rows the matrix was computed from.
    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row][column]
    }

    /// Correlation between two tickers, if both are present.
    pub fn value(&self, a: &Ticker, b: &Ticker) -> Option<f64> {
        let row = self.tickers.iter().position(|t| t == a)?;
        let column = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[row][column])
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }
}

/// Reasons a window yields no correlation matrix. Both are recovered by
/// skipping the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSkip {
    /// No price data at all in the window
    EmptyWindow,
    /// Fewer than two observation rows or fewer than two gap-free tickers
    InsufficientData,
}

impl std::fmt::Display for WindowSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowSkip::EmptyWindow => write!(f, "window has no price data"),
            WindowSkip::InsufficientData => write!(f, "window has insufficient data"),
        }
    }
}

impl std::error::Error for WindowSkip {}

/// Computes the Pearson correlation matrix of `prices` over `window`.
///
/// Rows are sliced to the window (inclusive). Any ticker with a missing value
/// inside the slice is dropped for this window, so the ticker set can shrink
/// from one window to the next.
pub fn compute_correlation(
    prices: &PriceMatrix,
    window: &TimeWindow,
) -> Result<CorrelationMatrix, WindowSkip> {
    let span = prices.row_span(&window.range());
    let rows = &prices.rows()[span];

    if rows.iter().flatten().all(|value| !value.is_finite()) {
        return Err(WindowSkip::EmptyWindow);
    }

    let kept: Vec<usize> = (0..prices.tickers().len())
        .filter(|&column| rows.iter().all(|row| row[column].is_finite()))
        .collect();

    trace!(
        window = %window,
        rows = rows.len(),
        kept = kept.len(),
        dropped = prices.tickers().len() - kept.len(),
        "sliced price matrix"
    );

    if rows.len() < 2 || kept.len() < 2 {
        return Err(WindowSkip::InsufficientData);
    }

    let columns: Vec<Vec<f64>> = kept
        .iter()
        .map(|&column| rows.iter().map(|row| row[column]).collect())
        .collect();

    let n = columns.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        tickers: kept.iter().map(|&column| prices.tickers()[column].clone()).collect(),
        values,
        observations: rows.len(),
    })
}
