//! Rolling date windows.
//!
//! Windows overlap whenever the step is shorter than the window length.

use crate::price_matrix::DateRange;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A bounded date range over which one correlation matrix is computed.
///
/// Both ends are inclusive and `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::InvalidBounds { start, end });
        }
        Ok(TimeWindow { start, end })
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    /// Calendar length in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Generates rolling windows across `[start_date, end_date]`.
///
/// Window starts advance by `step_days` from `start_date`; each window ends
/// `window_size_days` after its start. Generation stops at the first window
/// whose end falls after `end_date`, so the result is empty when the window
/// alone is longer than the range.
///
/// # Errors
/// Returns an error if `window_size_days` or `step_days` is zero.
pub fn generate_windows(
    start_date: NaiveDate,
    end_date: NaiveDate,
    window_size_days: u32,
    step_days: u32,
) -> Result<Vec<TimeWindow>, WindowError> {
    if window_size_days == 0 {
        return Err(WindowError::ZeroWindowSize);
    }
    if step_days == 0 {
        return Err(WindowError::ZeroStep);
    }

    let size = Duration::days(i64::from(window_size_days));
    let step = Duration::days(i64::from(step_days));

    let mut windows = Vec::new();
    let mut current = start_date;
    while let Some(window_end) = current.checked_add_signed(size) {
        if window_end > end_date {
            break;
        }
        windows.push(TimeWindow {
            start: current,
            end: window_end,
        });
        match current.checked_add_signed(step) {
            Some(next) => current = next,
            None => break,
        }
    }

    Ok(windows)
}

/// Invalid window parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    ZeroWindowSize,
    ZeroStep,
    InvalidBounds { start: NaiveDate, end: NaiveDate },
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::ZeroWindowSize => write!(f, "Window size must be at least one day"),
            WindowError::ZeroStep => write!(f, "Window step must be at least one day"),
            WindowError::InvalidBounds { start, end } => {
                write!(f, "Window start {} must precede end {}", start, end)
            }
        }
    }
}

impl std::error::Error for WindowError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn windows_have_fixed_length_and_step() {
        let start = date(2024, 1, 1);
        let end = date(2024, 3, 31);
        let windows = generate_windows(start, end, 30, 7).unwrap();

        assert!(!windows.is_empty());
        assert_eq!(windows[0].start, start);
        for window in &windows {
            assert_eq!(window.days(), 30);
            assert!(window.end <= end);
        }
        for pair in windows.windows(2) {
            assert_eq!((pair[1].start - pair[0].start).num_days(), 7);
        }

        let last = windows.last().unwrap();
        let next_end = last.end + Duration::days(7);
        assert!(next_end > end);
    }

    #[test]
    fn window_ending_on_end_date_is_included() {
        let windows = generate_windows(date(2024, 1, 1), date(2024, 1, 11), 10, 1).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, date(2024, 1, 11));
    }

    #[test]
    fn window_longer_than_range_yields_nothing() {
        let windows = generate_windows(date(2024, 1, 1), date(2024, 1, 10), 30, 1).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn large_step_yields_at_most_one_window() {
        let windows = generate_windows(date(2024, 1, 1), date(2024, 2, 1), 5, 100).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], TimeWindow::new(date(2024, 1, 1), date(2024, 1, 6)).unwrap());
    }

    #[test]
    fn backwards_range_yields_nothing() {
        let windows = generate_windows(date(2024, 2, 1), date(2024, 1, 1), 5, 1).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn zero_parameters_are_rejected() {
        let start = date(2024, 1, 1);
        let end = date(2024, 2, 1);
        assert_eq!(generate_windows(start, end, 0, 1), Err(WindowError::ZeroWindowSize));
        assert_eq!(generate_windows(start, end, 5, 0), Err(WindowError::ZeroStep));
    }

    #[test]
    fn time_window_requires_start_before_end() {
        let day = date(2024, 1, 1);
        assert!(matches!(
            TimeWindow::new(day, day),
            Err(WindowError::InvalidBounds { .. })
        ));
    }
}
