//! Rolling-window analytics
//!
//! Window generation and per-window correlation. These functions are pure and
//! operate on an in-memory [`PriceMatrix`](crate::price_matrix::PriceMatrix).

pub mod correlation;
pub mod primitives;
pub mod windows;

pub use correlation::{compute_correlation, CorrelationMatrix, WindowSkip};
pub use windows::{generate_windows, TimeWindow, WindowError};
