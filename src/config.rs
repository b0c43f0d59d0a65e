//! Analysis configuration
//!
//! Loaded from a JSON file (every field optional) and then overridden by
//! environment variables:
//!
//! - `CORR_THRESHOLD` - edge threshold in (0, 1]
//! - `CORR_WINDOW_DAYS` - window length in calendar days
//! - `CORR_STEP_DAYS` - step between window starts
//! - `CORR_GRAPH_MODE` - `single` or `pos_neg`
//! - `CORR_PRICE_FIELD` - `close` or `close_open_ratio`

use crate::pipeline::GraphMode;
use crate::price_matrix::PriceField;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum |corr| for an edge (default: 0.7)
    pub threshold: f64,
    /// Window length in days (default: 30)
    pub window_size_days: u32,
    /// Days between window starts (default: 7)
    pub step_days: u32,
    pub mode: GraphMode,
    pub price_field: PriceField,
    /// Optional analysis start; defaults to the first price date
    pub start: Option<NaiveDate>,
    /// Optional analysis end; defaults to the last price date
    pub end: Option<NaiveDate>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            threshold: 0.7,
            window_size_days: 30,
            step_days: 7,
            mode: GraphMode::Single,
            price_field: PriceField::CloseOpenRatio,
            start: None,
            end: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Applies `CORR_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CORR_THRESHOLD") {
            self.threshold = parse_var("CORR_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("CORR_WINDOW_DAYS") {
            self.window_size_days = parse_var("CORR_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = lookup("CORR_STEP_DAYS") {
            self.step_days = parse_var("CORR_STEP_DAYS", &value)?;
        }
        if let Some(value) = lookup("CORR_GRAPH_MODE") {
            self.mode = value
                .parse()
                .map_err(|e: String| ConfigError::InvalidValue("CORR_GRAPH_MODE".to_string(), e))?;
        }
        if let Some(value) = lookup("CORR_PRICE_FIELD") {
            self.price_field = value
                .parse()
                .map_err(|e: String| ConfigError::InvalidValue("CORR_PRICE_FIELD".to_string(), e))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::InvalidValue(
                "threshold".to_string(),
                format!("{} is not in (0, 1]", self.threshold),
            ));
        }
        if self.window_size_days == 0 {
            return Err(ConfigError::InvalidValue(
                "window_size_days".to_string(),
                "must be positive".to_string(),
            ));
        }
        if self.step_days == 0 {
            return Err(ConfigError::InvalidValue(
                "step_days".to_string(),
                "must be positive".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ConfigError::InvalidValue(
                    "start".to_string(),
                    format!("{} is after end {}", start, end),
                ));
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    /// Field or variable name, reason
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::InvalidValue(key, reason) => write!(f, "Invalid {}: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.window_size_days, 30);
        assert_eq!(config.step_days, 7);
        assert_eq!(config.mode, GraphMode::Single);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{"threshold": 0.6, "mode": "pos_neg", "start": "2024-01-01", "end": "2024-06-30"}"#,
        )
        .unwrap();
        assert_eq!(config.threshold, 0.6);
        assert_eq!(config.mode, GraphMode::PosNeg);
        assert_eq!(config.window_size_days, 30);
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_json_validation() {
        let result = AnalysisConfig::from_json_str(r#"{"threshold": 0.0}"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(..))));
        let result = AnalysisConfig::from_json_str(r#"{"step_days": 0}"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(..))));
        let result = AnalysisConfig::from_json_str("not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CORR_THRESHOLD", "0.85"),
            ("CORR_WINDOW_DAYS", "60"),
            ("CORR_GRAPH_MODE", "split"),
            ("CORR_PRICE_FIELD", "close"),
        ]);
        let config = AnalysisConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.threshold, 0.85);
        assert_eq!(config.window_size_days, 60);
        assert_eq!(config.step_days, 7);
        assert_eq!(config.mode, GraphMode::PosNeg);
        assert_eq!(config.price_field, PriceField::Close);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let result = AnalysisConfig::default()
            .with_overrides(|key| (key == "CORR_STEP_DAYS").then(|| "weekly".to_string()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key, _)) if key == "CORR_STEP_DAYS"
        ));
    }
}
