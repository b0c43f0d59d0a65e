use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol used as the canonical node key in every correlation graph.
///
/// Accepts alphanumerics plus `.`, `-` and `_` (e.g. "AAPL", "BRK.B", "BF-B").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a symbol.
    ///
    /// # Errors
    /// Returns an error if the symbol is empty or contains invalid characters.
    pub fn new(symbol: impl Into<String>) -> Result<Self, TickerError> {
        let symbol = symbol.into();
        Self::validate(&symbol)?;
        Ok(Ticker(symbol))
    }

    fn validate(symbol: &str) -> Result<(), TickerError> {
        if symbol.is_empty() {
            return Err(TickerError::EmptySymbol);
        }

        if !symbol
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(TickerError::InvalidCharacters(symbol.to_string()));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::new(value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = TickerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ticker::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

/// Errors that can occur when creating or validating tickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerError {
    /// The symbol is empty
    EmptySymbol,
    /// The symbol contains characters outside the allowed set
    InvalidCharacters(String),
}

impl fmt::Display for TickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerError::EmptySymbol => write!(f, "Ticker symbol cannot be empty"),
            TickerError::InvalidCharacters(symbol) => {
                write!(f, "Ticker symbol '{}' contains invalid characters", symbol)
            }
        }
    }
}

impl std::error::Error for TickerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_creation_valid() {
        let ticker = Ticker::new("AAPL").unwrap();
        assert_eq!(ticker.as_str(), "AAPL");
        assert!(Ticker::new("BRK.B").is_ok());
        assert!(Ticker::new("BF-B").is_ok());
    }

    #[test]
    fn test_ticker_creation_empty_string() {
        assert_eq!(Ticker::new("").unwrap_err(), TickerError::EmptySymbol);
    }

    #[test]
    fn test_ticker_invalid_characters() {
        let result = Ticker::new("AAPL@");
        assert!(matches!(result, Err(TickerError::InvalidCharacters(_))));
    }

    #[test]
    fn test_ticker_ordering_is_lexicographic() {
        let mut tickers = vec![
            Ticker::new("MSFT").unwrap(),
            Ticker::new("AAPL").unwrap(),
            Ticker::new("GOOGL").unwrap(),
        ];
        tickers.sort();
        let symbols: Vec<_> = tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(symbols, vec!["AAPL", "GOOGL", "MSFT"]);
    }

    #[test]
    fn test_ticker_serde_validates() {
        let ticker: Ticker = serde_json::from_str("\"XOM\"").unwrap();
        assert_eq!(ticker.to_string(), "XOM");
        assert!(serde_json::from_str::<Ticker>("\"\"").is_err());
    }
}
