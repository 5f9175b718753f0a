//! Error kinds surfaced by the converter and the rate provider

use thiserror::Error;

/// Every way a quote fetch can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Request error: {0}")]
    Transport(String),
    #[error("HTTP error: {0}")]
    Status(String),
    #[error("Failed to parse quote response: {0}")]
    Malformed(String),
    #[error("No usable {0} rate in quote response")]
    MissingRate(String),
    #[error("Quote provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("'{input}' is not a valid number")]
    Validation { input: String },
    /// The rate is unset. A background refresh has been requested.
    #[error("Exchange rate not available yet, try again shortly")]
    RateUnavailable,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ConvertError {
    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConvertError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConvertError::Validation {
            input: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "'abc' is not a valid number");
        assert!(!err.is_retryable());

        let err = ConvertError::from(FetchError::MissingRate("BRL".to_string()));
        assert_eq!(err.to_string(), "No usable BRL rate in quote response");
        assert!(err.is_retryable());
        assert!(ConvertError::RateUnavailable.is_retryable());
    }
}
