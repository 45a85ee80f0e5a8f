use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Caught before any network call; never sent to the exchange.
    #[error("Invalid parameters: {0}")]
    ValidationError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    /// Network failure that left the exchange untouched, or an idempotent call that ran out of
    /// retries.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Structured error returned by the exchange. `code` and `message` are kept verbatim.
    #[error("Exchange rejected request: {code} - {message}")]
    ExchangeRejection {
        code: i32,
        message: String,
        retry_after: Option<Duration>,
    },

    /// A mutating call may or may not have been executed by the exchange.
    #[error("Outcome unknown for {endpoint}: {reason}")]
    UnknownOutcome { endpoint: String, reason: String },

    #[error("Clock error: {0}")]
    ClockError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

/// Coarse classification of exchange rejection codes, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InsufficientMargin,
    InvalidSymbol,
    RateLimited,
    PositionConflict,
    NoChange,
    OrderNotFound,
    Other,
}

impl RejectionKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            -2018 | -2019 | -2027 | -2028 => Self::InsufficientMargin,
            -1121 | -4141 => Self::InvalidSymbol,
            -1003 | 418 | 429 => Self::RateLimited,
            -4047 | -4048 | -4061 | -4161 => Self::PositionConflict,
            -4046 | -4059 => Self::NoChange,
            -2011 | -2013 => Self::OrderNotFound,
            _ => Self::Other,
        }
    }
}

impl ExchangeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::SigningError(message.into())
    }

    /// Whether the caller may safely repeat the same operation.
    ///
    /// `UnknownOutcome` is deliberately excluded: the caller has to reconcile first.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportError(_) => true,
            Self::ExchangeRejection { code, .. } => {
                RejectionKind::from_code(*code) == RejectionKind::RateLimited
            }
            _ => false,
        }
    }

    /// Backoff hint supplied by the exchange on rate-limit responses.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::ExchangeRejection { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            Self::ExchangeRejection { code, .. } => Some(RejectionKind::from_code(*code)),
            _ => None,
        }
    }

    pub const fn is_unknown_outcome(&self) -> bool {
        matches!(self, Self::UnknownOutcome { .. })
    }
}

impl From<crate::core::types::TypesError> for ExchangeError {
    fn from(err: crate::core::types::TypesError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::DeserializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_kind_mapping() {
        let err = ExchangeError::ExchangeRejection {
            code: -2019,
            message: "Margin is insufficient.".to_string(),
            retry_after: None,
        };
        assert_eq!(err.rejection_kind(), Some(RejectionKind::InsufficientMargin));
        assert!(!err.is_retryable());
        assert_eq!(RejectionKind::from_code(-4046), RejectionKind::NoChange);
        assert_eq!(RejectionKind::from_code(-9999), RejectionKind::Other);
    }

    #[test]
    fn test_rate_limit_carries_hint() {
        let err = ExchangeError::ExchangeRejection {
            code: 429,
            message: "Too many requests".to_string(),
            retry_after: Some(Duration::from_secs(3)),
        };
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_unknown_outcome_is_not_retryable() {
        let err = ExchangeError::UnknownOutcome {
            endpoint: "/fapi/v3/order".to_string(),
            reason: "connection reset".to_string(),
        };
        assert!(err.is_unknown_outcome());
        assert!(!err.is_retryable());
        assert!(err.rejection_kind().is_none());
    }
}
