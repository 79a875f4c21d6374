pub mod envelope;
pub mod fallback;
pub mod order;
pub mod retry;
pub mod store_api;
pub mod tiendanube;
pub mod timeout;
pub mod traits;

pub use fallback::FallbackCatalog;
pub use order::OrderRecord;
pub use retry::RetryPolicy;
pub use store_api::StoreApiClient;
pub use tiendanube::TiendanubeClient;
pub use timeout::bounded;
pub use traits::{CatalogAdapter, OrderAdapter};

use thiserror::Error;

/// Failure talking to an upstream collaborator.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl AdapterError {
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Transient failures that are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) | Self::NotConfigured(_) => false,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else if let Some(status) = error.status() {
            Self::request_failed(status.as_u16(), error.to_string())
        } else {
            Self::Connection(error.to_string())
        }
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AdapterError::Connection("refused".into()).is_retryable());
        assert!(AdapterError::Timeout("15s".into()).is_retryable());
        assert!(AdapterError::request_failed(503, "down").is_retryable());
        assert!(AdapterError::request_failed(429, "slow down").is_retryable());
        assert!(!AdapterError::request_failed(404, "missing").is_retryable());
        assert!(!AdapterError::invalid_response("not json").is_retryable());
        assert!(!AdapterError::NotConfigured("tiendanube".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AdapterError::request_failed(502, "bad gateway").to_string(),
            "Request failed with status 502: bad gateway"
        );
    }
}
