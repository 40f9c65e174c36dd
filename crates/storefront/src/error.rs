//! Unified error handling.
//!
//! Provides a unified `AppError` type for callers that drive the whole
//! storefront (the CLI, embedding hosts). Individual components keep their
//! own error types and convert into this one.

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A cart operation failed to persist.
    #[error("Cart error: {0}")]
    Store(#[from] StoreError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// A fragment failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Invalid input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the error was caused by the caller rather than the storefront.
    ///
    /// The CLI exits with status 2 for these and 1 otherwise.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_) | Self::Checkout(CheckoutError::EmptyCart)
        )
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid key".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid key");

        let err = AppError::from(CheckoutError::EmptyCart);
        assert_eq!(err.to_string(), "Checkout error: cart is empty");

        let err = AppError::from(ConfigError::InvalidEnvVar(
            "STORECART_BUSY_MS".to_string(),
            "invalid digit found in string".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Config error: Invalid environment variable STORECART_BUSY_MS: invalid digit found in string"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(AppError::BadRequest("x".to_string()).is_client_error());
        assert!(AppError::from(CheckoutError::EmptyCart).is_client_error());
        assert!(!AppError::from(StoreError::from(StorageError::Poisoned)).is_client_error());
    }
}
