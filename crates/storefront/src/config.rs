//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STORECART_STORAGE_PATH` - File backing the persistent storage area
//!   (default: `.storecart/local_storage.json`)
//! - `STORECART_STORAGE_KEY` - Storage key of the cart slot (default: `cart`)
//! - `STORECART_WHATSAPP_NUMBER` - Checkout number, digits only
//!   (default: `6285775230813`)
//! - `STORECART_WHATSAPP_BASE_URL` - Deep link base (default: `https://wa.me`)
//! - `STORECART_ORDER_GREETING` - First line of the order message
//! - `STORECART_ORDER_CLOSING` - Last line of the order message
//! - `STORECART_BUSY_MS` - Quantity control hold in milliseconds (default: 300)
//! - `STORECART_TOAST_MS` - Toast lifetime in milliseconds (default: 3000)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::checkout::{
    CheckoutConfig, DEFAULT_BASE_URL, DEFAULT_CLOSING, DEFAULT_GREETING, DEFAULT_PHONE_NUMBER,
};
use crate::presentation::PresentationConfig;
use crate::store::DEFAULT_SLOT;

/// Default location of the persistent storage file.
pub const DEFAULT_STORAGE_PATH: &str = ".storecart/local_storage.json";

const MAX_PHONE_DIGITS: usize = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub storage: StorageConfig,
    pub checkout: CheckoutConfig,
    pub presentation: PresentationConfig,
}

/// Where the cart is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// File backing the persistent storage area.
    pub path: PathBuf,
    /// Storage key of the cart slot.
    pub slot: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
            slot: DEFAULT_SLOT.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            storage: StorageConfig::from_env()?,
            checkout: checkout_from_env()?,
            presentation: presentation_from_env()?,
        })
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let slot = get_env_or_default("STORECART_STORAGE_KEY", DEFAULT_SLOT);
        if slot.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "STORECART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            path: PathBuf::from(get_env_or_default(
                "STORECART_STORAGE_PATH",
                DEFAULT_STORAGE_PATH,
            )),
            slot,
        })
    }
}

fn checkout_from_env() -> Result<CheckoutConfig, ConfigError> {
    let phone_number = validate_phone_number(
        "STORECART_WHATSAPP_NUMBER",
        &get_env_or_default("STORECART_WHATSAPP_NUMBER", DEFAULT_PHONE_NUMBER),
    )?;
    let base_url = validate_base_url(
        "STORECART_WHATSAPP_BASE_URL",
        &get_env_or_default("STORECART_WHATSAPP_BASE_URL", DEFAULT_BASE_URL),
    )?;

    Ok(CheckoutConfig {
        base_url,
        phone_number,
        greeting: get_optional_env("STORECART_ORDER_GREETING")
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        closing: get_optional_env("STORECART_ORDER_CLOSING")
            .unwrap_or_else(|| DEFAULT_CLOSING.to_string()),
    })
}

fn presentation_from_env() -> Result<PresentationConfig, ConfigError> {
    let defaults = PresentationConfig::default();
    Ok(PresentationConfig {
        busy_hold: get_optional_env("STORECART_BUSY_MS")
            .map(|value| parse_millis("STORECART_BUSY_MS", &value))
            .transpose()?
            .unwrap_or(defaults.busy_hold),
        toast_duration: get_optional_env("STORECART_TOAST_MS")
            .map(|value| parse_millis("STORECART_TOAST_MS", &value))
            .transpose()?
            .unwrap_or(defaults.toast_duration),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a millisecond count.
fn parse_millis(var_name: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

/// Validate an international phone number written as digits only.
fn validate_phone_number(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must contain digits only, without '+' or spaces".to_string(),
        ));
    }
    if value.len() > MAX_PHONE_DIGITS {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be at most {MAX_PHONE_DIGITS} digits (got {})", value.len()),
        ));
    }
    Ok(value.to_string())
}

/// Validate that the deep link base is an absolute http(s) URL.
fn validate_base_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.storage.slot, "cart");
        assert_eq!(
            config.storage.path,
            PathBuf::from(".storecart/local_storage.json")
        );
        assert_eq!(config.checkout.phone_number, "6285775230813");
        assert_eq!(config.presentation.busy_hold, Duration::from_millis(300));
        assert_eq!(config.presentation.toast_duration, Duration::from_millis(3000));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(
            parse_millis("TEST_VAR", " 250 ").unwrap(),
            Duration::from_millis(250)
        );
        assert!(matches!(
            parse_millis("TEST_VAR", "fast"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_millis("TEST_VAR", "-1").is_err());
    }

    #[test]
    fn test_validate_phone_number_valid() {
        assert_eq!(
            validate_phone_number("TEST_VAR", "6285775230813").unwrap(),
            "6285775230813"
        );
    }

    #[test]
    fn test_validate_phone_number_rejects_formatting() {
        assert!(validate_phone_number("TEST_VAR", "+6285775230813").is_err());
        assert!(validate_phone_number("TEST_VAR", "0857 7523 0813").is_err());
        assert!(validate_phone_number("TEST_VAR", "").is_err());
    }

    #[test]
    fn test_validate_phone_number_too_long() {
        let err = validate_phone_number("TEST_VAR", "1234567890123456").unwrap_err();
        assert!(err.to_string().contains("at most 15 digits"));
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url("TEST_VAR", "https://wa.me/").unwrap(),
            "https://wa.me"
        );
        assert!(validate_base_url("TEST_VAR", "wa.me").is_err());
        assert!(validate_base_url("TEST_VAR", "ftp://wa.me").is_err());
    }

    #[test]
    fn test_error_names_variable() {
        let err = parse_millis("STORECART_BUSY_MS", "soon").unwrap_err();
        assert!(err.to_string().contains("STORECART_BUSY_MS"));
    }
}
