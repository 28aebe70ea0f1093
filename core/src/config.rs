//! Immutable client configuration: API base URL and key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, Secret};

use crate::error::ApiError;

/// Public API base used when `MAILING_LISTS_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net/v2";

/// Fixed basic-auth username; the API key is the password.
pub const BASIC_AUTH_USER: &str = "api";

pub const API_KEY_ENV: &str = "MAILING_LISTS_API_KEY";
pub const BASE_URL_ENV: &str = "MAILING_LISTS_BASE_URL";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    api_key: Secret<String>,
}

impl ClientConfig {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: Secret::new(api_key.into()),
        }
    }

    /// Read the key from `MAILING_LISTS_API_KEY` and, optionally, the base URL
    /// from `MAILING_LISTS_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ApiError::ConfigError(format!("{API_KEY_ENV} is not set")))?;
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::from_parts(&base_url, api_key)
    }

    fn from_parts(base_url: &str, api_key: String) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::ConfigError("API key is empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::ConfigError(format!(
                "base URL must be http(s): {base_url}"
            )));
        }
        Ok(Self::new(base_url, api_key))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `Authorization` header value for every request.
    pub(crate) fn authorization(&self) -> String {
        let credentials = format!("{BASIC_AUTH_USER}:{}", self.api_key.expose_secret());
        format!("Basic {}", STANDARD.encode(credentials))
    }
}
