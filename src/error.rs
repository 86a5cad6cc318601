//! Error types for the JWT refresh client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::http::ApiResponse;
use thiserror::Error;

/// A settled response whose status was not 2xx.
///
/// Carries the full response, including the request that produced it, so the
/// refresh coordinator can inspect and resubmit the original request.
#[derive(Debug, Clone)]
pub struct FailedResponse {
    /// The response as received from the transport
    pub response: ApiResponse,
}

impl std::fmt::Display for FailedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HTTP {} from {} {}",
            self.response.status, self.response.request.method, self.response.request.url
        )
    }
}

/// The main error type for the JWT refresh client
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error(
        "Login action not defined: configure one with set_login_action or set the tokens manually"
    )]
    MissingLoginAction,

    #[error("Token field '{field}' not provided in response")]
    MissingTokenField { field: String },

    #[error("Session expired: token refresh failed ({source})")]
    SessionExpired {
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Status(Box<FailedResponse>),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing token field error
    pub fn missing_token(field: impl Into<String>) -> Self {
        Self::MissingTokenField {
            field: field.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Wrap a non-2xx response
    pub fn status(response: ApiResponse) -> Self {
        Self::Status(Box::new(FailedResponse { response }))
    }

    /// Wrap a refresh failure after the logout path ran
    pub fn session_expired(source: Error) -> Self {
        Self::SessionExpired {
            source: Box::new(source),
        }
    }

    /// HTTP status code, if this error carries a settled response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status(failed) => Some(failed.response.status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The failed response, if this error carries one
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Error::Status(failed) => Some(&failed.response),
            _ => None,
        }
    }

    /// Check if this error is a 401 Unauthorized response
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

/// Result type alias for the JWT refresh client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiRequest;
    use reqwest::Method;

    fn response(status: u16) -> ApiResponse {
        ApiResponse {
            status,
            headers: Default::default(),
            data: serde_json::Value::Null,
            request: ApiRequest::new(Method::GET, "https://example.com/private"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("login.url");
        assert_eq!(err.to_string(), "Missing required config field: login.url");

        let err = Error::status(response(404));
        assert_eq!(
            err.to_string(),
            "HTTP 404 from GET https://example.com/private"
        );
    }

    #[test]
    fn test_missing_login_action_is_descriptive() {
        let msg = Error::MissingLoginAction.to_string();
        assert!(msg.contains("set_login_action"));
        assert!(msg.contains("manually"));
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(Error::status(response(401)).is_unauthorized());
        assert!(!Error::status(response(403)).is_unauthorized());
        assert!(!Error::config("x").is_unauthorized());
        assert_eq!(Error::status(response(500)).status_code(), Some(500));
    }

    #[test]
    fn test_session_expired_keeps_source() {
        let err = Error::session_expired(Error::status(response(400)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "HTTP 400 from GET https://example.com/private");
    }

    #[test]
    fn test_anyhow_is_transparent() {
        let err: Error = anyhow::anyhow!("bad credentials").into();
        assert_eq!(err.to_string(), "bad credentials");
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
