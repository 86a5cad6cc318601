//! Auth configuration types
//!
//! These types describe how the handler logs in, where it refreshes tokens
//! and what it does when a session cannot be recovered.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Default response field carrying the access token
pub const DEFAULT_TOKEN_FIELD: &str = "token";

/// Default response field carrying the refresh token
pub const DEFAULT_REFRESH_TOKEN_FIELD: &str = "refresh_token";

/// Result of a callable login action
///
/// `data` must be a JSON object with string fields `token` and
/// `refreshToken`. The configured field names do not apply here.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    /// Response body
    pub data: Value,
}

impl LoginResponse {
    /// Wrap a response body
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

/// User-supplied login routine
#[async_trait]
pub trait LoginHandler: Send + Sync {
    /// Exchange credentials for a token pair
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse>;
}

#[async_trait]
impl<F, Fut> LoginHandler for F
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<LoginResponse>> + Send + 'static,
{
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        (self)(username.to_string(), password.to_string()).await
    }
}

/// Login endpoint called directly by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDescriptor {
    /// Login endpoint URL
    pub url: String,
    /// Body field carrying the username
    #[serde(alias = "usernameField")]
    pub username_field: String,
    /// Body field carrying the password
    #[serde(alias = "passwordField")]
    pub password_field: String,
}

impl LoginDescriptor {
    /// Check that every field is set
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::missing_field("login.url"));
        }
        if self.username_field.trim().is_empty() {
            return Err(Error::missing_field("login.username_field"));
        }
        if self.password_field.trim().is_empty() {
            return Err(Error::missing_field("login.password_field"));
        }
        Ok(())
    }
}

/// How `login` obtains tokens
#[derive(Clone)]
pub enum LoginAction {
    /// Call user code
    Callable(Arc<dyn LoginHandler>),
    /// POST the credentials to an endpoint
    Descriptor(LoginDescriptor),
}

impl LoginAction {
    /// Login through user code
    pub fn callable<H: LoginHandler + 'static>(handler: H) -> Self {
        Self::Callable(Arc::new(handler))
    }

    /// Login through an endpoint, validating the descriptor
    pub fn descriptor(
        url: impl Into<String>,
        username_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Result<Self> {
        let descriptor = LoginDescriptor {
            url: url.into(),
            username_field: username_field.into(),
            password_field: password_field.into(),
        };
        descriptor.validate()?;
        Ok(Self::Descriptor(descriptor))
    }

    /// Check the action is usable
    pub fn validate(&self) -> Result<()> {
        match self {
            LoginAction::Callable(_) => Ok(()),
            LoginAction::Descriptor(descriptor) => descriptor.validate(),
        }
    }
}

impl std::fmt::Debug for LoginAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginAction::Callable(_) => f.write_str("Callable(..)"),
            LoginAction::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
        }
    }
}

/// Invoked with the refresh failure before the tokens are cleared
pub type LogoutAction = Arc<dyn Fn(&Error) + Send + Sync>;

/// Handler configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Login response field carrying the access token (endpoint mode)
    pub token_field_name: String,
    /// Login response field carrying the refresh token (endpoint mode)
    pub refresh_token_field_name: String,
    /// Endpoint exchanging a refresh token for a new pair
    pub refresh_token_retrieval_url: Option<String>,
    /// How `login` obtains tokens
    pub login_action: Option<LoginAction>,
    /// Runs when a refresh fails
    pub logout_action: Option<LogoutAction>,
    /// Keep tokens in the persistence backend instead of process memory
    pub use_local_storage: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_field_name: DEFAULT_TOKEN_FIELD.to_string(),
            refresh_token_field_name: DEFAULT_REFRESH_TOKEN_FIELD.to_string(),
            refresh_token_retrieval_url: None,
            login_action: None,
            logout_action: None,
            use_local_storage: true,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_field_name", &self.token_field_name)
            .field("refresh_token_field_name", &self.refresh_token_field_name)
            .field("refresh_token_retrieval_url", &self.refresh_token_retrieval_url)
            .field("login_action", &self.login_action)
            .field("has_logout_action", &self.logout_action.is_some())
            .field("use_local_storage", &self.use_local_storage)
            .finish()
    }
}

/// Body of a refresh call
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefreshRequest {
    pub token: Option<String>,
    pub refresh_token: String,
}

/// Body returned by the refresh endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefreshResponse {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}
