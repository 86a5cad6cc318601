//! JWT-aware HTTP client
//!
//! `JwtClient` wraps a transport with the `JwtHandler` pipeline: every
//! request gets the bearer token, and a 401 triggers one refresh-and-retry.

use crate::auth::{AuthConfig, JwtHandler, LoginAction, LoginHandler};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, ApiResponse, HttpClientConfig, ReqwestTransport, Transport};
use crate::store::{CredentialStore, FilePersistence, Persistence};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// HTTP client with transparent JWT handling
#[derive(Debug, Clone)]
pub struct JwtClient {
    handler: Arc<JwtHandler>,
}

impl JwtClient {
    /// Create a client with default options
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client from startup options
    pub fn from_options(options: ClientOptions) -> Result<Self> {
        Self::builder().options(options).build()
    }

    /// Create a client builder
    pub fn builder() -> JwtClientBuilder {
        JwtClientBuilder::default()
    }

    /// The auth handler
    pub fn handler(&self) -> &JwtHandler {
        &self.handler
    }

    /// Send a request through the auth pipeline
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.handler.dispatch(request).await
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.request(ApiRequest::get(url)).await
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get(url).await?.json()
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request(ApiRequest::post(url, body)).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request(ApiRequest::new(Method::PUT, url).json(body))
            .await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request(ApiRequest::new(Method::PATCH, url).json(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        self.request(ApiRequest::new(Method::DELETE, url)).await
    }

    /// Sign in with the configured login action
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        self.handler.login(username, password).await
    }

    /// Remove both tokens
    pub fn clear_tokens(&self) -> Result<()> {
        self.handler.clear_tokens()
    }
}

/// Builder for `JwtClient`
#[derive(Default)]
pub struct JwtClientBuilder {
    options: ClientOptions,
    login_action: Option<LoginAction>,
    logout_action: Option<crate::auth::LogoutAction>,
    transport: Option<Arc<dyn Transport>>,
    persistence: Option<Arc<dyn Persistence>>,
}

impl JwtClientBuilder {
    /// Replace all startup options
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Set both login response field names
    pub fn token_field_names(
        mut self,
        token_field_name: impl Into<String>,
        refresh_token_field_name: impl Into<String>,
    ) -> Self {
        self.options.token_field_name = Some(token_field_name.into());
        self.options.refresh_token_field_name = Some(refresh_token_field_name.into());
        self
    }

    /// Set the refresh endpoint
    pub fn refresh_token_retrieval_url(mut self, url: impl Into<String>) -> Self {
        self.options.refresh_token_retrieval_url = Some(url.into());
        self
    }

    /// Sign in by POSTing the credentials to `url`
    ///
    /// Fails if any field is empty.
    pub fn login_descriptor(
        mut self,
        url: impl Into<String>,
        username_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Result<Self> {
        self.login_action = Some(LoginAction::descriptor(
            url,
            username_field,
            password_field,
        )?);
        Ok(self)
    }

    /// Sign in through user code
    pub fn login_callable<H: LoginHandler + 'static>(mut self, handler: H) -> Self {
        self.login_action = Some(LoginAction::callable(handler));
        self
    }

    /// Run `action` with the refresh failure before clearing the tokens
    pub fn logout_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.logout_action = Some(Arc::new(action));
        self
    }

    /// Keep tokens in the persistence backend (default) or in memory
    pub fn use_local_storage(mut self, enabled: bool) -> Self {
        self.options.use_local_storage = enabled;
        self
    }

    /// Persistence backend used when local storage is enabled
    pub fn persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Options for the default `reqwest` transport
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.options.http = config;
        self
    }

    /// Send requests through a custom transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<JwtClient> {
        let mut config: AuthConfig = self.options.auth_config()?;
        if self.login_action.is_some() {
            config.login_action = self.login_action;
        }
        config.logout_action = self.logout_action;

        let persistence = match (self.persistence, &self.options.storage_path) {
            (Some(persistence), _) => Some(persistence),
            (None, Some(path)) => {
                Some(Arc::new(FilePersistence::open(path)?) as Arc<dyn Persistence>)
            }
            (None, None) => None,
        };
        let store = CredentialStore::from_flag(config.use_local_storage, persistence);

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_config(self.options.http)?),
        };

        Ok(JwtClient {
            handler: Arc::new(JwtHandler::new(config, store, transport)?),
        })
    }
}
