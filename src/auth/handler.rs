//! JWT handler implementation
//!
//! Attaches bearer tokens to outgoing requests and runs the
//! refresh-and-retry cycle when a request fails with 401.
//!
//! ```text
//! request ─► attach_auth ─► transport ─► 2xx ─► on_response_success
//!                                      └► error ─► on_response_failure
//!                                                  │ eligible 401?
//!                                                  ├─ no  ─► original error
//!                                                  └─ yes ─► POST refresh url
//!                                                           ├─ ok   ─► resubmit once
//!                                                           └─ fail ─► logout + clear
//!                                                                      or original error
//! ```

use super::types::{AuthConfig, LoginAction, LoginResponse, RefreshRequest, RefreshResponse};
use crate::error::{Error, Result};
use crate::http::{ApiRequest, ApiResponse, Transport, AUTHORIZATION};
use crate::store::CredentialStore;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Response field read by callable login actions for the access token
const CALLABLE_TOKEN_FIELD: &str = "token";

/// Response field read by callable login actions for the refresh token
const CALLABLE_REFRESH_TOKEN_FIELD: &str = "refreshToken";

/// Auth interceptor and refresh coordinator
///
/// Owns the credential store and sends every request, including refresh
/// and login calls, through the same interception pipeline.
pub struct JwtHandler {
    config: RwLock<AuthConfig>,
    store: CredentialStore,
    transport: Arc<dyn Transport>,
}

impl JwtHandler {
    /// Create a handler
    ///
    /// Fails if the configured login action is an incomplete descriptor.
    pub fn new(
        config: AuthConfig,
        store: CredentialStore,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        if let Some(action) = &config.login_action {
            action.validate()?;
        }

        Ok(Self {
            config: RwLock::new(config),
            store,
            transport,
        })
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> AuthConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_config(&self, f: impl FnOnce(&mut AuthConfig)) {
        f(&mut self.config.write().unwrap_or_else(PoisonError::into_inner));
    }

    /// The credential store
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Set the login response fields read in endpoint mode
    pub fn set_token_field_names(
        &self,
        token_field_name: impl Into<String>,
        refresh_token_field_name: impl Into<String>,
    ) {
        let (token, refresh) = (token_field_name.into(), refresh_token_field_name.into());
        self.update_config(|c| {
            c.token_field_name = token;
            c.refresh_token_field_name = refresh;
        });
    }

    /// Set the refresh endpoint
    pub fn set_refresh_token_retrieval_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.update_config(|c| c.refresh_token_retrieval_url = Some(url));
    }

    /// Replace the login action
    pub fn set_login_action(&self, action: LoginAction) -> Result<()> {
        action.validate()?;
        self.update_config(|c| c.login_action = Some(action));
        Ok(())
    }

    /// Remove the login action
    pub fn clear_login_action(&self) {
        self.update_config(|c| c.login_action = None);
    }

    /// Set the action run, before the tokens are cleared, when a refresh fails
    pub fn set_logout_action<F>(&self, action: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.update_config(|c| c.logout_action = Some(Arc::new(action)));
    }

    /// Remove the logout action
    pub fn clear_logout_action(&self) {
        self.update_config(|c| c.logout_action = None);
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Current access token
    pub fn get_token(&self) -> Option<String> {
        self.store.get_access_token()
    }

    /// Current refresh token
    pub fn get_refresh_token(&self) -> Option<String> {
        self.store.get_refresh_token()
    }

    /// Set the access token manually
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set_access_token(token)
    }

    /// Set the refresh token manually
    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.store.set_refresh_token(token)
    }

    /// Remove both tokens
    pub fn clear_tokens(&self) -> Result<()> {
        self.store.clear()
    }

    // ========================================================================
    // Interception
    // ========================================================================

    /// Add `Authorization: Bearer <token>` when an access token is stored
    pub fn attach_auth(&self, request: ApiRequest) -> ApiRequest {
        let Some(token) = self.store.get_access_token() else {
            return request;
        };

        let mut request = request;
        request.set_header(AUTHORIZATION, format!("Bearer {token}"));
        request
    }

    /// Pass-through for successful responses
    pub fn on_response_success(&self, response: ApiResponse) -> ApiResponse {
        response
    }

    /// Send a request through the full pipeline
    ///
    /// Non-2xx responses become `Error::Status` and go through
    /// `on_response_failure`. Transport errors are returned as they are.
    pub fn dispatch(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse>> {
        async move {
            let request = self.attach_auth(request);
            let response = self.transport.send(request).await?;

            if response.is_success() {
                Ok(self.on_response_success(response))
            } else {
                self.on_response_failure(Error::status(response)).await
            }
        }
        .boxed()
    }

    /// Refresh the tokens and retry once if the failure is an eligible 401,
    /// otherwise return the error unchanged
    pub async fn on_response_failure(&self, error: Error) -> Result<ApiResponse> {
        let config = self.config();

        let Some((request, refresh_url, refresh_token)) = self.retry_candidate(&error, &config)
        else {
            return Err(error);
        };

        info!(
            "Received 401 for {} {}, refreshing token",
            request.method, request.url
        );

        match self.refresh(&refresh_url, refresh_token).await {
            Ok(()) => {
                let mut retry = self.attach_auth(request);
                retry.second_attempt = true;
                debug!("Resubmitting {} {} with new token", retry.method, retry.url);
                self.dispatch(retry).await
            }
            Err(refresh_error) => {
                warn!("Token refresh failed: {refresh_error}");
                match config.logout_action {
                    Some(logout) => {
                        info!("Running logout action and clearing tokens");
                        logout(&refresh_error);
                        if let Err(e) = self.store.clear() {
                            warn!("Failed to clear tokens after logout: {e}");
                        }
                        Err(Error::session_expired(refresh_error))
                    }
                    None => Err(error),
                }
            }
        }
    }

    /// The original request, refresh url and refresh token when `error` is a
    /// 401 that may be retried
    fn retry_candidate(
        &self,
        error: &Error,
        config: &AuthConfig,
    ) -> Option<(ApiRequest, String, String)> {
        let response = error.response()?;
        if response.status != 401 || response.request.second_attempt {
            return None;
        }

        let refresh_url = config.refresh_token_retrieval_url.as_ref()?;
        if response.request.url == *refresh_url {
            return None;
        }

        let refresh_token = self.store.get_refresh_token()?;
        Some((response.request.clone(), refresh_url.clone(), refresh_token))
    }

    /// Exchange the refresh token for a new pair and persist it
    async fn refresh(&self, url: &str, refresh_token: String) -> Result<()> {
        let body = serde_json::to_value(RefreshRequest {
            token: self.store.get_access_token(),
            refresh_token,
        })?;

        let response = self.dispatch(ApiRequest::post(url, body)).await?;
        let tokens: RefreshResponse = response.json()?;
        let token = tokens.token.ok_or_else(|| Error::missing_token("token"))?;
        let refresh_token = tokens
            .refresh_token
            .ok_or_else(|| Error::missing_token("refresh_token"))?;

        self.store.set_credentials(&token, &refresh_token)?;
        debug!("Stored refreshed tokens");
        Ok(())
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Sign in with the configured login action and store the token pair
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let config = self.config();

        match config.login_action {
            Some(LoginAction::Callable(handler)) => {
                let response = handler.login(username, password).await?;
                self.store_login_tokens(
                    &response,
                    CALLABLE_TOKEN_FIELD,
                    CALLABLE_REFRESH_TOKEN_FIELD,
                )?;
            }
            Some(LoginAction::Descriptor(descriptor)) => {
                let mut body = Map::new();
                body.insert(
                    descriptor.username_field.clone(),
                    Value::String(username.to_string()),
                );
                body.insert(
                    descriptor.password_field.clone(),
                    Value::String(password.to_string()),
                );

                let response = self
                    .dispatch(ApiRequest::post(&descriptor.url, Value::Object(body)))
                    .await?;
                self.store_login_tokens(
                    &LoginResponse::new(response.data),
                    &config.token_field_name,
                    &config.refresh_token_field_name,
                )?;
            }
            None => return Err(Error::MissingLoginAction),
        }

        info!("Signed in as {username}");
        Ok(true)
    }

    fn store_login_tokens(
        &self,
        response: &LoginResponse,
        token_field: &str,
        refresh_token_field: &str,
    ) -> Result<()> {
        let token = response
            .data
            .get(token_field)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::missing_token(token_field))?;
        let refresh_token = response
            .data
            .get(refresh_token_field)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::missing_token(refresh_token_field))?;

        self.store.set_credentials(token, refresh_token)
    }
}

impl std::fmt::Debug for JwtHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHandler")
            .field("config", &self.config())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
