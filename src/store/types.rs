//! Credential types

/// Persistence key for the access token
pub const ACCESS_TOKEN_KEY: &str = "jwt_token";

/// Persistence key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "jwt_refresh_token";

/// Current token pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Short-lived bearer token
    pub access_token: Option<String>,
    /// Token exchanged for a new access token
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Create a full token pair
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Check if neither token is present
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}
