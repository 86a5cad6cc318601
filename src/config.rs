//! Startup options
//!
//! `ClientOptions` is the serializable configuration surface of the client.
//! It can be loaded from YAML or JSON; callable login and logout actions
//! are added through `JwtClientBuilder` since they cannot be serialized.

use crate::auth::{
    AuthConfig, LoginAction, LoginDescriptor, DEFAULT_REFRESH_TOKEN_FIELD, DEFAULT_TOKEN_FIELD,
};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client options loaded from a file or built in code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Login response field carrying the access token
    #[serde(default, alias = "tokenFieldName")]
    pub token_field_name: Option<String>,

    /// Login response field carrying the refresh token
    #[serde(default, alias = "refreshTokenFieldName")]
    pub refresh_token_field_name: Option<String>,

    /// Endpoint exchanging a refresh token for a new pair
    #[serde(default, alias = "refreshTokenRetrievalUrl")]
    pub refresh_token_retrieval_url: Option<String>,

    /// Login endpoint description
    #[serde(default, alias = "loginActionInfo")]
    pub login: Option<LoginDescriptor>,

    /// Keep tokens in the persistence backend instead of process memory
    #[serde(default = "default_use_local_storage", alias = "useLocalStorage")]
    pub use_local_storage: bool,

    /// File backing the persistence backend (CLI sessions)
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Options passed through to the HTTP transport
    #[serde(default)]
    pub http: HttpClientConfig,
}

fn default_use_local_storage() -> bool {
    true
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            token_field_name: None,
            refresh_token_field_name: None,
            refresh_token_retrieval_url: None,
            login: None,
            use_local_storage: default_use_local_storage(),
            storage_path: None,
            http: HttpClientConfig::default(),
        }
    }
}

impl ClientOptions {
    /// Parse options from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "Options file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Check the options are consistent
    pub fn validate(&self) -> Result<()> {
        self.field_names()?;

        if let Some(login) = &self.login {
            login.validate()?;
        }

        if let Some(url) = &self.refresh_token_retrieval_url {
            if url.trim().is_empty() {
                return Err(Error::invalid_value(
                    "refresh_token_retrieval_url",
                    "must not be empty",
                ));
            }
        }

        if let Some(base) = &self.http.base_url {
            url::Url::parse(base)?;
        }

        Ok(())
    }

    /// Token field names; both must be set or neither
    pub fn field_names(&self) -> Result<(String, String)> {
        match (&self.token_field_name, &self.refresh_token_field_name) {
            (Some(token), Some(refresh)) => Ok((token.clone(), refresh.clone())),
            (None, None) => Ok((
                DEFAULT_TOKEN_FIELD.to_string(),
                DEFAULT_REFRESH_TOKEN_FIELD.to_string(),
            )),
            (Some(_), None) => Err(Error::invalid_value(
                "refresh_token_field_name",
                "must be set together with token_field_name",
            )),
            (None, Some(_)) => Err(Error::invalid_value(
                "token_field_name",
                "must be set together with refresh_token_field_name",
            )),
        }
    }

    /// Build the handler configuration
    pub fn auth_config(&self) -> Result<AuthConfig> {
        self.validate()?;
        let (token_field_name, refresh_token_field_name) = self.field_names()?;

        Ok(AuthConfig {
            token_field_name,
            refresh_token_field_name,
            refresh_token_retrieval_url: self.refresh_token_retrieval_url.clone(),
            login_action: self.login.clone().map(LoginAction::Descriptor),
            logout_action: None,
            use_local_storage: self.use_local_storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        let config = options.auth_config().unwrap();

        assert!(options.use_local_storage);
        assert_eq!(config.token_field_name, "token");
        assert_eq!(config.refresh_token_field_name, "refresh_token");
        assert!(config.refresh_token_retrieval_url.is_none());
        assert!(config.login_action.is_none());
    }

    #[test]
    fn test_options_from_yaml() {
        let yaml = r#"
token_field_name: access
refresh_token_field_name: renew
refresh_token_retrieval_url: https://api.example.com/auth/refresh
login:
  url: https://api.example.com/auth/login
  username_field: email
  password_field: secret
use_local_storage: false
http:
  base_url: https://api.example.com
  timeout: 10
"#;
        let options = ClientOptions::from_yaml_str(yaml).unwrap();
        let config = options.auth_config().unwrap();

        assert_eq!(config.token_field_name, "access");
        assert_eq!(config.refresh_token_field_name, "renew");
        assert!(!config.use_local_storage);
        assert_eq!(options.http.timeout, Duration::from_secs(10));
        match config.login_action {
            Some(LoginAction::Descriptor(d)) => assert_eq!(d.username_field, "email"),
            other => panic!("unexpected login action: {other:?}"),
        }
    }

    #[test]
    fn test_options_from_json_with_camel_case_names() {
        let json = r#"{
            "tokenFieldName": "token",
            "refreshTokenFieldName": "refresh_token",
            "refreshTokenRetrievalUrl": "/auth/refresh",
            "loginActionInfo": {"url": "/auth/login", "usernameField": "username", "passwordField": "password"}
        }"#;
        let options = ClientOptions::from_json_str(json).unwrap();

        assert!(options.use_local_storage);
        assert_eq!(
            options.refresh_token_retrieval_url.as_deref(),
            Some("/auth/refresh")
        );
        assert_eq!(options.login.unwrap().url, "/auth/login");
    }

    #[test]
    fn test_half_set_field_names_rejected() {
        let err = ClientOptions::from_yaml_str("token_field_name: access\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));

        let err = ClientOptions::from_yaml_str("refresh_token_field_name: renew\n").unwrap_err();
        assert!(err.to_string().contains("token_field_name"));
    }

    #[test]
    fn test_incomplete_login_descriptor_rejected() {
        let yaml = "login:\n  url: ''\n  username_field: u\n  password_field: p\n";
        let err = ClientOptions::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.to_string(), "Missing required config field: login.url");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = ClientOptions::from_yaml_str("http:\n  base_url: not a url\n").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_options_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.yaml");
        std::fs::write(&path, "refresh_token_retrieval_url: /refresh\n").unwrap();

        let options = ClientOptions::from_file(&path).unwrap();
        assert_eq!(options.refresh_token_retrieval_url.as_deref(), Some("/refresh"));

        let missing = ClientOptions::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(missing.to_string().contains("Options file not found"));

        let unreadable = ClientOptions::from_file(dir.path()).unwrap_err();
        assert!(unreadable.to_string().starts_with("Failed to read options file"));
    }
}
