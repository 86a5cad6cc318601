//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::JwtClient;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use reqwest::Method;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Token store used when neither the CLI nor the options name one
pub const DEFAULT_STORE_FILE: &str = ".jwt-tokens.json";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = JwtClient::from_options(self.options()?)?;

        match &self.cli.command {
            Commands::Login { username, password } => {
                client.login(username, password).await?;
                self.emit(&json!({"signed_in": true, "username": username}));
                Ok(())
            }
            Commands::Request {
                method,
                url,
                data,
                headers,
            } => {
                let request = build_request(method, url, data.as_deref(), headers)?;
                let response = client.request(request).await?;
                self.emit(&response.data);
                Ok(())
            }
            Commands::Tokens => {
                let credentials = client.handler().store().credentials();
                self.emit(&json!({
                    "access_token": credentials.access_token.is_some(),
                    "refresh_token": credentials.refresh_token.is_some(),
                }));
                Ok(())
            }
            Commands::Logout => {
                client.clear_tokens()?;
                self.emit(&json!({"signed_in": false}));
                Ok(())
            }
        }
    }

    /// Load options and resolve the token store path
    fn options(&self) -> Result<ClientOptions> {
        let mut options = match &self.cli.options {
            Some(path) => ClientOptions::from_file(path)?,
            None => ClientOptions::default(),
        };

        if let Some(store) = &self.cli.store {
            options.storage_path = Some(store.clone());
        }
        if options.storage_path.is_none() {
            options.storage_path = Some(PathBuf::from(DEFAULT_STORE_FILE));
        }
        // Tokens must outlive the process between CLI invocations
        if !options.use_local_storage {
            warn!("Ignoring use_local_storage: false, CLI sessions keep tokens in the store file");
            options.use_local_storage = true;
        }

        debug!(
            "Using token store {}",
            options
                .storage_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
        Ok(options)
    }

    fn emit(&self, value: &Value) {
        let output = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        };
        match output {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Failed to render output: {e}"),
        }
    }
}

/// Build a request from command-line arguments
pub fn build_request(
    method: &str,
    url: &str,
    data: Option<&str>,
    headers: &[String],
) -> Result<ApiRequest> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::invalid_value("method", format!("unknown HTTP method '{method}'")))?;
    let mut request = ApiRequest::new(method, url);

    if let Some(data) = data {
        request = request.json(serde_json::from_str(data)?);
    }

    for header in headers {
        let (name, value) = header.split_once(':').ok_or_else(|| {
            Error::invalid_value("header", format!("expected 'Name: value', got '{header}'"))
        })?;
        request = request.header(name.trim(), value.trim());
    }

    Ok(request)
}
