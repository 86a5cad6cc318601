#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # JWT Refresh Client
//!
//! An HTTP client with transparent JWT bearer authentication.
//! Tokens are attached to every request, and a rejected access token is
//! refreshed and the request retried exactly once.
//!
//! ## Features
//!
//! - **Bearer Injection**: `Authorization: Bearer <token>` on every request
//! - **Refresh and Retry**: one refresh and one resubmission per 401
//! - **Login Actions**: user callable or a login endpoint descriptor
//! - **Pluggable Storage**: in-memory, injected key-value store, or JSON file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jwt_refresh_client::{JwtClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = JwtClient::builder()
//!         .login_descriptor("https://api.example.com/login", "username", "password")?
//!         .refresh_token_retrieval_url("https://api.example.com/refresh")
//!         .logout_action(|err| eprintln!("session ended: {err}"))
//!         .build()?;
//!
//!     client.login("marian", "nowak").await?;
//!     let profile = client.get("https://api.example.com/me").await?;
//!     println!("{}", profile.data);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          JwtClient                           │
//! │      request() / get() / post() / login() / clear_tokens()   │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │                          JwtHandler                          │
//! │  attach_auth → Transport → on_response_success / _failure    │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │                              │
//! ┌───────────────┴──────────────┐ ┌─────────────┴───────────────┐
//! │       CredentialStore        │ │          Transport          │
//! │ memory │ Persistence kv/file │ │      ReqwestTransport       │
//! └──────────────────────────────┘ └─────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Request/response descriptions and the HTTP transport
pub mod http;

/// Token storage
pub mod store;

/// Bearer injection, login and refresh
pub mod auth;

/// Startup options
pub mod config;

/// Client facade
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AuthConfig, JwtHandler, LoginAction, LoginResponse};
pub use client::{JwtClient, JwtClientBuilder};
pub use config::ClientOptions;
pub use error::{Error, Result};
pub use http::{ApiRequest, ApiResponse, Transport};
pub use store::{CredentialStore, Persistence};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
