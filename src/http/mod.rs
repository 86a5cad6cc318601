//! HTTP transport module
//!
//! Provides the request/response descriptions used by the interception
//! pipeline and the transport that actually sends them.
//!
//! # Features
//!
//! - **Uniform requests**: `ApiRequest` carries method, url, headers, body and
//!   the `second_attempt` retry marker
//! - **Settled responses**: `ApiResponse` keeps the originating request
//! - **Pluggable transport**: `Transport` trait, `reqwest` by default

mod transport;
mod types;

pub use transport::{HttpClientConfig, HttpClientConfigBuilder, ReqwestTransport, Transport};
pub use types::{ApiRequest, ApiResponse, AUTHORIZATION};
