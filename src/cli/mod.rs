//! CLI module
//!
//! Command-line interface for signing in and sending authenticated requests.
//!
//! # Commands
//!
//! - `login` - Sign in with the configured login endpoint
//! - `request` - Send a request with the stored bearer token
//! - `tokens` - Show which tokens are stored
//! - `logout` - Remove the stored tokens

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{build_request, Runner, DEFAULT_STORE_FILE};
