//! Authentication module
//!
//! The `JwtHandler` attaches bearer tokens to outgoing requests, signs in
//! through a configurable login action, and refreshes the token pair once
//! when a request is rejected with 401.

mod handler;
mod types;

pub use handler::JwtHandler;
pub use types::{
    AuthConfig, LoginAction, LoginDescriptor, LoginHandler, LoginResponse, LogoutAction,
    DEFAULT_REFRESH_TOKEN_FIELD, DEFAULT_TOKEN_FIELD,
};
