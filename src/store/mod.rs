//! Credential storage module
//!
//! The `CredentialStore` owns the access and refresh tokens. Tokens are
//! opaque strings: nothing here parses or validates them.

mod credentials;
mod persistence;
mod types;

pub use credentials::CredentialStore;
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};
pub use types::{Credentials, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
