//! Credential store implementation
//!
//! Holds the access and refresh tokens either in a `Persistence` backend
//! under fixed keys or in process memory.

use super::persistence::{MemoryPersistence, Persistence};
use super::types::{Credentials, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

enum Backend {
    Persistent(Arc<dyn Persistence>),
    Memory(RwLock<Credentials>),
}

/// Owner of the current token pair
pub struct CredentialStore {
    backend: Backend,
}

impl CredentialStore {
    /// Store tokens in process memory only
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(Credentials::default())),
        }
    }

    /// Store tokens in a persistence backend
    pub fn persistent(persistence: Arc<dyn Persistence>) -> Self {
        Self {
            backend: Backend::Persistent(persistence),
        }
    }

    /// Pick the backend from the `use_local_storage` flag
    ///
    /// With the flag set and no backend supplied, a fresh `MemoryPersistence`
    /// is used.
    pub fn from_flag(use_local_storage: bool, persistence: Option<Arc<dyn Persistence>>) -> Self {
        if use_local_storage {
            let persistence: Arc<dyn Persistence> = match persistence {
                Some(p) => p,
                None => Arc::new(MemoryPersistence::new()),
            };
            Self::persistent(persistence)
        } else {
            Self::in_memory()
        }
    }

    /// Check if tokens go through a persistence backend
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, Backend::Persistent(_))
    }

    /// Current access token
    pub fn get_access_token(&self) -> Option<String> {
        match &self.backend {
            Backend::Persistent(p) => p.get_item(ACCESS_TOKEN_KEY),
            Backend::Memory(c) => c
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .access_token
                .clone(),
        }
    }

    /// Current refresh token
    pub fn get_refresh_token(&self) -> Option<String> {
        match &self.backend {
            Backend::Persistent(p) => p.get_item(REFRESH_TOKEN_KEY),
            Backend::Memory(c) => c
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .refresh_token
                .clone(),
        }
    }

    /// Snapshot of both tokens
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.get_access_token(),
            refresh_token: self.get_refresh_token(),
        }
    }

    /// Replace the access token
    pub fn set_access_token(&self, token: &str) -> Result<()> {
        match &self.backend {
            Backend::Persistent(p) => p.set_item(ACCESS_TOKEN_KEY, token),
            Backend::Memory(c) => {
                c.write().unwrap_or_else(PoisonError::into_inner).access_token =
                    Some(token.to_string());
                Ok(())
            }
        }
    }

    /// Replace the refresh token
    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        match &self.backend {
            Backend::Persistent(p) => p.set_item(REFRESH_TOKEN_KEY, token),
            Backend::Memory(c) => {
                c.write().unwrap_or_else(PoisonError::into_inner).refresh_token =
                    Some(token.to_string());
                Ok(())
            }
        }
    }

    /// Replace both tokens
    ///
    /// If the refresh token cannot be written, the previous access token is
    /// restored so the pair is never half-updated.
    pub fn set_credentials(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        match &self.backend {
            Backend::Persistent(p) => {
                let previous = p.get_item(ACCESS_TOKEN_KEY);
                p.set_item(ACCESS_TOKEN_KEY, access_token)?;

                if let Err(e) = p.set_item(REFRESH_TOKEN_KEY, refresh_token) {
                    let restored = match previous {
                        Some(token) => p.set_item(ACCESS_TOKEN_KEY, &token),
                        None => p.remove_item(ACCESS_TOKEN_KEY),
                    };
                    if let Err(restore_error) = restored {
                        warn!("Failed to restore previous access token: {restore_error}");
                    }
                    return Err(e);
                }
                Ok(())
            }
            Backend::Memory(c) => {
                *c.write().unwrap_or_else(PoisonError::into_inner) =
                    Credentials::new(access_token, refresh_token);
                Ok(())
            }
        }
    }

    /// Remove both tokens; a no-op when they are already absent
    pub fn clear(&self) -> Result<()> {
        match &self.backend {
            Backend::Persistent(p) => {
                if p.get_item(ACCESS_TOKEN_KEY).is_some() {
                    p.remove_item(ACCESS_TOKEN_KEY)?;
                }
                if p.get_item(REFRESH_TOKEN_KEY).is_some() {
                    p.remove_item(REFRESH_TOKEN_KEY)?;
                }
                Ok(())
            }
            Backend::Memory(c) => {
                *c.write().unwrap_or_else(PoisonError::into_inner) = Credentials::default();
                Ok(())
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::from_flag(true, None)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token values stay out of debug output
        f.debug_struct("CredentialStore")
            .field("persistent", &self.is_persistent())
            .field("has_access_token", &self.get_access_token().is_some())
            .field("has_refresh_token", &self.get_refresh_token().is_some())
            .finish()
    }
}
