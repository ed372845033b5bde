//! Per-user OAuth state for Synapse API authentication.
//!
//! Acting on a user's behalf requires exchanging the user's refresh token
//! for a short-lived oauth_key (`POST /oauth/{user_id}`). The key is sent
//! in the `X-SP-USER` header of subsequent requests.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// A refreshed OAuth key as returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OauthKey {
    /// The oauth_key to present in the `X-SP-USER` header.
    oauth_key: SecretString,
    /// The (possibly rotated) refresh token for the next exchange.
    pub refresh_token: String,
    /// Lifetime of the key in seconds, as reported by the API.
    #[serde(default)]
    pub expires_in: Option<String>,
    /// Absolute expiry timestamp, as reported by the API.
    #[serde(default)]
    pub expires_at: Option<String>,
    /// Id of the user the key belongs to.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl OauthKey {
    /// Get the oauth_key value.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_key(&self) -> &str {
        self.oauth_key.expose_secret()
    }

    pub(crate) fn secret(&self) -> SecretString {
        self.oauth_key.clone()
    }
}

/// Shared slot holding the most recently refreshed oauth_key.
///
/// Cloned clients share one session, so a refresh performed while creating
/// a node is visible to the follow-up request that uses it.
#[derive(Clone, Default)]
pub struct OauthSession {
    key: Arc<RwLock<Option<SecretString>>>,
}

impl OauthSession {
    /// Create an empty session (no user authenticated yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored key with a freshly refreshed one.
    pub fn store(&self, key: SecretString) {
        if let Ok(mut guard) = self.key.write() {
            *guard = Some(key);
        }
    }

    /// Forget the stored key.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.key.write() {
            *guard = None;
        }
    }

    /// Get a copy of the current key, if any.
    pub fn current(&self) -> Option<SecretString> {
        self.key.read().map(|guard| guard.clone()).unwrap_or(None)
    }
}

impl std::fmt::Debug for OauthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthSession")
            .field("authenticated", &self.current().is_some())
            .finish()
    }
}
