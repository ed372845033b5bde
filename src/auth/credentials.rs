//! Gateway credential management for Synapse API authentication.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Gateway credentials containing the client id and secret.
///
/// These identify the API platform (the `X-SP-GATEWAY` header), not an
/// individual user. Per-user authentication is handled by OAuth refresh.
#[derive(Clone)]
pub struct Credentials {
    /// The client id (public identifier)
    pub client_id: String,
    /// The client secret (private)
    client_secret: SecretString,
}

impl Credentials {
    /// Create new credentials from a client id and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    /// Get the client secret for header construction.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing gateway credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager or environment variables.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(client_id, client_secret),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl CredentialsProvider for Arc<StaticCredentials> {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads from `SYNAPSE_CLIENT_ID` and `SYNAPSE_CLIENT_SECRET`.
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Create credentials from default environment variables.
    ///
    /// Reads `SYNAPSE_CLIENT_ID` and `SYNAPSE_CLIENT_SECRET`.
    ///
    /// # Panics
    ///
    /// Panics if the environment variables are not set.
    pub fn from_env() -> Self {
        Self::from_env_vars("SYNAPSE_CLIENT_ID", "SYNAPSE_CLIENT_SECRET")
    }

    /// Create credentials from custom environment variable names.
    ///
    /// # Panics
    ///
    /// Panics if the environment variables are not set.
    pub fn from_env_vars(id_var: &str, secret_var: &str) -> Self {
        let client_id = std::env::var(id_var)
            .unwrap_or_else(|_| panic!("Environment variable {id_var} not set"));
        let client_secret = std::env::var(secret_var)
            .unwrap_or_else(|_| panic!("Environment variable {secret_var} not set"));

        Self {
            credentials: Credentials::new(client_id, client_secret),
        }
    }

    /// Try to create credentials from default environment variables.
    ///
    /// Returns `None` if the environment variables are not set.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_vars("SYNAPSE_CLIENT_ID", "SYNAPSE_CLIENT_SECRET")
    }

    /// Try to create credentials from custom environment variable names.
    ///
    /// Returns `None` if the environment variables are not set.
    pub fn try_from_env_vars(id_var: &str, secret_var: &str) -> Option<Self> {
        let client_id = std::env::var(id_var).ok()?;
        let client_secret = std::env::var(secret_var).ok()?;

        Some(Self {
            credentials: Credentials::new(client_id, client_secret),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
