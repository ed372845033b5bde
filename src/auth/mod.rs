//! Authentication module for the Synapse API.
//!
//! This module provides:
//! - Gateway credential management with secure secret storage
//! - Per-user OAuth refresh state shared across client clones

mod credentials;
mod oauth;

pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
pub use oauth::{OauthKey, OauthSession};
