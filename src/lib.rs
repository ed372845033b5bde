//! # Synapse Client
//!
//! An async Rust client library for the SynapsePay payments REST API.
//!
//! ## Features
//!
//! - Typed models for users, KYC documents, nodes, transactions, and
//!   statements
//! - Models rebuilt from every server response, so local state never
//!   diverges from the remote record
//! - Gateway and per-user OAuth authentication with secure secret storage
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use synapse_api_client::auth::StaticCredentials;
//! use synapse_api_client::models::CreateUserRequest;
//! use synapse_api_client::{SynapseRestClient, User};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(StaticCredentials::new("client_id", "client_secret"));
//!     let client = SynapseRestClient::builder()
//!         .gateway(gateway)
//!         .fingerprint("suzuki_fingerprint")
//!         .user_ip("127.0.0.1")
//!         .sandbox(true)
//!         .build();
//!
//!     let request = CreateUserRequest::new("a@b.com", "901-111-1111", "Test User");
//!     let user = User::create(&client, &request).await?;
//!     println!("Created user {}", user.id);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod models;
pub mod rest;

// Re-export commonly used types at crate root
pub use error::SynapseError;
pub use models::{BaseDocument, Node, Statement, Transaction, User};
pub use rest::SynapseRestClient;

/// Result type alias using SynapseError
pub type Result<T> = std::result::Result<T, SynapseError>;
