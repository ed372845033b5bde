//! Synapse REST API transport.
//!
//! [`SynapseRestClient`] issues the authenticated HTTP requests the resource
//! models in [`crate::models`] are built from. The resource models are the
//! intended entry point; the client itself only knows headers, paths, and
//! how to turn a response body into a typed value or an error.

mod client;
pub mod endpoints;

pub use client::{SynapseRestClient, SynapseRestClientBuilder};
