//! Error types for the Synapse client library.

use thiserror::Error;

/// The main error type for all Synapse client operations.
#[derive(Error, Debug)]
pub enum SynapseError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Synapse API returned an error
    #[error("Synapse API error: {0}")]
    Api(ApiError),

    /// A required payload field was not supplied
    #[error("missing required field `{field}` for {resource}")]
    MissingField {
        /// The resource whose payload was being built
        resource: &'static str,
        /// The field that was absent
        field: &'static str,
    },

    /// The API response was missing a required key or could not be decoded
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Missing required credentials
    #[error("Missing credentials: gateway client id and secret required")]
    MissingCredentials,
}

/// Synapse API error codes and messages.
///
/// These are errors reported by the Synapse API itself in the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The API error code (e.g., "110")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// The HTTP status code reported in the error body, if any
    pub http_code: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            http_code: None,
        }
    }

    /// Attach the HTTP status code reported in the error body.
    pub fn with_http_code(mut self, http_code: impl Into<String>) -> Self {
        self.http_code = Some(http_code.into());
        self
    }

    /// Check if this is an invalid or expired OAuth key error.
    pub fn is_oauth_expired(&self) -> bool {
        self.code == error_codes::INVALID_OAUTH_KEY
    }

    /// Check if this is a gateway credentials error.
    pub fn is_invalid_gateway(&self) -> bool {
        self.code == error_codes::INVALID_CLIENT_CREDENTIALS
    }

    /// Check if this is an object-not-found error.
    pub fn is_not_found(&self) -> bool {
        self.code == error_codes::OBJECT_NOT_FOUND
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == error_codes::TOO_MANY_REQUESTS
    }

    /// Check if this is a payload validation error.
    pub fn is_payload_error(&self) -> bool {
        self.code == error_codes::PAYLOAD_ERROR || self.code == error_codes::INVALID_FIELD_VALUE
    }
}

/// Known Synapse error codes for pattern matching.
pub mod error_codes {
    /// Request accepted but incomplete (e.g., a bank login MFA question is pending).
    pub const ACCEPTED_INCOMPLETE: &str = "10";
    /// Invalid gateway client id or secret.
    pub const INVALID_CLIENT_CREDENTIALS: &str = "100";
    /// Invalid or expired oauth_key.
    pub const INVALID_OAUTH_KEY: &str = "110";
    /// Invalid user credentials (fingerprint or refresh token).
    pub const INVALID_USER_CREDENTIALS: &str = "120";
    /// Error in the submitted payload.
    pub const PAYLOAD_ERROR: &str = "200";
    /// Action not allowed for this user or node.
    pub const UNAUTHORIZED_ACTION: &str = "300";
    /// A field value is incorrect (e.g., failed micro-deposit amounts).
    pub const INVALID_FIELD_VALUE: &str = "400";
    /// Object not found.
    pub const OBJECT_NOT_FOUND: &str = "404";
    /// Too many requests.
    pub const TOO_MANY_REQUESTS: &str = "429";
    /// Server error.
    pub const SERVER_ERROR: &str = "500";
}
