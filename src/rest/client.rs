//! Synapse REST API client implementation.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;
use secrecy::ExposeSecret;
use url::Url;

use crate::auth::{CredentialsProvider, OauthKey, OauthSession};
use crate::error::{ApiError, SynapseError};
use crate::rest::endpoints::{self, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};

/// The Synapse REST API client.
///
/// The client carries the gateway credentials (`X-SP-GATEWAY`), the device
/// fingerprint and end-user IP (`X-SP-USER`, `X-SP-USER-IP`), and the shared
/// OAuth session used by user-scoped operations. It is cheap to clone;
/// clones share the connection pool and the OAuth session.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use synapse_api_client::SynapseRestClient;
/// use synapse_api_client::auth::StaticCredentials;
///
/// let gateway = Arc::new(StaticCredentials::new("client_id", "client_secret"));
/// let client = SynapseRestClient::builder()
///     .gateway(gateway)
///     .fingerprint("suzuki_fingerprint")
///     .user_ip("127.0.0.1")
///     .sandbox(true)
///     .build();
/// ```
#[derive(Clone)]
pub struct SynapseRestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    gateway: Option<Arc<dyn CredentialsProvider>>,
    fingerprint: String,
    user_ip: String,
    session: OauthSession,
}

impl SynapseRestClient {
    /// Create a new client builder.
    pub fn builder() -> SynapseRestClientBuilder {
        SynapseRestClientBuilder::new()
    }

    /// Exchange a user's refresh token for a fresh oauth_key.
    ///
    /// The key is stored in the shared session so subsequent requests carry
    /// it in the `X-SP-USER` header, and is also returned to the caller.
    pub async fn refresh_oauth(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<OauthKey, SynapseError> {
        #[derive(serde::Serialize)]
        struct RefreshPayload<'a> {
            refresh_token: &'a str,
        }

        let key: OauthKey = self
            .post(
                &endpoints::oauth(user_id),
                &RefreshPayload { refresh_token },
            )
            .await?;
        self.session.store(key.secret());
        Ok(key)
    }

    /// Make a GET request.
    pub(crate) async fn get<T>(&self, path: &str) -> Result<T, SynapseError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint_url(path)?;
        tracing::debug!(%url, "GET");
        let response = self
            .http_client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_params<T, Q>(
        &self,
        path: &str,
        params: &Q,
    ) -> Result<T, SynapseError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let query_string = serde_urlencoded::to_string(params)
            .map_err(|e| SynapseError::MalformedResponse(e.to_string()))?;
        let url = if query_string.is_empty() {
            self.endpoint_url(path)?
        } else {
            self.endpoint_url(&format!("{path}?{query_string}"))?
        };
        tracing::debug!(%url, "GET");
        let response = self
            .http_client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Make a POST request with a JSON payload.
    pub(crate) async fn post<T, P>(&self, path: &str, payload: &P) -> Result<T, SynapseError>
    where
        T: serde::de::DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let url = self.endpoint_url(path)?;
        tracing::debug!(%url, "POST");
        let response = self
            .http_client
            .post(url)
            .headers(self.auth_headers()?)
            .json(payload)
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Make a PATCH request with a JSON payload.
    pub(crate) async fn patch<T, P>(&self, path: &str, payload: &P) -> Result<T, SynapseError>
    where
        T: serde::de::DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let url = self.endpoint_url(path)?;
        tracing::debug!(%url, "PATCH");
        let response = self
            .http_client
            .patch(url)
            .headers(self.auth_headers()?)
            .json(payload)
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Make a DELETE request.
    pub(crate) async fn delete<T>(&self, path: &str) -> Result<T, SynapseError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint_url(path)?;
        tracing::debug!(%url, "DELETE");
        let response = self
            .http_client
            .delete(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        self.parse_response(response).await
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, SynapseError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Build the per-request authentication headers.
    fn auth_headers(&self) -> Result<HeaderMap, SynapseError> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or(SynapseError::MissingCredentials)?;
        let creds = gateway.get_credentials();

        let mut headers = HeaderMap::new();

        let gateway_value = format!("{}|{}", creds.client_id, creds.expose_secret());
        let mut gateway_header = HeaderValue::from_str(&gateway_value)
            .map_err(|_| SynapseError::Auth("gateway credentials are not header-safe".into()))?;
        gateway_header.set_sensitive(true);
        headers.insert("X-SP-GATEWAY", gateway_header);

        // The oauth_key half is empty until a user has been authenticated.
        let user_value = match self.session.current() {
            Some(key) => format!("{}|{}", key.expose_secret(), self.fingerprint),
            None => format!("|{}", self.fingerprint),
        };
        let mut user_header = HeaderValue::from_str(&user_value)
            .map_err(|_| SynapseError::Auth("fingerprint is not header-safe".into()))?;
        user_header.set_sensitive(true);
        headers.insert("X-SP-USER", user_header);

        let ip_header = HeaderValue::from_str(&self.user_ip)
            .map_err(|_| SynapseError::Auth("user ip is not header-safe".into()))?;
        headers.insert("X-SP-USER-IP", ip_header);

        Ok(headers)
    }

    /// Parse a response from the Synapse API.
    async fn parse_response<T>(&self, response: reqwest::Response) -> Result<T, SynapseError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;

        // Failures are reported in the body with `success: false`; surface
        // them as API errors before attempting the typed decode.
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            if !envelope.success {
                let mut api_error = ApiError::new(
                    envelope.error_code.unwrap_or_else(|| "unknown".to_string()),
                    envelope.error.en,
                );
                if let Some(http_code) = envelope.http_code {
                    api_error = api_error.with_http_code(http_code);
                }
                return Err(SynapseError::Api(api_error));
            }
        }

        if !status.is_success() {
            return Err(SynapseError::MalformedResponse(format!(
                "HTTP {status}: {body}"
            )));
        }

        // A required key missing from the response fails the decode here
        // rather than producing a half-populated object.
        serde_json::from_str(&body).map_err(|e| {
            SynapseError::MalformedResponse(format!("failed to decode response: {e}. Body: {body}"))
        })
    }
}

impl std::fmt::Debug for SynapseRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynapseRestClient")
            .field("base_url", &self.base_url)
            .field("has_gateway", &self.gateway.is_some())
            .field("session", &self.session)
            .finish()
    }
}

/// Builder for [`SynapseRestClient`].
pub struct SynapseRestClientBuilder {
    base_url: String,
    gateway: Option<Arc<dyn CredentialsProvider>>,
    fingerprint: String,
    user_ip: String,
    user_agent: Option<String>,
    max_retries: u32,
}

impl SynapseRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: PRODUCTION_BASE_URL.to_string(),
            gateway: None,
            fingerprint: String::new(),
            user_ip: "127.0.0.1".to_string(),
            user_agent: None,
            max_retries: 3,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Target the sandbox (UAT) environment instead of production.
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.base_url = if sandbox {
            SANDBOX_BASE_URL.to_string()
        } else {
            PRODUCTION_BASE_URL.to_string()
        };
        self
    }

    /// Set the gateway credentials provider.
    pub fn gateway(mut self, gateway: Arc<dyn CredentialsProvider>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the device fingerprint sent in the `X-SP-USER` header.
    pub fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    /// Set the end-user IP address sent in the `X-SP-USER-IP` header.
    pub fn user_ip(mut self, user_ip: impl Into<String>) -> Self {
        self.user_ip = user_ip.into();
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> SynapseRestClient {
        // Build default headers.
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("synapse-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("synapse-api-client"));
        headers.insert(USER_AGENT, header_value);

        // Build the HTTP client with middleware.
        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        SynapseRestClient {
            http_client: client,
            base_url: self.base_url,
            gateway: self.gateway,
            fingerprint: self.fingerprint,
            user_ip: self.user_ip,
            session: OauthSession::new(),
        }
    }
}

impl Default for SynapseRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Error envelope the API wraps failures in.
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    success: bool,
    #[serde(default)]
    error: ErrorBody,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    http_code: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    en: String,
}
