//! Access tokens minted by a user-configured HTTP endpoint.
//!
//! [`RemoteTokenSource`] POSTs the identity and scopes it was configured with
//! to an endpoint and expects a bearer token back:
//!
//! ```text
//! POST <endpoint>
//! Content-Type: application/json
//! Authorization: Bearer <auth>            (only when auth is non-empty)
//!
//! {"email":"user@example.com","scopes":["scope1","scope2"]}
//!
//! 200 OK
//! {"access_token":"...","expiry":"2025-01-01T00:00:00Z"}
//! ```
//!
//! Every call is a fresh round-trip. There is no caching or retry; wrap the
//! source in a refreshing layer if tokens should be reused until near expiry.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use gog_core::RemoteTokenSource;
//!
//! let source = RemoteTokenSource::new(
//!     "https://tokens.internal.example.com/mint",
//!     "user@example.com",
//!     vec!["https://www.googleapis.com/auth/gmail.readonly".to_string()],
//! )
//! .with_auth("broker-credential");
//!
//! let token = source.fetch().await?;
//! println!("expires at {:?}", token.expiry);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::token::{Secret, Token, TokenSource};

/// Request timeout for the default HTTP client.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for remote token fetches.
///
/// Each message carries a stable tag (`marshal request`, `create request`,
/// `request failed`, `read response`, `endpoint returned`, `parse response`,
/// `empty access token`) that callers may match on.
#[derive(Debug, Error)]
pub enum RemoteTokenError {
    /// The request body could not be encoded.
    #[error("remote token: marshal request: {0}")]
    MarshalRequest(#[source] serde_json::Error),

    /// The endpoint or HTTP client could not be set up.
    #[error("remote token: create request: {message}")]
    CreateRequest { message: String },

    /// The request could not be sent or timed out.
    #[error("remote token: request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("remote token: read response: {0}")]
    ReadResponse(#[source] reqwest::Error),

    /// The endpoint answered with something other than 200.
    #[error("remote token: endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not the expected JSON.
    #[error("remote token: parse response: {0}")]
    ParseResponse(#[source] serde_json::Error),

    /// The endpoint returned 200 without a token.
    #[error("remote token: endpoint returned empty access token")]
    EmptyAccessToken,
}

#[derive(Debug, Serialize)]
struct RemoteTokenRequest<'a> {
    email: &'a str,
    scopes: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RemoteTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

/// Fetches access tokens from a remote HTTP endpoint.
///
/// Configuration is fixed at construction; `fetch` only uses per-call state,
/// so one source can be shared between tasks.
#[derive(Clone)]
pub struct RemoteTokenSource {
    endpoint: String,
    auth: Option<Secret>,
    email: String,
    scopes: Vec<String>,
    http_client: Option<reqwest::Client>,
}

impl RemoteTokenSource {
    /// Create a source minting tokens for `email` with the given scopes.
    pub fn new(endpoint: impl Into<String>, email: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: None,
            email: email.into(),
            scopes,
            http_client: None,
        }
    }

    /// Bearer credential for calling the endpoint itself.
    ///
    /// An empty credential sends no `Authorization` header.
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        let auth = Secret::new(auth);
        self.auth = (!auth.is_empty()).then_some(auth);
        self
    }

    /// Use a caller-supplied HTTP client instead of the default one.
    ///
    /// The client's own timeout then bounds the request.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The identity tokens are minted for.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The requested scopes, in order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    fn client(&self) -> Result<reqwest::Client, RemoteTokenError> {
        match &self.http_client {
            Some(client) => Ok(client.clone()),
            None => reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .map_err(|e| RemoteTokenError::CreateRequest {
                    message: format!("build http client: {}", e),
                }),
        }
    }

    fn endpoint_url(&self) -> Result<Url, RemoteTokenError> {
        let url = Url::parse(&self.endpoint).map_err(|e| RemoteTokenError::CreateRequest {
            message: format!("invalid endpoint {:?}: {}", self.endpoint, e),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(RemoteTokenError::CreateRequest {
                message: format!("unsupported endpoint scheme {:?}", scheme),
            }),
        }
    }

    /// Perform one round-trip to the endpoint and return the minted token.
    pub async fn fetch(&self) -> Result<Token, RemoteTokenError> {
        let body = serde_json::to_vec(&RemoteTokenRequest {
            email: &self.email,
            scopes: &self.scopes,
        })
        .map_err(RemoteTokenError::MarshalRequest)?;

        let url = self.endpoint_url()?;
        let client = self.client()?;

        let mut request = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(auth) = &self.auth {
            request = request.header(AUTHORIZATION, format!("Bearer {}", auth.expose()));
        }

        debug!(
            "Requesting remote token for {} ({} scopes) from {}",
            self.email,
            self.scopes.len(),
            self.endpoint
        );

        let response = request
            .send()
            .await
            .map_err(RemoteTokenError::RequestFailed)?;

        let status = response.status();
        let response_body = response
            .bytes()
            .await
            .map_err(RemoteTokenError::ReadResponse)?;

        if status != StatusCode::OK {
            return Err(RemoteTokenError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&response_body).into_owned(),
            });
        }

        let parsed: RemoteTokenResponse =
            serde_json::from_slice(&response_body).map_err(RemoteTokenError::ParseResponse)?;

        // Absent, null and "" are all the same failure.
        let access_token = match parsed.access_token {
            Some(access_token) if !access_token.is_empty() => access_token,
            _ => return Err(RemoteTokenError::EmptyAccessToken),
        };

        let mut token = Token::new(access_token);
        token.expiry = parsed.expiry;
        debug!("Remote token for {} expires at {:?}", self.email, token.expiry);

        Ok(token)
    }
}

impl std::fmt::Debug for RemoteTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTokenSource")
            .field("endpoint", &self.endpoint)
            .field("auth", &self.auth)
            .field("email", &self.email)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for RemoteTokenSource {
    type Error = RemoteTokenError;

    async fn token(&self) -> Result<Token, Self::Error> {
        self.fetch().await
    }
}
