//! Bearer tokens and the sources that mint them.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`Token`] - A short-lived access token with its expiry
//! - [`TokenSource`] - Trait for anything that can produce a fresh [`Token`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value.
/// The buffer is wiped when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// A short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The bearer token value. Never empty for tokens handed out by a [`TokenSource`].
    pub access_token: Secret,

    /// Token type (always "Bearer" for tokens minted here).
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// When this token expires (None if the issuer did not say).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Create a new bearer token without an expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            token_type: default_token_type(),
            expiry: None,
        }
    }

    /// Set the expiration time.
    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Check if this token has expired.
    ///
    /// Returns `false` if no expiration is set.
    pub fn is_expired(&self) -> bool {
        self.expiry.map(|exp| exp < Utc::now()).unwrap_or(false)
    }

    /// Check if this token will expire within the given duration.
    pub fn expires_within(&self, duration: chrono::Duration) -> bool {
        self.expiry
            .map(|exp| exp < Utc::now() + duration)
            .unwrap_or(false)
    }

    /// Render the value for an `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.expose())
    }
}

/// A source of access tokens.
///
/// Implementations perform whatever round-trip is needed to mint a token and
/// hold no per-call state, so a single source can be shared across tasks.
/// Refresh-ahead and caching belong in a wrapper around the source.
///
/// # Example
///
/// ```rust,ignore
/// use gog_core::TokenSource;
///
/// async fn header(source: &impl TokenSource) -> Result<String, Box<dyn std::error::Error>> {
///     let token = source.token().await?;
///     Ok(token.authorization_header())
/// }
/// ```
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Error returned when a token cannot be obtained.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Obtain a fresh token.
    async fn token(&self) -> Result<Token, Self::Error>;
}
