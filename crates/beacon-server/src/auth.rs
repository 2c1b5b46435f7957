//! Handshake authentication.
//!
//! Credentials are verified once, before a session is admitted; nothing on
//! the event path ever re-checks them. Verification is behind a trait so
//! tests can substitute their own gatekeeping.

use async_trait::async_trait;
use beacon_core::Identity;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Close code sent when the credential has expired.
pub const CLOSE_EXPIRED: u16 = 4001;
/// Close code sent when the credential is missing or fails verification.
pub const CLOSE_REJECTED: u16 = 4002;

/// Handshake rejection reasons.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential supplied")]
    Missing,
    #[error("credential expired")]
    Expired,
    #[error("credential rejected")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// WebSocket close code reported to the rejected client.
    #[must_use]
    pub fn close_code(&self) -> u16 {
        match self {
            Self::Expired => CLOSE_EXPIRED,
            Self::Missing | Self::Invalid(_) => CLOSE_REJECTED,
        }
    }
}

/// Claims carried by a Beacon access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier. An empty string admits the session anonymously.
    #[serde(default)]
    pub id: String,
    /// Display name shown to chat recipients.
    #[serde(default)]
    pub username: String,
    /// Expiry, as seconds since the Unix epoch.
    pub exp: usize,
}

/// Credential verification at the connection boundary.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a handshake token and produce the session's identity.
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HS256 verification against a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier for tokens signed with the given secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(err),
            }
        })?;
        Ok(Identity::new(data.claims.id, data.claims.username))
    }
}
