//! Authentication of calls from the durable queue
//!
//! The queue signs each call to the delivery worker with an HS256 JWT. The
//! `body` claim binds the token to the request body (URL-safe base64 of its
//! SHA-256) and the `sub` claim to the worker's own URL. Two keys are
//! accepted so the queue can rotate without an outage: the current key is
//! tried first, then the next key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::signature::constant_time_compare;
use crate::{QueueConfig, Result, WebhookError};

/// Claims carried by a queue signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueClaims {
    pub iss: String,
    /// URL the queue called
    pub sub: String,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    pub jti: String,
    /// URL-safe base64 SHA-256 of the request body
    pub body: String,
}

/// URL-safe base64 SHA-256 of a body, without padding
pub fn body_digest(body: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(body))
}

/// Verifies queue signatures with a current/next key pair
#[derive(Clone)]
pub struct QueueAuthenticator {
    keys: Vec<DecodingKey>,
    validation: Validation,
}

impl std::fmt::Debug for QueueAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueAuthenticator")
            .field("keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}

impl QueueAuthenticator {
    /// Build from queue settings; empty keys are ignored.
    ///
    /// Tokens must name `config.destination` as their subject.
    pub fn new(config: &QueueConfig) -> Self {
        let keys = [&config.current_signing_key, &config.next_signing_key]
            .into_iter()
            .flatten()
            .filter(|key| !key.is_empty())
            .map(|key| DecodingKey::from_secret(key.as_bytes()))
            .collect();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.sub = Some(config.destination.clone());
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self { keys, validation }
    }

    /// An authenticator that accepts every call
    pub fn disabled() -> Self {
        Self::new(&QueueConfig::default())
    }

    /// Whether verification is on.
    ///
    /// With no keys the check is skipped; only acceptable outside production.
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Verify a queue signature against the request body.
    ///
    /// Returns `Ok(None)` when verification is disabled.
    pub fn verify(&self, token: Option<&str>, body: &[u8]) -> Result<Option<QueueClaims>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(WebhookError::SignatureMissing)?;

        let mut last_error = None;
        for (index, key) in self.keys.iter().enumerate() {
            match decode::<QueueClaims>(token, key, &self.validation) {
                Ok(data) => {
                    let claims = data.claims;
                    let claimed = claims.body.trim_end_matches('=');
                    if !constant_time_compare(claimed, &body_digest(body)) {
                        return Err(WebhookError::SignatureInvalid(
                            "body hash does not match".to_string(),
                        ));
                    }
                    debug!(key_index = index, jti = %claims.jti, "queue signature verified");
                    return Ok(Some(claims));
                }
                // Only a signature mismatch means the other key might work
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(WebhookError::SignatureInvalid(e.to_string())),
            }
        }

        Err(WebhookError::SignatureInvalid(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no key accepted the token".to_string()),
        ))
    }
}

/// Produces queue signatures the way the queue service does.
///
/// Used by tests and local tooling that stand in for the queue.
#[derive(Clone)]
pub struct QueueSigner {
    key: EncodingKey,
    issuer: String,
    ttl_secs: i64,
}

impl QueueSigner {
    pub fn new(key: impl AsRef<[u8]>, issuer: impl Into<String>) -> Self {
        Self {
            key: EncodingKey::from_secret(key.as_ref()),
            issuer: issuer.into(),
            ttl_secs: 300,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Sign a call to `destination` carrying `body`
    pub fn sign(&self, destination: &str, body: &[u8]) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = QueueClaims {
            iss: self.issuer.clone(),
            sub: destination.to_string(),
            exp: now + self.ttl_secs,
            nbf: now,
            iat: now,
            jti: format!("jwt_{}", Uuid::new_v4().simple()),
            body: body_digest(body),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| WebhookError::SignatureInvalid(e.to_string()))
    }
}
