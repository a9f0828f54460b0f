// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless signed tokens (HS256 JWT).
//!
//! ## Validation order
//!
//! 1. The header's `alg` must be exactly `HS256`. Anything else, including
//!    `none` and other HMAC widths, is rejected as a bad signature before the
//!    verifying library sees the token.
//! 2. Signature is checked with the server secret.
//! 3. Expiry is checked against the injected clock with no leeway: a token is
//!    valid strictly before `exp`.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use super::clock::{Clock, MAX_TTL};
use super::{AuthError, TokenClaims};
use crate::models::UserRecord;
use crate::store::UserRepository;

/// Default token lifetime (one hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;
const TOKEN_ALGORITHM_NAME: &str = "HS256";

/// Issues and validates signed tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a service signing with `secret`.
    pub fn new(secret: &[u8], default_ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Internal("token signing secret is empty".to_string()));
        }
        ttl_seconds(default_ttl)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
            clock,
        })
    }

    /// Issue a token for `user_id`, valid for `ttl` (or the default TTL).
    pub fn issue(&self, user_id: u64, ttl: Option<Duration>) -> Result<String, AuthError> {
        let ttl = ttl_seconds(ttl.unwrap_or(self.default_ttl))?;
        let now = self.clock.now().timestamp();
        let exp = now.checked_add(ttl).ok_or(AuthError::InvalidTtl)?;

        let claims = TokenClaims {
            user_id,
            authorized: true,
            iat: now,
            exp,
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let algorithm = header_algorithm(token)?;
        if algorithm != TOKEN_ALGORITHM_NAME {
            debug!(algorithm = %algorithm, "Rejecting token with unexpected signing algorithm");
            return Err(AuthError::InvalidSignature);
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::MalformedToken,
            })?
            .claims;

        if !claims.authorized {
            return Err(AuthError::MalformedToken);
        }
        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Validate a token and load the user it names.
    pub fn resolve_user(&self, token: &str, users: &dyn UserRepository) -> Result<UserRecord, AuthError> {
        let claims = self.validate(token)?;
        users.find_by_id(claims.user_id)?.ok_or(AuthError::UnknownUser)
    }
}

fn ttl_seconds(ttl: Duration) -> Result<i64, AuthError> {
    if ttl > MAX_TTL {
        return Err(AuthError::InvalidTtl);
    }
    i64::try_from(ttl.as_secs())
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or(AuthError::InvalidTtl)
}

/// Read the `alg` header field without trusting anything else in the token.
fn header_algorithm(token: &str) -> Result<String, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

    header
        .get("alg")
        .and_then(|alg| alg.as_str())
        .map(str::to_string)
        .ok_or(AuthError::MalformedToken)
}
