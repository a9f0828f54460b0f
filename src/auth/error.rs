// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every credential, token and session failure collapses to the same
//! `401 Unauthorized` body at the HTTP boundary. The concrete variant is only
//! visible in logs via [`AuthError::error_code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Login payload could not be parsed
    #[error("Credentials payload is malformed: {0}")]
    MalformedInput(String),
    /// Unknown email or password mismatch
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// No auth cookie on the request
    #[error("No authentication credential present")]
    MissingCredential,
    /// Token expiry has passed
    #[error("Token has expired")]
    ExpiredToken,
    /// Token signature or algorithm is wrong
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token could not be parsed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token subject no longer resolves to a user record
    #[error("Authenticated user no longer exists")]
    UnknownUser,
    /// Session identifier is not in the store
    #[error("Session not found")]
    SessionNotFound,
    /// Session expiry has passed
    #[error("Session has expired")]
    SessionExpired,
    /// Caller attempted to hash an empty password
    #[error("Password must not be empty")]
    EmptyPassword,
    /// TTL is zero or out of range
    #[error("TTL must be a positive number of seconds")]
    InvalidTtl,
    /// Stored digest was not produced by the credential hasher
    #[error("Stored password digest is malformed")]
    MalformedDigest,
    /// Hashing failed (entropy or resource exhaustion)
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    /// Internal error
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Diagnostic code for this error. Not sent to clients for 401 kinds.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedInput(_) => "malformed_input",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingCredential => "missing_credential",
            AuthError::ExpiredToken => "expired_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnknownUser => "unknown_user",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::SessionExpired => "session_expired",
            AuthError::EmptyPassword => "empty_password",
            AuthError::InvalidTtl => "invalid_ttl",
            AuthError::MalformedDigest => "malformed_digest",
            AuthError::Hashing(_) => "hashing_error",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::InvalidCredentials
            | AuthError::MissingCredential
            | AuthError::ExpiredToken
            | AuthError::InvalidSignature
            | AuthError::MalformedToken
            | AuthError::UnknownUser
            | AuthError::SessionNotFound
            | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
            AuthError::EmptyPassword | AuthError::InvalidTtl => StatusCode::BAD_REQUEST,
            AuthError::MalformedDigest | AuthError::Hashing(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for the kinds a request guard turns into a plain rejection.
    pub fn is_rejection(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED && !matches!(self, AuthError::InvalidCredentials)
    }

    fn public_body(&self) -> AuthErrorBody {
        let (error, error_code) = match self {
            AuthError::InvalidCredentials => (self.to_string(), self.error_code()),
            AuthError::MalformedInput(_) | AuthError::EmptyPassword | AuthError::InvalidTtl => {
                (self.to_string(), self.error_code())
            }
            _ if self.is_rejection() => ("Unauthorized".to_string(), "unauthorized"),
            _ => ("Internal server error".to_string(), "internal_error"),
        };
        AuthErrorBody {
            error,
            error_code: error_code.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error_code = self.error_code(), error = %self, "Authentication failed internally");
        } else {
            debug!(error_code = self.error_code(), "Authentication rejected");
        }
        (status, Json(self.public_body())).into_response()
    }
}
