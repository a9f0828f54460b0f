// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated identity handed to protected handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use super::session::Session;

/// Claims carried by a signed token.
///
/// The user is referenced by id only; the record itself is looked up on
/// demand so profile edits never require re-issuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User identifier (subject)
    pub user_id: u64,
    /// Always `true` for tokens issued at login
    pub authorized: bool,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds); the token is invalid from this instant on
    pub exp: i64,
}

/// Identity resolved by the request guard.
///
/// Inserted into request extensions on admission; read via the
/// [`Auth`](super::Auth) extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    /// User identifier
    pub user_id: u64,

    /// Role, present for session-backed identities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Session identifier (session mode only, never serialized)
    #[serde(skip)]
    pub session_id: Option<String>,

    /// Credential expiry (Unix seconds)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from validated token claims.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            role: None,
            session_id: None,
            expires_at: claims.exp,
        }
    }

    /// Create from a live session.
    pub fn from_session(session: Session) -> Self {
        Self {
            user_id: session.data.user_id,
            role: Some(session.data.role),
            expires_at: session.expires_at.timestamp(),
            session_id: Some(session.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::SessionData;
    use chrono::DateTime;

    #[test]
    fn from_claims_extracts_user_id() {
        let user = AuthenticatedUser::from_claims(TokenClaims {
            user_id: 42,
            authorized: true,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        });
        assert_eq!(user.user_id, 42);
        assert_eq!(user.expires_at, 1_700_003_600);
        assert!(user.role.is_none());
    }

    #[test]
    fn from_session_carries_role() {
        let expires_at = DateTime::from_timestamp(1_700_003_600, 0).unwrap();
        let user = AuthenticatedUser::from_session(Session {
            id: "sess".to_string(),
            data: SessionData {
                user_id: 7,
                role: Role::parse("admin").unwrap(),
            },
            expires_at,
        });
        assert_eq!(user.user_id, 7);
        assert_eq!(user.role.unwrap().as_str(), "admin");
        assert_eq!(user.session_id.as_deref(), Some("sess"));
        assert_eq!(user.expires_at, 1_700_003_600);
    }

    #[test]
    fn session_id_is_not_serialized() {
        let user = AuthenticatedUser {
            user_id: 1,
            role: None,
            session_id: Some("secret-session".to_string()),
            expires_at: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-session"));
    }
}
