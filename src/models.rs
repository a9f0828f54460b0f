// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response types for the REST API, plus the stored user record.
//!
//! ## Secrets
//!
//! [`UserRecord`] holds the password digest and therefore is neither
//! `Serialize` nor printed in full by `Debug`. Clients only ever see
//! [`UserResponse`]. [`LoginRequest`] and [`NewUser`] redact the plaintext
//! password in `Debug` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

// =============================================================================
// Users
// =============================================================================

/// Stored user account.
#[derive(Clone)]
pub struct UserRecord {
    /// Numeric identity; `0` until the store assigns one
    pub id: u64,
    /// Unique display name
    pub nickname: String,
    /// Unique email address
    pub email: String,
    /// Argon2id PHC digest, never plaintext
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Normalise a record before its first insert.
    ///
    /// Trims and HTML-escapes nickname and email, clears the id, and stamps
    /// both timestamps with `now`.
    pub fn prepare(&mut self, now: DateTime<Utc>) {
        self.id = 0;
        self.nickname = escape_html(self.nickname.trim());
        self.email = escape_html(self.email.trim());
        self.created_at = now;
        self.updated_at = now;
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating a user account.
#[derive(Clone)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: u64,
    pub nickname: String,
    pub email: String,
    /// Session role, present in session mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: UserRecord, role: Option<Role>) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            email: user.email,
            role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Body of `POST /v1/auth/login`.
#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response to a successful login. The credential itself is only in the cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
}

/// Response to a logout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
