// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password verification, credential issuance, and the request guard.
//!
//! ## Auth Flow
//!
//! 1. Client posts `{email, password}` to the login endpoint
//! 2. Server:
//!    - Verifies the password against the stored Argon2id digest
//!    - Issues either a signed HS256 token (token mode) or an opaque
//!      session identifier (session mode)
//!    - Sets it in an `HttpOnly` cookie
//! 3. On protected routes the guard reads the cookie, validates it, and
//!    inserts an [`AuthenticatedUser`] into the request extensions
//!
//! ## Security
//!
//! - Plaintext passwords are never stored or logged
//! - Tokens must be HS256; any other `alg` is refused
//! - Token and session expiry is strict (no leeway)
//! - Every guard failure produces the same 401 body
//! - Expired sessions are refused on read and reclaimed by a background reaper

pub mod claims;
pub mod clock;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod reaper;
pub mod roles;
pub mod service;
pub mod session;
pub mod token;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cookie::CookieSettings;
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::require_auth;
pub use password::CredentialHasher;
pub use reaper::{ReaperHandle, SessionReaper};
pub use roles::Role;
pub use service::{AuthBackend, AuthScheme, AuthService};
pub use session::{Session, SessionData, SessionStore};
pub use token::TokenService;
