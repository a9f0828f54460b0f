// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! authgate - Cookie-based authentication service
//!
//! Verifies passwords against Argon2id digests, hands out either a signed
//! token or an opaque server-side session identifier in an `HttpOnly`
//! cookie, and guards protected routes with that cookie.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, tokens, sessions, and the request guard
//! - `config` - Environment configuration
//! - `store` - User records

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
