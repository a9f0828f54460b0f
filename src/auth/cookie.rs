// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth cookie construction and parsing.
//!
//! One cookie carries either the signed token or the session identifier.
//! It is host-only (no `Domain`), scoped to `/`, `HttpOnly`, and optionally
//! `Secure`. `Max-Age` matches the credential TTL.

use std::time::Duration;

use axum::http::{header::COOKIE, HeaderMap};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};

/// Cookie name used in token mode unless configured otherwise.
pub const TOKEN_COOKIE_NAME: &str = "token";

/// Cookie name used in session mode unless configured otherwise.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Attributes of the auth cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    /// `None` makes a browser-session cookie.
    pub max_age: Option<Duration>,
}

impl CookieSettings {
    pub fn new(name: impl Into<String>, secure: bool, max_age: Option<Duration>) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age,
        }
    }

    /// Cookie carrying a freshly issued credential.
    pub fn credential_cookie(&self, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax);

        if let Some(max_age) = self.max_age {
            let seconds = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
            builder = builder.max_age(CookieDuration::seconds(seconds));
        }

        builder.build()
    }

    /// Cookie that makes the browser drop the credential immediately.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        cookie.make_removal();
        cookie
    }
}

/// Read the value of cookie `name` from request headers.
///
/// Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}
