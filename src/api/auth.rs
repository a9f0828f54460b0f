// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and logout endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};

use crate::auth::cookie::read_cookie;
use crate::auth::AuthError;
use crate::models::{LoginRequest, LoginResponse, LogoutResponse};
use crate::state::AppState;

/// Verify credentials and set the auth cookie.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; credential set in an HttpOnly cookie", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 422, description = "Malformed login payload")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::MalformedInput(e.body_text()))?;

    let credential = state.auth.login(state.users.as_ref(), request).await?;
    let cookie = state.auth.login_cookie(credential);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(LoginResponse {
            message: "Login successful".to_string(),
        }),
    ))
}

/// Clear the auth cookie and, in session mode, destroy the session.
///
/// Always succeeds, with or without a cookie.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out; cookie cleared", body = LogoutResponse)
    )
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let credential = read_cookie(&headers, state.auth.cookie_name());
    state.auth.logout(credential.as_deref()).await;

    (
        AppendHeaders([(SET_COOKIE, state.auth.logout_cookie().to_string())]),
        Json(LogoutResponse {
            message: "Logout successful".to_string(),
        }),
    )
}
