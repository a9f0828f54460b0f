// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, http::HeaderMap, Json};

use crate::auth::cookie::read_cookie;
use crate::auth::{Auth, AuthError};
use crate::models::UserResponse;
use crate::state::AppState;

/// Get the current authenticated user's account.
///
/// Resolves the admitted identity to its stored record. The password digest
/// is never part of the response.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Unauthorized - missing, invalid or expired credential, or deleted account"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Auth(identity): Auth,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AuthError> {
    let credential = read_cookie(&headers, state.auth.cookie_name());
    let record = state
        .auth
        .lookup_user(&identity, credential.as_deref(), state.users.as_ref())?;
    Ok(Json(UserResponse::new(record, identity.role)))
}
