// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Active authentication scheme (`token` or `session`).
    pub auth_scheme: String,
    /// Stored sessions, including expired ones not yet reaped.
    /// Only present in session mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<usize>,
}

/// Liveness check handler.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = match state.auth.session_store() {
        Some(store) => Some(store.len().await),
        None => None,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        auth_scheme: state.auth.scheme().to_string(),
        sessions,
    })
}
