// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Apply to a router subtree with `route_layer` so unmatched paths still 404:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/users/me", get(get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```
//!
//! A request is admitted only when the cookie is present *and* validates.
//! On rejection the protected handler is never called.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::cookie::read_cookie;
use crate::state::AppState;

/// Request guard: admit with an [`AuthenticatedUser`](super::AuthenticatedUser)
/// in extensions, or short-circuit with 401.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let credential = read_cookie(request.headers(), state.auth.cookie_name());

    match state.auth.authenticate(credential.as_deref()).await {
        Ok(user) => {
            debug!(user_id = user.user_id, path = %request.uri().path(), "Request admitted");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header::COOKIE, Request as HttpRequest, StatusCode},
        routing::get,
        Extension, Router,
    };
    use chrono::DateTime;
    use tower::ServiceExt;

    use crate::auth::cookie::TOKEN_COOKIE_NAME;
    use crate::auth::{
        AuthBackend, AuthService, AuthenticatedUser, CookieSettings, CredentialHasher, ManualClock,
        TokenService,
    };
    use crate::store::InMemoryUserStore;

    const TTL: Duration = Duration::from_secs(3600);

    fn guarded(clock: &ManualClock) -> (Router, Arc<AtomicUsize>, AppState) {
        let tokens = TokenService::new(b"secret", TTL, Arc::new(clock.clone())).unwrap();
        let auth = AuthService::new(
            CredentialHasher::with_cost(8, 1).unwrap(),
            AuthBackend::Token(tokens),
            CookieSettings::new(TOKEN_COOKIE_NAME, false, Some(TTL)),
        )
        .unwrap();
        let state = AppState::new(Arc::new(InMemoryUserStore::new()), auth);

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new()
            .route(
                "/protected",
                get(move |Extension(user): Extension<AuthenticatedUser>| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        user.user_id.to_string()
                    }
                }),
            )
            .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state.clone());
        (router, hits, state)
    }

    fn request(cookie: Option<String>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn admits_valid_token() {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let (router, hits, state) = guarded(&clock);
        let token = state.auth.token_service().unwrap().issue(9, None).unwrap();

        let response = router.oneshot(request(Some(format!("token={token}")))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"9");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejects_missing_cookie_without_calling_handler() {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let (router, hits, _) = guarded(&clock);

        let response = router.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_garbage_cookie_without_calling_handler() {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let (router, hits, _) = guarded(&clock);

        let response = router
            .oneshot(request(Some("token=anything-at-all".to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_expired_token_without_calling_handler() {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let (router, hits, state) = guarded(&clock);
        let token = state
            .auth
            .token_service()
            .unwrap()
            .issue(9, Some(Duration::from_secs(1)))
            .unwrap();
        // expiry = now - 1s
        clock.advance(chrono::Duration::seconds(2));

        let response = router.oneshot(request(Some(format!("token={token}")))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
