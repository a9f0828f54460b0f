// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, logout and credential checks over the configured scheme.

use std::str::FromStr;
use std::sync::Arc;

use cookie::Cookie;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::cookie::CookieSettings;
use super::password::CredentialHasher;
use super::roles::Role;
use super::session::{SessionData, SessionStore};
use super::token::TokenService;
use super::{AuthError, AuthenticatedUser};
use crate::config::AppConfig;
use crate::models::{LoginRequest, UserRecord};
use crate::store::UserRepository;

/// Password verified against unknown emails so both failure paths cost the same.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Which artifact the auth cookie carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Stateless signed token
    Token,
    /// Opaque server-side session identifier
    Session,
}

impl FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" | "jwt" => Ok(AuthScheme::Token),
            "session" => Ok(AuthScheme::Session),
            other => Err(format!("unknown auth scheme '{other}' (expected 'token' or 'session')")),
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthScheme::Token => write!(f, "token"),
            AuthScheme::Session => write!(f, "session"),
        }
    }
}

/// Credential backend behind the guard.
#[derive(Clone)]
pub enum AuthBackend {
    Token(TokenService),
    Session(SessionStore),
}

/// Authentication entry points used by handlers and the request guard.
#[derive(Clone)]
pub struct AuthService {
    hasher: CredentialHasher,
    backend: AuthBackend,
    cookies: CookieSettings,
    decoy_digest: Arc<str>,
}

impl AuthService {
    pub fn new(
        hasher: CredentialHasher,
        backend: AuthBackend,
        cookies: CookieSettings,
    ) -> Result<Self, AuthError> {
        let decoy_digest = hasher.hash(DECOY_PASSWORD)?.into();
        Ok(Self {
            hasher,
            backend,
            cookies,
            decoy_digest,
        })
    }

    /// Build the service described by `config`, using the system clock.
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let hasher = CredentialHasher::new(config.hash_time_cost)?;

        let backend = match config.scheme {
            AuthScheme::Token => {
                let secret = config.secret.as_deref().ok_or_else(|| {
                    AuthError::Internal("token mode requires a signing secret".to_string())
                })?;
                AuthBackend::Token(TokenService::new(secret.as_bytes(), config.ttl, clock)?)
            }
            AuthScheme::Session => AuthBackend::Session(SessionStore::new(config.ttl, clock)?),
        };

        let cookies = CookieSettings::new(config.cookie_name.clone(), config.cookie_secure, Some(config.ttl));
        Self::new(hasher, backend, cookies)
    }

    pub fn scheme(&self) -> AuthScheme {
        match self.backend {
            AuthBackend::Token(_) => AuthScheme::Token,
            AuthBackend::Session(_) => AuthScheme::Session,
        }
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookies.name
    }

    /// The session store, when running in session mode.
    pub fn session_store(&self) -> Option<&SessionStore> {
        match &self.backend {
            AuthBackend::Session(store) => Some(store),
            AuthBackend::Token(_) => None,
        }
    }

    /// The token service, when running in token mode.
    pub fn token_service(&self) -> Option<&TokenService> {
        match &self.backend {
            AuthBackend::Token(tokens) => Some(tokens),
            AuthBackend::Session(_) => None,
        }
    }

    /// Verify credentials and issue a token or session identifier.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, users: &dyn UserRepository, request: LoginRequest) -> Result<String, AuthError> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::MalformedInput("email and password are required".to_string()));
        }

        let user = users.find_by_email(email)?;
        let digest: Arc<str> = match &user {
            Some(user) => user.password_hash.as_str().into(),
            None => self.decoy_digest.clone(),
        };

        let hasher = self.hasher.clone();
        let password = request.password;
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))??;

        let user = match (user, matched) {
            (Some(user), true) => user,
            _ => {
                debug!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let credential = match &self.backend {
            AuthBackend::Token(tokens) => tokens.issue(user.id, None)?,
            AuthBackend::Session(sessions) => {
                sessions
                    .create(SessionData {
                        user_id: user.id,
                        role: Role::default(),
                    })
                    .await?
            }
        };

        info!(user_id = user.id, scheme = %self.scheme(), "User logged in");
        Ok(credential)
    }

    /// Validate a cookie value and resolve the identity behind it.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let credential = credential
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        match &self.backend {
            AuthBackend::Token(tokens) => tokens.validate(credential).map(AuthenticatedUser::from_claims),
            AuthBackend::Session(sessions) => sessions.get(credential).await.map(AuthenticatedUser::from_session),
        }
    }

    /// Invalidate server-side state for a credential. Token mode has none.
    pub async fn logout(&self, credential: Option<&str>) {
        if let (AuthBackend::Session(sessions), Some(id)) = (&self.backend, credential) {
            if sessions.destroy(id).await {
                info!("Session destroyed on logout");
            }
        }
    }

    /// Load the user record behind an admitted identity.
    ///
    /// In token mode the presented token is resolved again through
    /// [`TokenService::resolve_user`]; session mode looks up the admitted id.
    /// A deleted account yields [`AuthError::UnknownUser`].
    pub fn lookup_user(
        &self,
        identity: &AuthenticatedUser,
        credential: Option<&str>,
        users: &dyn UserRepository,
    ) -> Result<UserRecord, AuthError> {
        let user = match (&self.backend, credential) {
            (AuthBackend::Token(tokens), Some(token)) => tokens.resolve_user(token, users)?,
            _ => users
                .find_by_id(identity.user_id)?
                .ok_or(AuthError::UnknownUser)?,
        };

        if user.id != identity.user_id {
            return Err(AuthError::UnknownUser);
        }
        Ok(user)
    }

    pub fn login_cookie(&self, credential: String) -> Cookie<'static> {
        self.cookies.credential_cookie(credential)
    }

    pub fn logout_cookie(&self) -> Cookie<'static> {
        self.cookies.removal_cookie()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::DateTime;

    use crate::auth::clock::ManualClock;
    use crate::auth::cookie::{SESSION_COOKIE_NAME, TOKEN_COOKIE_NAME};
    use crate::models::NewUser;
    use crate::store::InMemoryUserStore;

    const TTL: Duration = Duration::from_secs(3600);

    fn clock() -> ManualClock {
        ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
    }

    fn users(hasher: &CredentialHasher) -> (InMemoryUserStore, UserRecord) {
        let store = InMemoryUserStore::new();
        let user = store
            .create_user(
                NewUser {
                    nickname: "alice".into(),
                    email: "a@x.com".into(),
                    password: "secret1".into(),
                },
                hasher,
            )
            .unwrap();
        (store, user)
    }

    fn token_service(clock: &ManualClock) -> AuthService {
        let hasher = CredentialHasher::with_cost(8, 1).unwrap();
        let tokens = TokenService::new(b"secret", TTL, Arc::new(clock.clone())).unwrap();
        AuthService::new(
            hasher,
            AuthBackend::Token(tokens),
            CookieSettings::new(TOKEN_COOKIE_NAME, false, Some(TTL)),
        )
        .unwrap()
    }

    fn session_service(clock: &ManualClock) -> AuthService {
        let hasher = CredentialHasher::with_cost(8, 1).unwrap();
        let sessions = SessionStore::new(TTL, Arc::new(clock.clone())).unwrap();
        AuthService::new(
            hasher,
            AuthBackend::Session(sessions),
            CookieSettings::new(SESSION_COOKIE_NAME, false, Some(TTL)),
        )
        .unwrap()
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn token_login_round_trip() {
        let clock = clock();
        let service = token_service(&clock);
        let (store, user) = users(service.hasher());

        let token = service.login(&store, login_request("a@x.com", "secret1")).await.unwrap();
        let identity = service.authenticate(Some(&token)).await.unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(
            service.lookup_user(&identity, Some(&token), &store).unwrap().email,
            "a@x.com"
        );
    }

    #[tokio::test]
    async fn token_for_missing_account_is_unknown_user() {
        let clock = clock();
        let service = token_service(&clock);
        let (store, _) = users(service.hasher());

        let token = service.token_service().unwrap().issue(404, None).unwrap();
        let identity = service.authenticate(Some(&token)).await.unwrap();
        assert!(matches!(
            service.lookup_user(&identity, Some(&token), &store),
            Err(AuthError::UnknownUser)
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let clock = clock();
        let service = token_service(&clock);
        let (store, _) = users(service.hasher());

        let wrong = service.login(&store, login_request("a@x.com", "nope")).await;
        let unknown = service.login(&store, login_request("b@x.com", "secret1")).await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn blank_fields_are_malformed() {
        let clock = clock();
        let service = token_service(&clock);
        let (store, _) = users(service.hasher());

        let result = service.login(&store, login_request("  ", "secret1")).await;
        assert!(matches!(result, Err(AuthError::MalformedInput(_))));
        let result = service.login(&store, login_request("a@x.com", "")).await;
        assert!(matches!(result, Err(AuthError::MalformedInput(_))));
    }

    #[tokio::test]
    async fn missing_credential_is_rejected() {
        let clock = clock();
        let service = token_service(&clock);
        assert!(matches!(service.authenticate(None).await, Err(AuthError::MissingCredential)));
        assert!(matches!(service.authenticate(Some("")).await, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn session_login_logout() {
        let clock = clock();
        let service = session_service(&clock);
        let (store, user) = users(service.hasher());

        let id = service.login(&store, login_request("a@x.com", "secret1")).await.unwrap();
        let identity = service.authenticate(Some(&id)).await.unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.role, Some(Role::default()));
        assert_eq!(identity.session_id.as_deref(), Some(id.as_str()));

        service.logout(Some(&id)).await;
        assert!(matches!(
            service.authenticate(Some(&id)).await,
            Err(AuthError::SessionNotFound)
        ));
        // Second logout is harmless.
        service.logout(Some(&id)).await;
    }

    #[tokio::test]
    async fn session_expires_with_clock() {
        let clock = clock();
        let service = session_service(&clock);
        let (store, _) = users(service.hasher());

        let id = service.login(&store, login_request("a@x.com", "secret1")).await.unwrap();
        clock.advance(chrono::Duration::hours(1));
        assert!(matches!(
            service.authenticate(Some(&id)).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn token_cannot_be_used_as_session_id() {
        let clock = clock();
        let tokens = token_service(&clock);
        let sessions = session_service(&clock);
        let (store, _) = users(tokens.hasher());

        let token = tokens.login(&store, login_request("a@x.com", "secret1")).await.unwrap();
        assert!(matches!(
            sessions.authenticate(Some(&token)).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[test]
    fn scheme_parses() {
        assert_eq!("token".parse::<AuthScheme>().unwrap(), AuthScheme::Token);
        assert_eq!(" Session ".parse::<AuthScheme>().unwrap(), AuthScheme::Session);
        assert!("basic".parse::<AuthScheme>().is_err());
    }
}
