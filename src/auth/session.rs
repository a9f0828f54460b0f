// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side session store.
//!
//! ## Concurrency
//!
//! The whole table sits behind one `RwLock`. Each operation takes the lock
//! once, touches a single entry (or sweeps), and releases it. Nothing slow
//! (hashing, I/O) ever runs while the lock is held, and an entry's data is
//! replaced as a whole, so readers never see a half-written session.
//!
//! ## Expiry
//!
//! Reads never extend a session. Expiry only moves when [`SessionStore::renew`]
//! is called, and then only forward. Expired entries are refused on read and
//! physically removed by [`SessionStore::purge_expired`], which the reaper
//! calls on a timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use tokio::sync::RwLock;

use super::clock::{Clock, MAX_TTL};
use super::roles::Role;
use super::AuthError;

/// Default session lifetime (one hour).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Random bytes per session identifier (256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Attributes stored for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: u64,
    pub role: Role,
}

/// Snapshot of a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
}

struct SessionRecord {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session table keyed by opaque identifiers.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        to_chrono(default_ttl)?;
        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
            clock,
            rng: SystemRandom::new(),
        })
    }

    /// Create a session with the default TTL and return its identifier.
    pub async fn create(&self, data: SessionData) -> Result<String, AuthError> {
        self.create_with_ttl(data, self.default_ttl).await
    }

    /// Create a session that expires `ttl` from now.
    pub async fn create_with_ttl(&self, data: SessionData, ttl: Duration) -> Result<String, AuthError> {
        let ttl = to_chrono(ttl)?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::InvalidTtl)?;

        loop {
            let id = self.generate_id()?;
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&id) {
                continue;
            }
            sessions.insert(id.clone(), SessionRecord { data, expires_at });
            return Ok(id);
        }
    }

    /// Look up a live session.
    pub async fn get(&self, id: &str) -> Result<Session, AuthError> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        let record = sessions.get(id).ok_or(AuthError::SessionNotFound)?;
        if record.is_expired(now) {
            return Err(AuthError::SessionExpired);
        }

        Ok(Session {
            id: id.to_string(),
            data: record.data.clone(),
            expires_at: record.expires_at,
        })
    }

    /// Replace the attributes of a live session. Expiry is left unchanged.
    pub async fn save(&self, id: &str, data: SessionData) -> Result<(), AuthError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(record) if !record.is_expired(now) => {
                record.data = data;
                Ok(())
            }
            _ => Err(AuthError::SessionNotFound),
        }
    }

    /// Push expiry to at least `ttl` from now. Never shortens a session.
    pub async fn renew(&self, id: &str, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
        let ttl = to_chrono(ttl)?;
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(id).ok_or(AuthError::SessionNotFound)?;
        if record.is_expired(now) {
            return Err(AuthError::SessionExpired);
        }

        let renewed = now.checked_add_signed(ttl).ok_or(AuthError::InvalidTtl)?;
        record.expires_at = record.expires_at.max(renewed);
        Ok(record.expires_at)
    }

    /// Remove a session. Returns whether anything was removed.
    pub async fn destroy(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Remove every expired session and return how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn generate_id(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::Internal("system randomness unavailable".to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

fn to_chrono(ttl: Duration) -> Result<chrono::Duration, AuthError> {
    if ttl.as_secs() == 0 || ttl > MAX_TTL {
        return Err(AuthError::InvalidTtl);
    }
    chrono::Duration::from_std(ttl).map_err(|_| AuthError::InvalidTtl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    fn store() -> (SessionStore, ManualClock) {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let store = SessionStore::new(DEFAULT_SESSION_TTL, Arc::new(clock.clone())).unwrap();
        (store, clock)
    }

    fn data(user_id: u64, role: &str) -> SessionData {
        SessionData {
            user_id,
            role: Role::parse(role).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let (store, clock) = store();
        let id = store.create(data(1, "member")).await.unwrap();

        let session = store.get(&id).await.unwrap();
        assert_eq!(session.data, data(1, "member"));
        assert_eq!(session.expires_at, clock.now() + chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn identifiers_are_unique_and_opaque() {
        let (store, _) = store();
        let a = store.create(data(1, "member")).await.unwrap();
        let b = store.create(data(1, "member")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn get_fails_once_ttl_elapses() {
        let (store, clock) = store();
        let id = store
            .create_with_ttl(data(1, "member"), Duration::from_secs(30))
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(29));
        assert!(store.get(&id).await.is_ok());

        clock.advance(chrono::Duration::seconds(1));
        assert!(matches!(store.get(&id).await, Err(AuthError::SessionExpired)));

        assert_eq!(store.purge_expired().await, 1);
        assert!(matches!(store.get(&id).await, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn reads_do_not_extend_expiry() {
        let (store, clock) = store();
        let id = store.create(data(1, "member")).await.unwrap();
        let before = store.get(&id).await.unwrap().expires_at;

        clock.advance(chrono::Duration::minutes(10));
        let after = store.get(&id).await.unwrap().expires_at;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (store, _) = store();
        assert!(matches!(store.get("nope").await, Err(AuthError::SessionNotFound)));
        assert!(matches!(
            store.save("nope", data(1, "member")).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn save_overwrites_live_sessions_only() {
        let (store, clock) = store();
        let id = store.create(data(1, "member")).await.unwrap();

        store.save(&id, data(1, "admin")).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().data.role.as_str(), "admin");

        clock.advance(chrono::Duration::hours(2));
        assert!(matches!(
            store.save(&id, data(1, "member")).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let (store, _) = store();
        let id = store.create(data(1, "member")).await.unwrap();
        assert!(store.destroy(&id).await);
        assert!(!store.destroy(&id).await);
        assert!(matches!(store.get(&id).await, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn renew_only_moves_forward() {
        let (store, clock) = store();
        let id = store.create(data(1, "member")).await.unwrap();
        let original = store.get(&id).await.unwrap().expires_at;

        let shorter = store.renew(&id, Duration::from_secs(60)).await.unwrap();
        assert_eq!(shorter, original);

        clock.advance(chrono::Duration::minutes(30));
        let longer = store.renew(&id, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(longer, clock.now() + chrono::Duration::hours(1));
        assert!(longer > original);
    }

    #[tokio::test]
    async fn purge_leaves_live_sessions_untouched() {
        let (store, clock) = store();
        let short = store
            .create_with_ttl(data(1, "member"), Duration::from_secs(10))
            .await
            .unwrap();
        let long = store
            .create_with_ttl(data(2, "admin"), Duration::from_secs(600))
            .await
            .unwrap();
        let before = store.get(&long).await.unwrap();

        clock.advance(chrono::Duration::seconds(11));
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(matches!(store.get(&short).await, Err(AuthError::SessionNotFound)));
        assert_eq!(store.get(&long).await.unwrap(), before);
    }

    #[tokio::test]
    async fn concurrent_saves_never_merge() {
        let (store, _) = store();
        let id = store.create(data(1, "member")).await.unwrap();
        let first = data(10, "alpha");
        let second = data(20, "beta");

        let mut handles = Vec::new();
        for _ in 0..50 {
            for candidate in [first.clone(), second.clone()] {
                let store = store.clone();
                let id = id.clone();
                handles.push(tokio::spawn(async move { store.save(&id, candidate).await }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.get(&id).await.unwrap().data;
        assert!(stored == first || stored == second, "unexpected state {stored:?}");
    }

    #[tokio::test]
    async fn zero_ttl_is_refused() {
        let (store, _) = store();
        assert!(matches!(
            store.create_with_ttl(data(1, "member"), Duration::ZERO).await,
            Err(AuthError::InvalidTtl)
        ));
    }

    #[tokio::test]
    async fn oversized_ttl_is_refused_not_panicking() {
        let huge = Duration::from_secs(10_000_000_000_000);
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
        assert!(matches!(SessionStore::new(huge, clock), Err(AuthError::InvalidTtl)));

        let (store, _) = store();
        assert!(matches!(
            store.create_with_ttl(data(1, "member"), huge).await,
            Err(AuthError::InvalidTtl)
        ));
        let id = store.create(data(1, "member")).await.unwrap();
        assert!(matches!(store.renew(&id, huge).await, Err(AuthError::InvalidTtl)));
        assert!(store.get(&id).await.is_ok());
    }

    #[tokio::test]
    async fn expiry_past_the_calendar_is_refused() {
        let clock = ManualClock::new(DateTime::<Utc>::MAX_UTC - chrono::Duration::days(1));
        let store = SessionStore::new(DEFAULT_SESSION_TTL, Arc::new(clock)).unwrap();
        assert!(matches!(
            store.create_with_ttl(data(1, "member"), MAX_TTL).await,
            Err(AuthError::InvalidTtl)
        ));
    }
}
