// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User record storage.
//!
//! Authentication only needs to look users up by id and by email and to
//! persist a record after its password changes. [`UserRepository`] is that
//! seam; [`InMemoryUserStore`] is the implementation the binary runs with.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::auth::{AuthError, CredentialHasher};
use crate::error::ApiError;
use crate::models::{NewUser, UserRecord};

/// Errors from the user store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Nickname is already taken")]
    DuplicateNickname,
    #[error("User {0} not found")]
    NotFound(u64),
    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Lookup and persistence of user records.
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: u64) -> Result<Option<UserRecord>, StoreError>;

    /// Exact match on the stored (trimmed) email.
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert when `user.id == 0`, otherwise replace the record with that id.
    /// Returns the stored record.
    fn save(&self, user: UserRecord) -> Result<UserRecord, StoreError>;
}

#[derive(Default)]
struct UserTable {
    users: BTreeMap<u64, UserRecord>,
    last_id: u64,
}

impl UserTable {
    fn check_unique(&self, user: &UserRecord) -> Result<(), StoreError> {
        for existing in self.users.values().filter(|existing| existing.id != user.id) {
            if existing.email == user.email {
                return Err(StoreError::DuplicateEmail);
            }
            if existing.nickname == user.nickname {
                return Err(StoreError::DuplicateNickname);
            }
        }
        Ok(())
    }
}

/// Process-local user store.
#[derive(Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, UserTable>, StoreError> {
        self.table
            .read()
            .map_err(|_| StoreError::Unavailable("user table lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, UserTable>, StoreError> {
        self.table
            .write()
            .map_err(|_| StoreError::Unavailable("user table lock poisoned".to_string()))
    }

    /// Create an account: normalise the record, hash the password once, and
    /// insert it under a fresh id.
    pub fn create_user(&self, new_user: NewUser, hasher: &CredentialHasher) -> Result<UserRecord, ApiError> {
        let now = Utc::now();
        let mut user = UserRecord {
            id: 0,
            nickname: new_user.nickname,
            email: new_user.email,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        user.prepare(now);

        if user.nickname.is_empty() || user.email.is_empty() {
            return Err(ApiError::bad_request("nickname and email are required"));
        }
        user.password_hash = hash_password(hasher, &new_user.password)?;

        Ok(self.save(user)?)
    }

    /// Replace a user's password digest.
    pub fn update_password(&self, id: u64, password: &str, hasher: &CredentialHasher) -> Result<UserRecord, ApiError> {
        let mut user = self.find_by_id(id)?.ok_or(StoreError::NotFound(id))?;
        user.password_hash = hash_password(hasher, password)?;
        user.updated_at = Utc::now();
        Ok(self.save(user)?)
    }

    pub fn len(&self) -> usize {
        self.read().map(|table| table.users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn hash_password(hasher: &CredentialHasher, password: &str) -> Result<String, ApiError> {
    hasher.hash(password).map_err(|e| match e {
        AuthError::EmptyPassword => ApiError::bad_request(e.to_string()),
        other => {
            tracing::error!(error_code = other.error_code(), "Password hashing failed");
            ApiError::internal("Internal server error")
        }
    })
}

impl UserRepository for InMemoryUserStore {
    fn find_by_id(&self, id: u64) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn save(&self, mut user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut table = self.write()?;
        if user.id != 0 && !table.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(user.id));
        }
        table.check_unique(&user)?;

        if user.id == 0 {
            table.last_id += 1;
            user.id = table.last_id;
        }

        table.users.insert(user.id, user.clone());
        Ok(user)
    }
}
