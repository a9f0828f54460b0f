// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-way password hashing with Argon2id.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) and
//! carry their own parameters, so raising the cost does not invalidate
//! existing digests. Both operations are CPU-bound; async callers should run
//! them on the blocking pool.

use argon2::password_hash::{
    rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version, ARGON2ID_IDENT};

use super::AuthError;

/// Default Argon2 time cost (iterations).
pub const DEFAULT_TIME_COST: u32 = Params::DEFAULT_T_COST;

/// Hashes and verifies passwords.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Hasher with the default memory cost and the given time cost.
    pub fn new(time_cost: u32) -> Result<Self, AuthError> {
        Self::with_cost(Params::DEFAULT_M_COST, time_cost)
    }

    /// Hasher with explicit memory (KiB) and time costs.
    pub fn with_cost(memory_kib: u32, time_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, time_cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        if plaintext.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(digest.to_string())
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Returns `Ok(false)` on mismatch. The final comparison is constant-time.
    pub fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(digest).map_err(|_| AuthError::MalformedDigest)?;
        if parsed.algorithm != ARGON2ID_IDENT || parsed.hash.is_none() {
            return Err(AuthError::MalformedDigest);
        }

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(_) => Err(AuthError::MalformedDigest),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}
