// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque role attribute carried in session state.
//!
//! No permission model hangs off this value; it is stored at login and handed
//! to protected handlers untouched.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role assigned to a session when nothing more specific is known.
pub const DEFAULT_ROLE: &str = "member";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Build a role, normalising case and surrounding whitespace.
    /// Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Role> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Role(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Role(DEFAULT_ROLE.to_string())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
