// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthService;
use crate::store::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>, auth: AuthService) -> Self {
        Self {
            users,
            auth: Arc::new(auth),
        }
    }
}
