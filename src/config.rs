// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded from
//! them at startup. Configuration is passed explicitly into constructors.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_SCHEME` | `token` or `session` | `token` |
//! | `API_SECRET` | HMAC signing secret | Required in token mode |
//! | `AUTH_TTL_SECS` | Token / session lifetime, at most one year | `3600` |
//! | `REAPER_INTERVAL_SECS` | Expired-session sweep interval | `3600` |
//! | `AUTH_COOKIE_NAME` | Auth cookie name | `token` or `session` |
//! | `COOKIE_SECURE` | Set the `Secure` cookie attribute | `false` |
//! | `HASH_COST` | Argon2 time cost | `2` |
//! | `SEED_USERS` | `nick:email:password;...` created at startup | none |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::clock::MAX_TTL;
use crate::auth::cookie::{SESSION_COOKIE_NAME, TOKEN_COOKIE_NAME};
use crate::auth::password::DEFAULT_TIME_COST;
use crate::auth::AuthScheme;
use crate::models::NewUser;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH_SCHEME_ENV: &str = "AUTH_SCHEME";
/// Signing secret for tokens. Never logged.
pub const API_SECRET_ENV: &str = "API_SECRET";
pub const AUTH_TTL_ENV: &str = "AUTH_TTL_SECS";
pub const REAPER_INTERVAL_ENV: &str = "REAPER_INTERVAL_SECS";
pub const COOKIE_NAME_ENV: &str = "AUTH_COOKIE_NAME";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const HASH_COST_ENV: &str = "HASH_COST";
pub const SEED_USERS_ENV: &str = "SEED_USERS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_REAPER_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Startup configuration. Not `Debug`: it carries the signing secret.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub scheme: AuthScheme,
    pub secret: Option<String>,
    pub ttl: Duration,
    pub reaper_interval: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub hash_time_cost: u32,
    pub seed_users: Vec<NewUser>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scheme = match var(AUTH_SCHEME_ENV) {
            Some(raw) => raw.parse::<AuthScheme>().map_err(|reason| ConfigError::Invalid {
                name: AUTH_SCHEME_ENV,
                reason,
            })?,
            None => AuthScheme::Token,
        };

        let secret = var(API_SECRET_ENV);
        if scheme == AuthScheme::Token && secret.is_none() {
            return Err(ConfigError::Missing(API_SECRET_ENV));
        }

        let ttl = parse_or(var(AUTH_TTL_ENV), AUTH_TTL_ENV, DEFAULT_TTL_SECS)?;
        if ttl == 0 {
            return Err(invalid(AUTH_TTL_ENV, "must be positive"));
        }
        if ttl > MAX_TTL.as_secs() {
            return Err(invalid(AUTH_TTL_ENV, format!("must not exceed {}", MAX_TTL.as_secs())));
        }
        let reaper_interval = parse_or(
            var(REAPER_INTERVAL_ENV),
            REAPER_INTERVAL_ENV,
            DEFAULT_REAPER_INTERVAL_SECS,
        )?;
        if reaper_interval == 0 {
            return Err(invalid(REAPER_INTERVAL_ENV, "must be positive"));
        }

        let cookie_name = var(COOKIE_NAME_ENV).unwrap_or_else(|| {
            match scheme {
                AuthScheme::Token => TOKEN_COOKIE_NAME,
                AuthScheme::Session => SESSION_COOKIE_NAME,
            }
            .to_string()
        });
        if !cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(COOKIE_NAME_ENV, "only [A-Za-z0-9_-] allowed"));
        }

        let cookie_secure = match var(COOKIE_SECURE_ENV) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid(COOKIE_SECURE_ENV, "expected true or false"))?,
            None => false,
        };

        let hash_time_cost = parse_or(var(HASH_COST_ENV), HASH_COST_ENV, DEFAULT_TIME_COST)?;

        let seed_users = match var(SEED_USERS_ENV) {
            Some(raw) => parse_seed_users(&raw)?,
            None => Vec::new(),
        };

        let log_format = match var(LOG_FORMAT_ENV).map(|v| v.to_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid(LOG_FORMAT_ENV, format!("unknown format '{other}'"))),
        };

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            scheme,
            secret,
            ttl: Duration::from_secs(ttl),
            reaper_interval: Duration::from_secs(reaper_interval),
            cookie_name,
            cookie_secure,
            hash_time_cost,
            seed_users,
            log_format,
        })
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid(HOST_ENV, e.to_string()))
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(name, e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_seed_users(raw: &str) -> Result<Vec<NewUser>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(nickname), Some(email), Some(password))
                    if !nickname.is_empty() && !email.is_empty() && !password.is_empty() =>
                {
                    Ok(NewUser {
                        nickname: nickname.to_string(),
                        email: email.to_string(),
                        password: password.to_string(),
                    })
                }
                _ => Err(invalid(SEED_USERS_ENV, "expected nickname:email:password entries")),
            }
        })
        .collect()
}
