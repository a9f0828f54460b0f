// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use authgate::api::router;
use authgate::auth::{AuthService, ReaperHandle, SessionReaper};
use authgate::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER};
use authgate::state::AppState;
use authgate::store::InMemoryUserStore;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server terminated");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let auth = AuthService::from_config(&config)?;

    let users = Arc::new(InMemoryUserStore::new());
    for seed in config.seed_users.iter().cloned() {
        let nickname = seed.nickname.clone();
        match users.create_user(seed, auth.hasher()) {
            Ok(user) => info!(user_id = user.id, nickname = %user.nickname, "Seeded user"),
            Err(e) => warn!(nickname = %nickname, error = %e.message, "Skipping seed user"),
        }
    }

    let reaper = auth.session_store().map(|store| {
        ReaperHandle::spawn(SessionReaper::new(store.clone()).with_interval(config.reaper_interval))
    });

    let state = AppState::new(users, auth);
    let app = router(state);

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, scheme = %config.scheme, "authgate listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(reaper) = reaper {
        reaper.shutdown().await;
    }
    info!("Server stopped");
    Ok(())
}
