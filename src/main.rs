// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wazo-Google API Server
//!
//! Manages users' Google OAuth grants and serves their Google contacts as
//! directory sources.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wazo_google::{
    config::Config,
    db::{CredentialStore, InMemoryCredentialStore},
    services::{load_sources, GoogleOAuthClient, PendingAuthorizations, TokenLifecycle},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        flow = ?config.oauth_flow,
        oauth_configured = config.google_client.is_some(),
        "Starting Wazo-Google API"
    );

    // Cancelled on shutdown, parent of every pending confirmation
    let shutdown = CancellationToken::new();

    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let pending = Arc::new(PendingAuthorizations::new(
        shutdown.clone(),
        config.confirmation_timeout,
    ));
    let lifecycle = TokenLifecycle::new(
        GoogleOAuthClient::new(config.google_endpoints.clone()),
        store,
        pending,
        &config.oauth_state_key,
    );

    // Load directory sources
    let sources = match &config.sources_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading directory sources");
            load_sources(path)?
        }
        None => HashMap::new(),
    };
    tracing::info!(count = sources.len(), "Directory sources loaded");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        lifecycle,
        sources,
    });

    // Build router
    let app = wazo_google::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

/// Resolve on Ctrl-C, cancelling pending confirmations.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    shutdown.cancel();
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wazo_google=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
