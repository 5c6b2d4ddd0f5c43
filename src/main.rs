// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weight Tracker API Server
//!
//! Records personal weight measurements for users who log in through Okta.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weight_tracker::{
    config::Config,
    db::{MeasurementStore, MemoryMeasurementStore, PgMeasurementStore},
    services::{IdentityProvider, OktaProvider},
    AppState,
};

/// `DATABASE_URL` value that selects the in-process store.
const MEMORY_DATABASE_URL: &str = "memory:";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        mode = ?config.deployment_mode,
        "Starting Weight Tracker API"
    );

    // Connect to the measurement store; failing here is fatal
    let store: Arc<dyn MeasurementStore> = if config.database_url == MEMORY_DATABASE_URL {
        tracing::warn!("Using in-memory measurement store, data will not persist");
        Arc::new(MemoryMeasurementStore::new())
    } else {
        let pg =
            PgMeasurementStore::connect(&config.database_url, config.database_max_connections)
                .await?;
        pg.init_schema().await?;
        Arc::new(pg)
    };

    let identity_provider: Arc<dyn IdentityProvider> = Arc::new(OktaProvider::new(&config)?);
    tracing::info!(org = %config.okta_org_url, "Okta identity provider configured");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, identity_provider)?);

    // Build router
    let app = weight_tracker::routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("weight_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
