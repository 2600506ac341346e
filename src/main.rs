use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use subtrack_api::config::config;
use subtrack_api::database::{DatabaseManager, PgProfileStore};
use subtrack_api::identity::HttpIdentityStore;
use subtrack_api::is_development;
use subtrack_api::server::{self, AppState};
use subtrack_api::services::BootstrapTrigger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, IDENTITY_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();
    tracing::info!("Starting Subtrack API in {:?} mode", config.environment);

    let identity = HttpIdentityStore::new(&config.identity)
        .context("failed to configure identity provider client")?;
    let profiles = PgProfileStore::from_config(&config.database)
        .await
        .context("failed to configure profile store")?;

    let state = AppState::new(Arc::new(identity), Arc::new(profiles), config);
    let app = server::app(state, &config.security.cors_origins);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    let local = listener.local_addr()?;
    // The trigger calls back into this process; unspecified binds are reached via loopback
    let self_addr = if local.ip().is_unspecified() {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), local.port())
    } else {
        local
    };

    println!("🚀 Subtrack API listening on http://{}", bind_addr);

    if config.bootstrap.enabled {
        let trigger = BootstrapTrigger::new(&format!("http://{}", self_addr), &config.bootstrap);
        let _ = trigger.fire();
    } else if is_development!() {
        tracing::info!("Admin bootstrap disabled; set BOOTSTRAP_ENABLED=true to run it at startup");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
