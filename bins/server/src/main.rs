//! Khata API Server
//!
//! Main entry point for the Khata ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use khata_api::{AppState, create_router};
use khata_core::storage::{StorageConfig, StorageService};
use khata_db::LedgerRepository;
use khata_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "khata=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let jwt_service = JwtService::new(JwtConfig::from_settings(&config.jwt));

    let storage = StorageService::from_config(StorageConfig::from_settings(&config.storage))
        .context("failed to initialize proof storage")?;
    info!(
        provider = storage.provider_name(),
        root = %config.storage.root,
        "Proof storage configured"
    );

    let repository = LedgerRepository::new(config.ledger.cash_opening_balance)
        .await
        .context("invalid cash opening balance")?;
    info!(cash_opening_balance = %config.ledger.cash_opening_balance, "Ledger ready");

    let state = AppState {
        repository: Arc::new(repository),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
