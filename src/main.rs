// src/main.rs

//! # SBT Registry - Main Entry Point
//!
//! Registry service for soulbound job credentials. Companies register as
//! issuers, individuals request proof of employment from them, companies
//! accept or reject those requests, and anyone can verify an issued
//! credential.
//!
//! ## Architecture Overview
//! 1. **Contracts Layer**: `SbtRegistry`, the credential state machine
//! 2. **Services Layer**: Transactional shared state, issuer/verifier services, API endpoints
//! 3. **Storage Layer**: Optional JSON snapshot persistence
//!
//! ## Configuration
//! - `SBT__SERVER__HOST` / `SBT__SERVER__PORT`: Bind address (default 127.0.0.1:3000)
//! - `SBT__STORAGE__SNAPSHOT_PATH`: (Optional) registry snapshot file
//! - `RUST_LOG`: log filter (default `info`)

use crate::contracts::sbt_registry::SbtRegistry;
use crate::services::api_server::ApiServer;
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::registry_state::SharedRegistry;
use crate::services::verifier::Verifier;
use crate::settings::Settings;
use crate::storage::snapshot_store::SnapshotStore;
use anyhow::Context;
use dotenv::dotenv;

// Module declarations (organized by functional domain)
mod contracts;     // Registry state machine
mod models;        // Data structures
mod services;      // Business logic and API
mod settings;      // Layered configuration
mod storage;       // Snapshot persistence
mod utils;         // Helper functions

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` and initialize logging
/// 2. Load settings
/// 3. Restore (or create) the registry
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load settings")?;

    let registry = match &settings.storage.snapshot_path {
        Some(path) => SharedRegistry::open(SnapshotStore::new(path))
            .await
            .with_context(|| format!("failed to restore registry from {}", path.display()))?,
        None => {
            log::warn!("No snapshot path configured; registry state will not survive a restart");
            SharedRegistry::in_memory(SbtRegistry::new())
        }
    };

    let credential_issuer = CredentialIssuer::new(registry.clone());
    let verifier = Verifier::new(registry);
    let api_server = ApiServer::new(credential_issuer, verifier);

    let addr = settings.socket_addr();
    log::info!("Available endpoints:");
    log::info!("- POST /companies");
    log::info!("- POST /requests");
    log::info!("- GET  /requests/pending");
    log::info!("- POST /requests/respond");
    log::info!("- GET  /issued/count");
    log::info!("- GET  /verify/:issuer/:subject/:id");

    api_server.run(addr).await.context("API server failed")?;
    Ok(())
}
