mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use seolink_core::{samples, RedirectRepository, RedirectStore, StorageError};
use seolink_gateway::{App, AppState, Tenancy};
use seolink_manager::{RandomIdGenerator, RedirectManager};
use seolink_storage::{
    BlobStore, FirestoreConfig, FirestoreStore, InMemoryStore, JsonBinClient, JsonBinConfig,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = CLI::try_parse()?;
    let backend = config.storage_backend();

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %backend,
        "starting seolink gateway"
    );

    let state = match backend {
        StorageBackendArg::Auto | StorageBackendArg::InMemory => {
            let store = InMemoryStore::new();
            build_state(&config, store, Tenancy::Single).await
        }
        StorageBackendArg::JsonBin => {
            let client = JsonBinClient::new(
                JsonBinConfig::builder()
                    .api_base(config.jsonbin_api_base.clone())
                    .api_key(config.jsonbin_api_key.clone())
                    .bin_id(config.jsonbin_bin_id.clone())
                    .build(),
            );
            build_state(&config, BlobStore::new(client), Tenancy::Single).await
        }
        StorageBackendArg::Firestore => {
            let store = FirestoreStore::new(
                FirestoreConfig::builder()
                    .api_base(config.firestore_api_base.clone())
                    .project_id(config.firestore_project_id.clone())
                    .api_key(config.firestore_api_key.clone())
                    .bearer_token(config.firestore_bearer_token.clone())
                    .build(),
            );
            build_state(&config, store, Tenancy::Multi).await
        }
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    // forward `log` records (e.g. from the HTTP client) into tracing
    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn build_state<S: RedirectStore>(config: &CLI, store: S, tenancy: Tenancy) -> AppState {
    if !store.is_available() {
        warn!("storage backend is not configured, reads will be empty and writes will fail");
    }
    if config.seed_samples {
        if tenancy.sees_unowned_records() {
            seed(&store).await;
        } else {
            warn!("sample redirects have no owner and would be invisible, skipping seeding");
        }
    }

    let repository: Arc<dyn RedirectRepository> =
        Arc::new(RedirectManager::new(store, RandomIdGenerator::new()));
    AppState::new(repository, config.public_base_url.clone(), tenancy)
}

/// Writes the sample records, keeping any that already exist.
async fn seed<S: RedirectStore>(store: &S) {
    let mut written = 0;
    for record in samples() {
        let id = record.id.clone();
        match store.write_one(record).await {
            Ok(_) => written += 1,
            Err(StorageError::Conflict(_)) => debug!(%id, "sample already present"),
            Err(e) => {
                warn!(%id, error = %e, "failed to seed sample redirect");
                return;
            }
        }
    }
    info!(written, "seeded sample redirects");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
