//! Builds the process-wide store from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use appointment_config::{AppConfig, IngestConfig, Neo4jConfig, StorageBackend, StorageConfig};
use appointment_db_neo4j::Neo4jSettings;
use appointment_storage::{DynAppointmentStore, IngestOptions};

use crate::handlers::AppState;

pub fn neo4j_settings(cfg: &Neo4jConfig) -> Neo4jSettings {
    Neo4jSettings {
        uri: cfg.uri.clone(),
        user: cfg.user.clone(),
        password: cfg.password.clone(),
        database: cfg.database.clone(),
        fetch_size: cfg.fetch_size,
        max_connections: cfg.max_connections,
    }
}

pub fn ingest_options(cfg: &IngestConfig) -> IngestOptions {
    IngestOptions {
        max_bundle_entries: cfg.bundle_limit(),
    }
}

/// Opens the configured backend.
pub async fn build_store(cfg: &StorageConfig) -> anyhow::Result<DynAppointmentStore> {
    let store: DynAppointmentStore = match cfg.backend {
        StorageBackend::Memory => appointment_db_memory::create_dyn_store(),
        StorageBackend::Neo4j => {
            let settings = neo4j_settings(&cfg.neo4j);
            let store = appointment_db_neo4j::connect_store(&settings)
                .await
                .with_context(|| format!("failed to connect to neo4j at {}", settings.uri))?;
            Arc::new(store)
        }
    };
    info!(backend = store.backend_name(), "storage initialized");
    Ok(store)
}

pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store = build_store(&cfg.storage).await?;
    Ok(AppState::new(store, ingest_options(&cfg.ingest)))
}
