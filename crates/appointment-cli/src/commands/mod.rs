pub mod config;
pub mod feedback;
pub mod ingest;
pub mod read;

use anyhow::{Result, bail};

use appointment_config::{StorageBackend, StorageConfig};

/// Writes from a one-shot process are lost with the in-memory backend.
pub fn ensure_persistent(storage: &StorageConfig, action: &str) -> Result<()> {
    if storage.backend == StorageBackend::Memory {
        bail!(
            "{action} needs a persistent backend: the memory backend discards data when the \
             command exits. Set storage.backend = \"neo4j\" (or APPOINTMENT__STORAGE__BACKEND=neo4j)"
        );
    }
    Ok(())
}
