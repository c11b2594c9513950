//! Ingestion pipeline: decode one JSON document, flatten bundles, write each
//! resource in order.
//!
//! Writes are not transactional across resources. When the Nth write fails
//! the first N-1 resources stay persisted and the remaining ones are skipped.

use std::io::Read;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use appointment_core::registry::read_first_value;
use appointment_core::{Reference, Resource, ResourceRegistry, ResourceType};

use crate::error::IngestError;
use crate::traits::ResourceWriter;

/// Default upper bound on the number of resources in one document.
pub const DEFAULT_MAX_BUNDLE_ENTRIES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Maximum number of concrete resources after flattening. `None` disables
    /// the check.
    pub max_bundle_entries: Option<usize>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_bundle_entries: Some(DEFAULT_MAX_BUNDLE_ENTRIES),
        }
    }
}

impl IngestOptions {
    pub fn unlimited() -> Self {
        Self {
            max_bundle_entries: None,
        }
    }

    pub fn with_max_bundle_entries(mut self, limit: usize) -> Self {
        self.max_bundle_entries = Some(limit);
        self
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Written resources in write order.
    pub written: Vec<Reference>,
}

impl IngestReport {
    pub fn count(&self) -> usize {
        self.written.len()
    }

    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.written
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }
}

/// Ingests the first JSON document read from `reader`.
pub async fn ingest_reader<R, W>(
    reader: R,
    writer: &W,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError>
where
    R: Read,
    W: ResourceWriter + ?Sized,
{
    let value = read_first_value(reader).map_err(|e| IngestError::decode(None, e))?;
    ingest_value(value, writer, options).await
}

/// Ingests the first JSON document in `bytes`.
pub async fn ingest_slice<W>(
    bytes: &[u8],
    writer: &W,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError>
where
    W: ResourceWriter + ?Sized,
{
    ingest_reader(bytes, writer, options).await
}

/// Ingests an already parsed JSON document.
pub async fn ingest_value<W>(
    value: Value,
    writer: &W,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError>
where
    W: ResourceWriter + ?Sized,
{
    let top_level_id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let resource = ResourceRegistry::global()
        .decode(value)
        .map_err(|e| IngestError::decode(top_level_id, e))?;

    ingest_resource(resource, writer, options).await
}

/// Flattens and writes a decoded resource.
pub async fn ingest_resource<W>(
    resource: Resource,
    writer: &W,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError>
where
    W: ResourceWriter + ?Sized,
{
    let document_type = resource.resource_type();
    let resources = resource.into_flattened();

    if let Some(limit) = options.max_bundle_entries {
        if resources.len() > limit {
            warn!(count = resources.len(), limit, "rejecting oversized bundle");
            return Err(IngestError::BundleTooLarge {
                count: resources.len(),
                limit,
            });
        }
    }

    let mut report = IngestReport::default();
    for resource in &resources {
        let resource_type = resource.resource_type();
        let id = resource.id().unwrap_or_default().to_string();

        debug!(resource_type = %resource_type, id = %id, "writing resource");
        writer
            .write_resource(resource)
            .await
            .map_err(|source| IngestError::Write {
                resource_type,
                id: id.clone(),
                source,
            })?;
        report.written.push(Reference::new(resource_type, id));
    }

    info!(
        document_type = %document_type,
        written = report.count(),
        "ingested document"
    );
    Ok(report)
}
