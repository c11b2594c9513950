//! # appointment-storage
//!
//! Storage abstraction for appointment records.
//!
//! This crate defines the traits every store implements and the ingestion
//! pipeline that drives them. It does not contain any backend.
//!
//! ## Overview
//!
//! - [`ResourceWriter`] persists individual resources (upsert by ID).
//! - [`AppointmentStore`] adds reads that reassemble linked resources.
//! - [`ingest`] decodes a JSON document, flattens bundles and writes every
//!   resource sequentially through a [`ResourceWriter`].
//!
//! ## Example
//!
//! ```ignore
//! use appointment_storage::prelude::*;
//!
//! async fn load(store: &dyn AppointmentStore, body: &[u8]) -> Result<usize, IngestError> {
//!     let report = ingest_slice(body, store, &IngestOptions::default()).await?;
//!     Ok(report.count())
//! }
//! ```

mod error;
pub mod ingest;
mod traits;

pub use error::{ErrorCategory, IngestError, StorageError};
pub use ingest::{
    DEFAULT_MAX_BUNDLE_ENTRIES, IngestOptions, IngestReport, ingest_reader, ingest_resource,
    ingest_slice, ingest_value,
};
pub use traits::{AppointmentStore, ResourceWriter};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle to a store, constructed once by the process.
pub type DynAppointmentStore = std::sync::Arc<dyn AppointmentStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, IngestError, StorageError};
    pub use crate::ingest::{IngestOptions, IngestReport, ingest_reader, ingest_slice};
    pub use crate::traits::{AppointmentStore, ResourceWriter};
    pub use crate::{DynAppointmentStore, StorageResult};
}
