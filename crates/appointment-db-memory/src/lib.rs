//! In-memory property-graph backend for the appointment store.
//!
//! Used as the default backend and in tests.
//!
//! # Example
//!
//! ```ignore
//! use appointment_db_memory::create_memory_store;
//! use appointment_storage::{AppointmentStore, IngestOptions, ingest_slice};
//!
//! let store = create_memory_store();
//! ingest_slice(br#"{"resourceType": "Patient", "id": "p-1"}"#, &store, &IngestOptions::default()).await?;
//! assert!(store.get_patient("p-1").await?.is_some());
//! ```

mod graph;

pub use graph::InMemoryGraph;

use appointment_graph::GraphStore;
use appointment_storage::DynAppointmentStore;

/// Appointment store backed by an [`InMemoryGraph`].
pub type MemoryStore = GraphStore<InMemoryGraph>;

/// Creates a new empty in-memory store.
pub fn create_memory_store() -> MemoryStore {
    GraphStore::new(InMemoryGraph::new())
}

/// Creates a new empty in-memory store behind a shared handle.
pub fn create_dyn_store() -> DynAppointmentStore {
    std::sync::Arc::new(create_memory_store())
}
