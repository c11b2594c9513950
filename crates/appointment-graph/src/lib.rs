//! # appointment-graph
//!
//! Persists appointment resources into a property graph and reassembles
//! them from graph reads.
//!
//! - [`model`]: labels, relationship types, properties, mutations and rows.
//! - [`GraphBackend`]: what a database implements (`apply`, `find_node`,
//!   `appointment_rows`).
//! - [`mapping`]: resource to mutation translation.
//! - [`fold`]: row-fold reconstruction of linked appointments.
//! - [`GraphStore`]: the [`appointment_storage::AppointmentStore`] built on
//!   any backend.
//!
//! ```text
//! (Appointment)-[:SUBJECT]->(Patient)
//! (Appointment)-[:ACTOR]->(Doctor)
//! (Appointment)-[:FEEDBACK]->(Feedback)
//! (Diagnosis)-[:APPOINTMENT]->(Appointment)
//! ```

mod backend;
mod error;
pub mod fold;
pub mod mapping;
pub mod model;
mod store;

pub use backend::GraphBackend;
pub use error::{GraphError, GraphResult};
pub use fold::{AppointmentFold, FoldError};
pub use model::{
    GraphMutation, GraphNode, GraphOp, GraphRow, NodeLabel, NodeRef, Properties, PropertyValue,
    RelationshipType, RowScope, keys,
};
pub use store::GraphStore;
