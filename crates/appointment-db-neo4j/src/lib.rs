//! Neo4j backend for the appointment store.
//!
//! Each [`appointment_graph::GraphOp`] becomes a parameterised `MERGE`
//! statement and a mutation runs inside one explicit transaction.
//!
//! # Example
//!
//! ```ignore
//! use appointment_db_neo4j::{Neo4jSettings, connect_store};
//!
//! let settings = Neo4jSettings::new("bolt://localhost:7687").with_credentials("neo4j", "secret");
//! let store = connect_store(&settings).await?;
//! ```

mod backend;
pub mod config;
pub mod cypher;

pub use backend::Neo4jGraph;
pub use config::Neo4jSettings;

use appointment_graph::{GraphError, GraphStore};

/// Appointment store backed by Neo4j.
pub type Neo4jStore = GraphStore<Neo4jGraph>;

/// Connects to Neo4j and wraps the connection in a store.
pub async fn connect_store(settings: &Neo4jSettings) -> Result<Neo4jStore, GraphError> {
    Ok(GraphStore::new(Neo4jGraph::connect(settings).await?))
}
