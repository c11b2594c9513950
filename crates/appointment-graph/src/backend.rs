use async_trait::async_trait;

use crate::error::GraphError;
use crate::model::{GraphMutation, GraphNode, GraphRow, NodeLabel, RowScope};

/// What a property-graph database has to provide to back the store.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Applies every operation of the mutation in one transaction.
    ///
    /// # Errors
    ///
    /// On error nothing of the mutation is visible.
    async fn apply(&self, mutation: &GraphMutation) -> Result<(), GraphError>;

    /// Reads a node by label and `id` property.
    async fn find_node(&self, label: NodeLabel, id: &str) -> Result<Option<GraphNode>, GraphError>;

    /// One row per relationship touching each appointment in scope, in
    /// either direction. Row order is unspecified.
    async fn appointment_rows(&self, scope: &RowScope) -> Result<Vec<GraphRow>, GraphError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<B: GraphBackend + ?Sized> GraphBackend for std::sync::Arc<B> {
    async fn apply(&self, mutation: &GraphMutation) -> Result<(), GraphError> {
        (**self).apply(mutation).await
    }

    async fn find_node(&self, label: NodeLabel, id: &str) -> Result<Option<GraphNode>, GraphError> {
        (**self).find_node(label, id).await
    }

    async fn appointment_rows(&self, scope: &RowScope) -> Result<Vec<GraphRow>, GraphError> {
        (**self).appointment_rows(scope).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
