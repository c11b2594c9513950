use thiserror::Error;

use crate::fold::FoldError;
use crate::model::{NodeRef, RelationshipType};

/// Errors raised by graph backends.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph backend connection failed: {message}")]
    Connection { message: String },

    #[error("graph query failed: {message}")]
    Query { message: String },

    #[error("relationship {rel} references missing node {node}")]
    MissingEndpoint {
        rel: RelationshipType,
        node: NodeRef,
    },

    #[error("invalid graph mutation: {message}")]
    InvalidMutation { message: String },

    #[error(transparent)]
    Fold(#[from] FoldError),
}

impl GraphError {
    pub fn connection(message: impl ToString) -> Self {
        Self::Connection {
            message: message.to_string(),
        }
    }

    pub fn query(message: impl ToString) -> Self {
        Self::Query {
            message: message.to_string(),
        }
    }

    pub fn invalid_mutation(message: impl Into<String>) -> Self {
        Self::InvalidMutation {
            message: message.into(),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
