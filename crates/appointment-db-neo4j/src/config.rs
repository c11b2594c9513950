//! Connection settings for the Neo4j backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection settings for the Neo4j backend.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Neo4jSettings {
    /// Bolt URI: `bolt://host:7687` or `neo4j://host:7687`
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name. `None` uses the server default.
    pub database: Option<String>,
    /// Records fetched per round trip.
    pub fetch_size: usize,
    /// Connection pool size.
    pub max_connections: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: String::new(),
            database: None,
            fetch_size: 200,
            max_connections: 16,
        }
    }
}

impl Neo4jSettings {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }
}

impl fmt::Debug for Neo4jSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jSettings")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("fetch_size", &self.fetch_size)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
