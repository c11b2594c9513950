use async_trait::async_trait;
use neo4rs::{BoltNull, BoltType, ConfigBuilder, Graph, Node, Query, Txn};
use tracing::{debug, info, warn};

use appointment_graph::{
    GraphBackend, GraphError, GraphMutation, GraphNode, GraphRow, NodeLabel, Properties,
    PropertyValue, RowScope,
};

use crate::config::Neo4jSettings;
use crate::cypher::{self, Statement};

/// Graph backend talking Bolt to a Neo4j server.
#[derive(Clone)]
pub struct Neo4jGraph {
    graph: Graph,
}

impl std::fmt::Debug for Neo4jGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jGraph").finish_non_exhaustive()
    }
}

impl Neo4jGraph {
    /// Opens a connection pool. Fails if the configuration is rejected or
    /// the server is unreachable.
    pub async fn connect(settings: &Neo4jSettings) -> Result<Self, GraphError> {
        let mut builder = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .fetch_size(settings.fetch_size)
            .max_connections(settings.max_connections);
        if let Some(database) = &settings.database {
            builder = builder.db(database.as_str());
        }

        let config = builder.build().map_err(GraphError::connection)?;
        let graph = Graph::connect(config).await.map_err(GraphError::connection)?;

        info!(uri = %settings.uri, "connected to neo4j");
        Ok(Self { graph })
    }

    async fn run_all(txn: &mut Txn, statements: Vec<Statement>) -> Result<(), GraphError> {
        for statement in statements {
            txn.run(to_query(&statement)).await.map_err(GraphError::query)?;
        }
        Ok(())
    }

    async fn fetch_nodes(&self, statement: Statement, column: &str) -> Result<Vec<Node>, GraphError> {
        let mut stream = self
            .graph
            .execute(to_query(&statement))
            .await
            .map_err(GraphError::query)?;

        let mut nodes = Vec::new();
        while let Some(row) = stream.next().await.map_err(GraphError::query)? {
            nodes.push(row.get::<Node>(column).map_err(GraphError::query)?);
        }
        Ok(nodes)
    }
}

fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::String(s) => BoltType::from(s.as_str()),
        PropertyValue::Integer(i) => BoltType::from(*i),
        PropertyValue::Boolean(b) => BoltType::from(*b),
        PropertyValue::Null => BoltType::Null(BoltNull),
    }
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(neo4rs::query(&statement.text), |query, (name, value)| {
            query.param(name, to_bolt(value))
        })
}

/// Converts a Bolt node. Properties that are not string, integer or boolean
/// are dropped.
fn to_graph_node(node: &Node) -> GraphNode {
    let mut properties = Properties::new();
    for key in node.keys() {
        let value = if let Ok(s) = node.get::<String>(key) {
            PropertyValue::String(s)
        } else if let Ok(i) = node.get::<i64>(key) {
            PropertyValue::Integer(i)
        } else if let Ok(b) = node.get::<bool>(key) {
            PropertyValue::Boolean(b)
        } else {
            continue;
        };
        properties.insert(key.to_string(), value);
    }

    GraphNode {
        labels: node.labels().into_iter().map(str::to_string).collect(),
        properties,
    }
}

#[async_trait]
impl GraphBackend for Neo4jGraph {
    async fn apply(&self, mutation: &GraphMutation) -> Result<(), GraphError> {
        let statements = cypher::mutation_statements(mutation)?;
        debug!(statements = statements.len(), "running mutation");

        let mut txn = self.graph.start_txn().await.map_err(GraphError::query)?;
        if let Err(err) = Self::run_all(&mut txn, statements).await {
            if let Err(rollback) = txn.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            return Err(err);
        }
        txn.commit().await.map_err(GraphError::query)
    }

    async fn find_node(&self, label: NodeLabel, id: &str) -> Result<Option<GraphNode>, GraphError> {
        let nodes = self.fetch_nodes(cypher::find_node(label, id), "n").await?;
        Ok(nodes.first().map(to_graph_node))
    }

    async fn appointment_rows(&self, scope: &RowScope) -> Result<Vec<GraphRow>, GraphError> {
        let mut stream = self
            .graph
            .execute(to_query(&cypher::appointment_rows(scope)))
            .await
            .map_err(GraphError::query)?;

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(GraphError::query)? {
            let appointment = row.get::<Node>("a").map_err(GraphError::query)?;
            let relationship = row.get::<String>("rel").map_err(GraphError::query)?;
            let neighbor = row.get::<Node>("n").map_err(GraphError::query)?;
            rows.push(GraphRow::new(
                to_graph_node(&appointment),
                relationship,
                to_graph_node(&neighbor),
            ));
        }
        debug!(?scope, rows = rows.len(), "fetched appointment rows");
        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "neo4j"
    }
}
