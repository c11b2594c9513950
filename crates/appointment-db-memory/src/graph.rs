use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use appointment_graph::{
    GraphBackend, GraphError, GraphMutation, GraphNode, GraphOp, GraphRow, NodeLabel, NodeRef,
    Properties, PropertyValue, RelationshipType, RowScope, keys,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Edge {
    from: NodeRef,
    rel: RelationshipType,
    to: NodeRef,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: BTreeMap<NodeRef, Properties>,
    edges: BTreeSet<Edge>,
}

/// Undo record for one change made while applying a mutation.
#[derive(Debug)]
enum Change {
    Node(NodeRef, Option<Properties>),
    EdgeInserted(Edge),
    EdgeRemoved(Edge),
}

impl Edge {
    /// Smallest edge leaving `from` with type `rel`.
    fn lower_bound(from: &NodeRef, rel: RelationshipType) -> Self {
        Self {
            from: from.clone(),
            rel,
            to: NodeRef::new(NodeLabel::Patient, ""),
        }
    }
}

impl GraphState {
    /// Applies every op in place, or none of them.
    fn apply_all(&mut self, mutation: &GraphMutation) -> Result<(), GraphError> {
        let mut journal = Vec::new();
        for op in mutation.ops() {
            if let Err(err) = self.apply_op(op, &mut journal) {
                self.rollback(journal);
                return Err(err);
            }
        }
        Ok(())
    }

    fn rollback(&mut self, journal: Vec<Change>) {
        for change in journal.into_iter().rev() {
            match change {
                Change::Node(node, Some(properties)) => {
                    self.nodes.insert(node, properties);
                }
                Change::Node(node, None) => {
                    self.nodes.remove(&node);
                }
                Change::EdgeInserted(edge) => {
                    self.edges.remove(&edge);
                }
                Change::EdgeRemoved(edge) => {
                    self.edges.insert(edge);
                }
            }
        }
    }

    fn apply_op(&mut self, op: &GraphOp, journal: &mut Vec<Change>) -> Result<(), GraphError> {
        match op {
            GraphOp::MergeNode { node, properties } => {
                journal.push(Change::Node(node.clone(), self.nodes.get(node).cloned()));
                let stored = self.nodes.entry(node.clone()).or_insert_with(|| {
                    let mut props = Properties::new();
                    props.insert(keys::ID.to_string(), PropertyValue::String(node.id.clone()));
                    props
                });
                for (key, value) in properties {
                    if key == keys::ID {
                        continue;
                    }
                    if value.is_null() {
                        stored.remove(key);
                    } else {
                        stored.insert(key.clone(), value.clone());
                    }
                }
            }
            GraphOp::MergeRelationship { from, rel, to } => {
                self.require_endpoints(from, *rel, to)?;
                self.insert_edge(from, *rel, to, journal);
            }
            GraphOp::ReplaceRelationship { from, rel, to } => {
                self.require_endpoints(from, *rel, to)?;
                let stale: Vec<Edge> = self
                    .outgoing(from, *rel)
                    .filter(|edge| edge.to != *to)
                    .cloned()
                    .collect();
                for edge in stale {
                    self.edges.remove(&edge);
                    journal.push(Change::EdgeRemoved(edge));
                }
                self.insert_edge(from, *rel, to, journal);
            }
        }
        Ok(())
    }

    fn insert_edge(
        &mut self,
        from: &NodeRef,
        rel: RelationshipType,
        to: &NodeRef,
        journal: &mut Vec<Change>,
    ) {
        let edge = Edge {
            from: from.clone(),
            rel,
            to: to.clone(),
        };
        if self.edges.insert(edge.clone()) {
            journal.push(Change::EdgeInserted(edge));
        }
    }

    fn outgoing<'a>(
        &'a self,
        from: &'a NodeRef,
        rel: RelationshipType,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .range(Edge::lower_bound(from, rel)..)
            .take_while(move |edge| edge.from == *from && edge.rel == rel)
    }

    fn require_endpoints(
        &self,
        from: &NodeRef,
        rel: RelationshipType,
        to: &NodeRef,
    ) -> Result<(), GraphError> {
        for node in [from, to] {
            if !self.nodes.contains_key(node) {
                return Err(GraphError::MissingEndpoint {
                    rel,
                    node: node.clone(),
                });
            }
        }
        Ok(())
    }

    fn node(&self, node: &NodeRef) -> Option<GraphNode> {
        self.nodes.get(node).map(|properties| GraphNode {
            labels: vec![node.label.as_str().to_string()],
            properties: properties.clone(),
        })
    }

    fn rows_for(&self, appointment: &NodeRef, rows: &mut Vec<GraphRow>) {
        let Some(appointment_node) = self.node(appointment) else {
            return;
        };
        for edge in &self.edges {
            let other = if edge.from == *appointment {
                &edge.to
            } else if edge.to == *appointment {
                &edge.from
            } else {
                continue;
            };
            if let Some(neighbor) = self.node(other) {
                rows.push(GraphRow::new(
                    appointment_node.clone(),
                    edge.rel.as_str(),
                    neighbor,
                ));
            }
        }
    }
}

/// Property graph held in process memory.
///
/// A mutation is applied in place under the write lock and undone from its
/// change journal if any op fails, so a failed mutation leaves no trace.
/// Clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    state: Arc<RwLock<GraphState>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    /// Outgoing relationships of `from` with the given type.
    pub async fn outgoing(&self, from: &NodeRef, rel: RelationshipType) -> Vec<NodeRef> {
        self.state
            .read()
            .await
            .outgoing(from, rel)
            .map(|edge| edge.to.clone())
            .collect()
    }
}

#[async_trait]
impl GraphBackend for InMemoryGraph {
    async fn apply(&self, mutation: &GraphMutation) -> Result<(), GraphError> {
        mutation.validate_identifiers()?;

        self.state.write().await.apply_all(mutation)?;

        trace!(ops = mutation.len(), "applied mutation");
        Ok(())
    }

    async fn find_node(&self, label: NodeLabel, id: &str) -> Result<Option<GraphNode>, GraphError> {
        Ok(self.state.read().await.node(&NodeRef::new(label, id)))
    }

    async fn appointment_rows(&self, scope: &RowScope) -> Result<Vec<GraphRow>, GraphError> {
        let state = self.state.read().await;
        let mut rows = Vec::new();

        match scope {
            RowScope::Appointment(id) => {
                state.rows_for(&NodeRef::new(NodeLabel::Appointment, id.as_str()), &mut rows);
            }
            RowScope::PatientAppointments(patient_id) => {
                let patient = NodeRef::new(NodeLabel::Patient, patient_id.as_str());
                let appointments: Vec<_> = state
                    .edges
                    .iter()
                    .filter(|edge| {
                        edge.rel == RelationshipType::Subject
                            && edge.to == patient
                            && edge.from.label == NodeLabel::Appointment
                    })
                    .map(|edge| edge.from.clone())
                    .collect();
                for appointment in &appointments {
                    state.rows_for(appointment, &mut rows);
                }
            }
        }

        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
