//! Cypher generation for graph operations and reads.
//!
//! Labels and relationship types come from closed enums and property keys are
//! checked to be plain identifiers, so they are interpolated into the
//! statement text. Every value travels as a parameter.

use appointment_graph::{
    GraphError, GraphMutation, GraphOp, NodeLabel, NodeRef, PropertyValue, RelationshipType,
    RowScope, keys,
};

/// A parameterised Cypher statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<(String, PropertyValue)>,
}

impl Statement {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    fn param(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn merge_node(node: &NodeRef, properties: &appointment_graph::Properties) -> Result<Statement, GraphError> {
    let mut text = format!("MERGE (n:{} {{id: $id}})", node.label);
    let mut statement = Statement::new(String::new()).param("id", node.id.as_str());

    let mut assignments = Vec::new();
    for (index, (key, value)) in properties
        .iter()
        .filter(|(key, _)| key.as_str() != keys::ID)
        .enumerate()
    {
        if !is_identifier(key) {
            return Err(GraphError::invalid_mutation(format!(
                "property key {key:?} is not an identifier"
            )));
        }
        assignments.push(format!("n.{key} = $p{index}"));
        statement = statement.param(format!("p{index}"), value.clone());
    }
    if !assignments.is_empty() {
        text.push_str(" SET ");
        text.push_str(&assignments.join(", "));
    }

    statement.text = text;
    Ok(statement)
}

fn merge_relationship(from: &NodeRef, rel: RelationshipType, to: &NodeRef) -> Statement {
    Statement::new(format!(
        "MATCH (a:{} {{id: $from_id}}) MATCH (b:{} {{id: $to_id}}) MERGE (a)-[:{rel}]->(b)",
        from.label, to.label
    ))
    .param("from_id", from.id.as_str())
    .param("to_id", to.id.as_str())
}

fn delete_other_relationships(from: &NodeRef, rel: RelationshipType, to: &NodeRef) -> Statement {
    Statement::new(format!(
        "MATCH (a:{} {{id: $from_id}})-[old:{rel}]->(b) WHERE NOT (b:{} AND b.id = $to_id) DELETE old",
        from.label, to.label
    ))
    .param("from_id", from.id.as_str())
    .param("to_id", to.id.as_str())
}

/// Statements for one operation, in execution order.
pub fn op_statements(op: &GraphOp) -> Result<Vec<Statement>, GraphError> {
    Ok(match op {
        GraphOp::MergeNode { node, properties } => vec![merge_node(node, properties)?],
        GraphOp::MergeRelationship { from, rel, to } => vec![merge_relationship(from, *rel, to)],
        GraphOp::ReplaceRelationship { from, rel, to } => vec![
            delete_other_relationships(from, *rel, to),
            merge_relationship(from, *rel, to),
        ],
    })
}

/// Statements for a whole mutation, run in one transaction.
pub fn mutation_statements(mutation: &GraphMutation) -> Result<Vec<Statement>, GraphError> {
    mutation.validate_identifiers()?;
    let mut statements = Vec::with_capacity(mutation.len());
    for op in mutation.ops() {
        statements.extend(op_statements(op)?);
    }
    Ok(statements)
}

pub fn find_node(label: NodeLabel, id: &str) -> Statement {
    Statement::new(format!("MATCH (n:{label} {{id: $id}}) RETURN n LIMIT 1")).param("id", id)
}

/// Row read returning columns `a` (appointment), `rel` (type name) and `n`.
pub fn appointment_rows(scope: &RowScope) -> Statement {
    match scope {
        RowScope::Appointment(id) => Statement::new(
            "MATCH (a:Appointment {id: $id})-[r]-(n) RETURN a, type(r) AS rel, n",
        )
        .param("id", id.as_str()),
        RowScope::PatientAppointments(patient_id) => Statement::new(
            "MATCH (:Patient {id: $id})<-[:SUBJECT]-(a:Appointment) \
             MATCH (a)-[r]-(n) RETURN a, type(r) AS rel, n",
        )
        .param("id", patient_id.as_str()),
    }
}
