//! Property-graph vocabulary shared by the mapping, the row fold and every
//! backend.

use std::collections::BTreeMap;
use std::fmt;

use appointment_core::ResourceType;

use crate::error::GraphError;

/// Node labels written by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Patient,
    Doctor,
    Appointment,
    Diagnosis,
    Feedback,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 5] = [
        NodeLabel::Patient,
        NodeLabel::Doctor,
        NodeLabel::Appointment,
        NodeLabel::Diagnosis,
        NodeLabel::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Patient => "Patient",
            NodeLabel::Doctor => "Doctor",
            NodeLabel::Appointment => "Appointment",
            NodeLabel::Diagnosis => "Diagnosis",
            NodeLabel::Feedback => "Feedback",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == value)
    }

    /// The resource kind stored under this label.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            NodeLabel::Patient => ResourceType::Patient,
            NodeLabel::Doctor => ResourceType::Doctor,
            NodeLabel::Appointment => ResourceType::Appointment,
            NodeLabel::Diagnosis => ResourceType::Diagnosis,
            NodeLabel::Feedback => ResourceType::Feedback,
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types. `SUBJECT`, `ACTOR` and `FEEDBACK` point away from an
/// appointment, `APPOINTMENT` points from a diagnosis to its appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    Subject,
    Actor,
    Feedback,
    Appointment,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 4] = [
        RelationshipType::Subject,
        RelationshipType::Actor,
        RelationshipType::Feedback,
        RelationshipType::Appointment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Subject => "SUBJECT",
            RelationshipType::Actor => "ACTOR",
            RelationshipType::Feedback => "FEEDBACK",
            RelationshipType::Appointment => "APPOINTMENT",
        }
    }

    /// Returns `None` for relationship types this model does not know.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rel| rel.as_str() == value)
    }

    /// Label of the node on the far side of an appointment.
    pub fn neighbor_label(&self) -> NodeLabel {
        match self {
            RelationshipType::Subject => NodeLabel::Patient,
            RelationshipType::Actor => NodeLabel::Doctor,
            RelationshipType::Feedback => NodeLabel::Feedback,
            RelationshipType::Appointment => NodeLabel::Diagnosis,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar node property. Setting `Null` removes the property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropertyValue::Null, Into::into)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// Property keys used on stored nodes.
pub mod keys {
    pub const ID: &str = "id";
    pub const GIVEN_NAME: &str = "givenName";
    pub const FAMILY_NAME: &str = "familyName";
    pub const STATUS: &str = "status";
    /// Appointment description.
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const RECOMMEND: &str = "recommend";
    pub const EXPLAINED: &str = "explained";
    pub const FEELING: &str = "feeling";
}

/// Identity of a node: label plus `id` property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub id: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, id: impl Into<String>) -> Self {
        Self {
            label,
            id: id.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.label, self.id)
    }
}

/// A node as returned by a backend read.
///
/// Labels and properties are kept raw so that reads can detect nodes that do
/// not match the model instead of silently defaulting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphNode {
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl GraphNode {
    pub fn new(label: NodeLabel, id: impl Into<String>) -> Self {
        let mut properties = Properties::new();
        properties.insert(keys::ID.to_string(), PropertyValue::String(id.into()));
        Self {
            labels: vec![label.as_str().to_string()],
            properties,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        let value = value.into();
        if value.is_null() {
            self.properties.remove(key);
        } else {
            self.properties.insert(key.to_string(), value);
        }
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.property_str(keys::ID)
    }

    pub fn has_label(&self, label: NodeLabel) -> bool {
        self.labels.iter().any(|l| l == label.as_str())
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(PropertyValue::as_str)
    }
}

/// One row of an appointment read: the appointment node, the type of one
/// relationship touching it and the node on the other end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRow {
    pub appointment: GraphNode,
    pub relationship: String,
    pub neighbor: GraphNode,
}

impl GraphRow {
    pub fn new(appointment: GraphNode, relationship: impl Into<String>, neighbor: GraphNode) -> Self {
        Self {
            appointment,
            relationship: relationship.into(),
            neighbor,
        }
    }
}

/// Which appointments a read covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowScope {
    /// A single appointment by ID.
    Appointment(String),
    /// Every appointment whose `SUBJECT` is the patient.
    PatientAppointments(String),
}

/// A single write primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOp {
    /// Create the node if absent, then set the given properties.
    MergeNode {
        node: NodeRef,
        properties: Properties,
    },
    /// Create the relationship if absent. Both endpoints must exist.
    MergeRelationship {
        from: NodeRef,
        rel: RelationshipType,
        to: NodeRef,
    },
    /// Delete every other outgoing `rel` edge of `from`, then merge.
    ReplaceRelationship {
        from: NodeRef,
        rel: RelationshipType,
        to: NodeRef,
    },
}

/// Ordered list of operations applied as one backend transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphMutation {
    ops: Vec<GraphOp>,
}

impl GraphMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_node(
        mut self,
        label: NodeLabel,
        id: impl Into<String>,
        properties: impl IntoIterator<Item = (&'static str, PropertyValue)>,
    ) -> Self {
        self.ops.push(GraphOp::MergeNode {
            node: NodeRef::new(label, id),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        });
        self
    }

    pub fn merge_relationship(mut self, from: NodeRef, rel: RelationshipType, to: NodeRef) -> Self {
        self.ops.push(GraphOp::MergeRelationship { from, rel, to });
        self
    }

    pub fn replace_relationship(
        mut self,
        from: NodeRef,
        rel: RelationshipType,
        to: NodeRef,
    ) -> Self {
        self.ops.push(GraphOp::ReplaceRelationship { from, rel, to });
        self
    }

    pub fn ops(&self) -> &[GraphOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Rejects operations that address a node with an empty ID.
    pub fn validate_identifiers(&self) -> Result<(), GraphError> {
        for op in &self.ops {
            let has_empty_id = match op {
                GraphOp::MergeNode { node, .. } => node.id.is_empty(),
                GraphOp::MergeRelationship { from, to, .. }
                | GraphOp::ReplaceRelationship { from, to, .. } => {
                    from.id.is_empty() || to.id.is_empty()
                }
            };
            if has_empty_id {
                return Err(GraphError::invalid_mutation("node id must not be empty"));
            }
        }
        Ok(())
    }
}
