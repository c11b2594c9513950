//! Resource to graph mutation mapping, and node to resource mapping for the
//! single-node reads.

use appointment_core::{
    Appointment, Diagnosis, Doctor, Feedback, HumanName, Patient, TypedResource,
};

use crate::fold::FoldError;
use crate::model::{
    GraphMutation, GraphNode, NodeLabel, NodeRef, PropertyValue, RelationshipType, keys,
};

fn person_properties(name: &[HumanName]) -> [(&'static str, PropertyValue); 2] {
    let primary = name.first();
    [
        (
            keys::GIVEN_NAME,
            primary.and_then(HumanName::first_given).into(),
        ),
        (
            keys::FAMILY_NAME,
            primary.and_then(|n| n.family.clone()).into(),
        ),
    ]
}

pub fn patient_mutation(patient: &Patient) -> GraphMutation {
    GraphMutation::new().merge_node(NodeLabel::Patient, &patient.id, person_properties(&patient.name))
}

pub fn doctor_mutation(doctor: &Doctor) -> GraphMutation {
    GraphMutation::new().merge_node(NodeLabel::Doctor, &doctor.id, person_properties(&doctor.name))
}

/// Appointment node plus stub subject/actor nodes and the two links.
///
/// An embedded diagnosis or feedback reference is not written here; those
/// are persisted through their own writes.
pub fn appointment_mutation(appointment: &Appointment) -> GraphMutation {
    let node = NodeRef::new(NodeLabel::Appointment, appointment.id());
    let patient = NodeRef::new(NodeLabel::Patient, &appointment.subject.resource_id);
    let doctor = NodeRef::new(NodeLabel::Doctor, &appointment.actor.resource_id);

    GraphMutation::new()
        .merge_node(
            NodeLabel::Appointment,
            appointment.id(),
            [
                (keys::STATUS, appointment.status.as_str().into()),
                (keys::TYPE, appointment.description.as_str().into()),
            ],
        )
        .merge_node(NodeLabel::Patient, &patient.id, [])
        .merge_node(NodeLabel::Doctor, &doctor.id, [])
        .replace_relationship(node.clone(), RelationshipType::Subject, patient)
        .replace_relationship(node, RelationshipType::Actor, doctor)
}

/// Fields of an appointment that [`appointment_mutation`] does not persist.
pub fn unwritten_links(appointment: &Appointment) -> Vec<&'static str> {
    let mut skipped = Vec::new();
    if appointment.diagnosis.is_some() {
        skipped.push("diagnosis");
    }
    if appointment.feedback.is_some() {
        skipped.push("feedback");
    }
    skipped
}

/// Diagnosis node, stub appointment node and the `APPOINTMENT` link.
pub fn diagnosis_mutation(diagnosis: &Diagnosis) -> GraphMutation {
    let appointment = NodeRef::new(NodeLabel::Appointment, &diagnosis.appointment.resource_id);

    GraphMutation::new()
        .merge_node(NodeLabel::Appointment, &appointment.id, [])
        .merge_node(
            NodeLabel::Diagnosis,
            diagnosis.id(),
            [
                (keys::STATUS, diagnosis.status.as_str().into()),
                (keys::NAME, diagnosis.name.as_str().into()),
            ],
        )
        .merge_relationship(
            NodeRef::new(NodeLabel::Diagnosis, diagnosis.id()),
            RelationshipType::Appointment,
            appointment,
        )
}

/// Feedback node keyed by the appointment ID, linked from the appointment.
pub fn feedback_mutation(appointment_id: &str, feedback: &Feedback) -> GraphMutation {
    GraphMutation::new()
        .merge_node(
            NodeLabel::Feedback,
            appointment_id,
            [
                (keys::RECOMMEND, i64::from(feedback.recommend).into()),
                (keys::EXPLAINED, feedback.explained.into()),
                (keys::FEELING, feedback.feeling.clone().into()),
            ],
        )
        .replace_relationship(
            NodeRef::new(NodeLabel::Appointment, appointment_id),
            RelationshipType::Feedback,
            NodeRef::new(NodeLabel::Feedback, appointment_id),
        )
}

pub(crate) fn require_id(node: &GraphNode, label: NodeLabel) -> Result<&str, FoldError> {
    node.id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FoldError::malformed(None, format!("{label} node has no id")))
}

/// A person node carries at most one name. A stub has none.
fn person_name(node: &GraphNode) -> Vec<HumanName> {
    let given = node.property_str(keys::GIVEN_NAME);
    let family = node.property_str(keys::FAMILY_NAME);
    if given.is_none() && family.is_none() {
        return Vec::new();
    }
    vec![HumanName {
        text: None,
        family: family.map(str::to_string),
        given: given.map(str::to_string).into_iter().collect(),
    }]
}

pub fn node_to_patient(node: &GraphNode) -> Result<Patient, FoldError> {
    Ok(Patient {
        id: require_id(node, NodeLabel::Patient)?.to_string(),
        name: person_name(node),
    })
}

pub fn node_to_doctor(node: &GraphNode) -> Result<Doctor, FoldError> {
    Ok(Doctor {
        id: require_id(node, NodeLabel::Doctor)?.to_string(),
        name: person_name(node),
    })
}

pub fn node_to_feedback(node: &GraphNode) -> Result<Feedback, FoldError> {
    let id = require_id(node, NodeLabel::Feedback)?;
    let recommend = node
        .property(keys::RECOMMEND)
        .and_then(PropertyValue::as_i64)
        .and_then(|r| u8::try_from(r).ok())
        .filter(|r| Feedback::RECOMMEND_RANGE.contains(r))
        .ok_or_else(|| {
            FoldError::malformed(Some(id.to_string()), "feedback has no valid recommend")
        })?;

    Ok(Feedback {
        recommend,
        explained: node.property(keys::EXPLAINED).and_then(PropertyValue::as_bool),
        feeling: node.property_str(keys::FEELING).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphOp;
    use appointment_core::{Reference, ResourceType};

    #[test]
    fn test_unwritten_links() {
        let mut appointment = Appointment::new("a-1", "finished", "Visit", "p-1", "d-1");
        assert!(unwritten_links(&appointment).is_empty());

        appointment.diagnosis = Some(Diagnosis::new("dx-1", "final", "Flu", "a-1"));
        appointment.feedback = Some(Reference::new(ResourceType::Feedback, "a-1"));
        assert_eq!(unwritten_links(&appointment), ["diagnosis", "feedback"]);
    }

    fn set_properties(mutation: &GraphMutation, index: usize) -> Vec<(String, PropertyValue)> {
        match &mutation.ops()[index] {
            GraphOp::MergeNode { properties, .. } => properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            other => panic!("expected merge node, got {other:?}"),
        }
    }

    #[test]
    fn test_patient_properties_from_first_name() {
        let patient = Patient::new("p-1")
            .with_name(HumanName {
                text: Some("Tendai Mahachi".into()),
                family: Some("Mahachi".into()),
                given: vec!["Tendai".into(), "T".into()],
            })
            .with_name(HumanName::new("Other", "Ignored"));

        let mutation = patient_mutation(&patient);
        assert_eq!(mutation.len(), 1);
        assert_eq!(
            set_properties(&mutation, 0),
            [
                ("familyName".to_string(), PropertyValue::from("Mahachi")),
                ("givenName".to_string(), PropertyValue::from("Tendai")),
            ]
        );
    }

    #[test]
    fn test_nameless_doctor_clears_name_properties() {
        let mutation = doctor_mutation(&Doctor::new("d-1"));
        assert!(
            set_properties(&mutation, 0)
                .iter()
                .all(|(_, v)| v.is_null())
        );
    }

    #[test]
    fn test_appointment_mutation_creates_stubs_and_links() {
        let appointment = Appointment::new("a-1", "finished", "Endocrinologist visit", "p-1", "d-1");
        let mutation = appointment_mutation(&appointment);
        let ops = mutation.ops();

        assert_eq!(ops.len(), 5);
        assert_eq!(
            set_properties(&mutation, 0),
            [
                ("status".to_string(), PropertyValue::from("finished")),
                ("type".to_string(), PropertyValue::from("Endocrinologist visit")),
            ]
        );
        assert!(set_properties(&mutation, 1).is_empty());
        assert!(set_properties(&mutation, 2).is_empty());
        assert_eq!(
            ops[3],
            GraphOp::ReplaceRelationship {
                from: NodeRef::new(NodeLabel::Appointment, "a-1"),
                rel: RelationshipType::Subject,
                to: NodeRef::new(NodeLabel::Patient, "p-1"),
            }
        );
        assert_eq!(
            ops[4],
            GraphOp::ReplaceRelationship {
                from: NodeRef::new(NodeLabel::Appointment, "a-1"),
                rel: RelationshipType::Actor,
                to: NodeRef::new(NodeLabel::Doctor, "d-1"),
            }
        );
    }

    #[test]
    fn test_diagnosis_mutation_links_to_appointment() {
        let diagnosis = Diagnosis::new("dx-1", "final", "Diabetes without complications", "a-1");
        let mutation = diagnosis_mutation(&diagnosis);
        assert_eq!(
            mutation.ops()[2],
            GraphOp::MergeRelationship {
                from: NodeRef::new(NodeLabel::Diagnosis, "dx-1"),
                rel: RelationshipType::Appointment,
                to: NodeRef::new(NodeLabel::Appointment, "a-1"),
            }
        );
    }

    #[test]
    fn test_stub_node_reads_back_without_name() {
        let node = GraphNode::new(NodeLabel::Patient, "p-1");
        let patient = node_to_patient(&node).unwrap();
        assert_eq!(patient, Patient::new("p-1"));

        let node = node
            .with_property(keys::GIVEN_NAME, "Tendai")
            .with_property(keys::FAMILY_NAME, "Mahachi");
        let patient = node_to_patient(&node).unwrap();
        assert_eq!(patient.primary_name(), Some(&HumanName::new("Mahachi", "Tendai")));
    }

    #[test]
    fn test_node_without_id_is_malformed() {
        let node = GraphNode::default();
        assert!(matches!(node_to_doctor(&node), Err(FoldError::MalformedRow { .. })));
    }

    #[test]
    fn test_feedback_node_mapping() {
        let node = GraphNode::new(NodeLabel::Feedback, "a-1")
            .with_property(keys::RECOMMEND, 9_i64)
            .with_property(keys::EXPLAINED, true);
        let feedback = node_to_feedback(&node).unwrap();
        assert_eq!(feedback, Feedback::new(9).with_explained(true));

        let node = GraphNode::new(NodeLabel::Feedback, "a-1").with_property(keys::RECOMMEND, 42_i64);
        assert!(node_to_feedback(&node).is_err());
    }
}
