//! Row-fold reconstruction of appointments.
//!
//! A read returns one row per relationship touching an appointment. The fold
//! merges those rows into fully linked [`Appointment`] values. The result does
//! not depend on row order, with one exception: when several diagnoses point
//! at the same appointment the last one processed wins.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use appointment_core::{Appointment, Diagnosis, Reference, ResourceType};

use crate::mapping::require_id;
use crate::model::{GraphNode, GraphRow, NodeLabel, RelationshipType, keys};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    #[error("malformed graph row{}: {reason}", appointment_suffix(.appointment_id))]
    MalformedRow {
        appointment_id: Option<String>,
        reason: String,
    },

    #[error(
        "appointment {appointment_id} has conflicting {relationship} relationships: {existing} and {found}"
    )]
    ConflictingRelationship {
        appointment_id: String,
        relationship: RelationshipType,
        existing: String,
        found: String,
    },

    #[error("appointment {appointment_id} has no {missing} relationship")]
    IncompleteAppointment {
        appointment_id: String,
        missing: RelationshipType,
    },
}

fn appointment_suffix(id: &Option<String>) -> String {
    id.as_deref()
        .map(|id| format!(" for appointment {id}"))
        .unwrap_or_default()
}

impl FoldError {
    pub fn malformed(appointment_id: Option<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            appointment_id,
            reason: reason.into(),
        }
    }
}

/// True for an Appointment node that only exists because something referenced
/// it. Such nodes are not reported as appointments.
pub(crate) fn is_stub_appointment(node: &GraphNode) -> bool {
    node.property(keys::STATUS).is_none() && node.property(keys::TYPE).is_none()
}

/// Appointment fields as they are discovered row by row.
#[derive(Debug)]
struct PartialAppointment {
    id: String,
    /// `None` for a stub node created from a diagnosis reference.
    base: Option<(String, String)>,
    subject: Option<Reference>,
    actor: Option<Reference>,
    feedback: Option<Reference>,
    diagnosis: Option<Diagnosis>,
}

impl PartialAppointment {
    fn from_node(id: &str, node: &GraphNode) -> Result<Self, FoldError> {
        let status = node.property_str(keys::STATUS);
        let description = node.property_str(keys::TYPE);
        let base = match (status, description) {
            (Some(status), Some(description)) => {
                Some((status.to_string(), description.to_string()))
            }
            (None, None) => None,
            (None, Some(_)) => {
                return Err(FoldError::malformed(
                    Some(id.to_string()),
                    "appointment node has no status",
                ));
            }
            (Some(_), None) => {
                return Err(FoldError::malformed(
                    Some(id.to_string()),
                    "appointment node has no type",
                ));
            }
        };

        Ok(Self {
            id: id.to_string(),
            base,
            subject: None,
            actor: None,
            feedback: None,
            diagnosis: None,
        })
    }

    /// Sets a single-valued link. Seeing the same target again is benign.
    fn link(
        slot: &mut Option<Reference>,
        appointment_id: &str,
        rel: RelationshipType,
        target: Reference,
    ) -> Result<(), FoldError> {
        match slot {
            Some(existing) if *existing != target => Err(FoldError::ConflictingRelationship {
                appointment_id: appointment_id.to_string(),
                relationship: rel,
                existing: existing.to_string(),
                found: target.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                *slot = Some(target);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<Option<Appointment>, FoldError> {
        let Some((status, description)) = self.base else {
            return Ok(None);
        };
        let subject = self.subject.ok_or_else(|| FoldError::IncompleteAppointment {
            appointment_id: self.id.clone(),
            missing: RelationshipType::Subject,
        })?;
        let actor = self.actor.ok_or_else(|| FoldError::IncompleteAppointment {
            appointment_id: self.id.clone(),
            missing: RelationshipType::Actor,
        })?;

        Ok(Some(Appointment {
            id: self.id,
            status,
            description,
            subject,
            actor,
            feedback: self.feedback,
            diagnosis: self.diagnosis,
        }))
    }
}

/// Accumulates graph rows into appointments keyed by ID.
#[derive(Debug, Default)]
pub struct AppointmentFold {
    records: IndexMap<String, PartialAppointment>,
}

impl AppointmentFold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a complete row set.
    pub fn fold<'a>(rows: impl IntoIterator<Item = &'a GraphRow>) -> Result<Vec<Appointment>, FoldError> {
        let mut fold = Self::new();
        for row in rows {
            fold.push(row)?;
        }
        fold.finish()
    }

    pub fn push(&mut self, row: &GraphRow) -> Result<(), FoldError> {
        let appointment_id = row
            .appointment
            .id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FoldError::malformed(None, "appointment node has no id"))?;

        if !self.records.contains_key(appointment_id) {
            let record = PartialAppointment::from_node(appointment_id, &row.appointment)?;
            self.records.insert(appointment_id.to_string(), record);
        }
        let Some(record) = self.records.get_mut(appointment_id) else {
            return Ok(());
        };

        let Some(rel) = RelationshipType::parse(&row.relationship) else {
            return Ok(());
        };
        let expected = rel.neighbor_label();
        if !row.neighbor.has_label(expected) {
            return Err(FoldError::malformed(
                Some(record.id.clone()),
                format!("{rel} neighbor is not a {expected} node"),
            ));
        }
        let neighbor_id = require_id(&row.neighbor, expected)
            .map_err(|_| FoldError::malformed(Some(record.id.clone()), format!("{rel} neighbor has no id")))?;

        match rel {
            RelationshipType::Subject => PartialAppointment::link(
                &mut record.subject,
                appointment_id,
                rel,
                Reference::new(ResourceType::Patient, neighbor_id),
            ),
            RelationshipType::Actor => PartialAppointment::link(
                &mut record.actor,
                appointment_id,
                rel,
                Reference::new(ResourceType::Doctor, neighbor_id),
            ),
            RelationshipType::Feedback => PartialAppointment::link(
                &mut record.feedback,
                appointment_id,
                rel,
                Reference::new(ResourceType::Feedback, neighbor_id),
            ),
            RelationshipType::Appointment => {
                let diagnosis = diagnosis_from_node(appointment_id, neighbor_id, &row.neighbor)?;
                if let Some(previous) = record.diagnosis.replace(diagnosis) {
                    if previous.id != neighbor_id {
                        warn!(
                            appointment_id = %appointment_id,
                            replaced = %previous.id,
                            kept = %neighbor_id,
                            "appointment has more than one diagnosis, keeping the last"
                        );
                    }
                }
                Ok(())
            }
        }
    }

    /// Finished appointments ordered by ID. Stub appointments that were never
    /// written in full are left out.
    pub fn finish(mut self) -> Result<Vec<Appointment>, FoldError> {
        self.records.sort_keys();
        let mut appointments = Vec::with_capacity(self.records.len());
        for (_, record) in self.records {
            if let Some(appointment) = record.finish()? {
                appointments.push(appointment);
            }
        }
        Ok(appointments)
    }
}

fn diagnosis_from_node(
    appointment_id: &str,
    diagnosis_id: &str,
    node: &GraphNode,
) -> Result<Diagnosis, FoldError> {
    let field = |key: &str| {
        node.property_str(key).map(str::to_string).ok_or_else(|| {
            FoldError::malformed(
                Some(appointment_id.to_string()),
                format!("diagnosis {diagnosis_id} has no {key}"),
            )
        })
    };

    Ok(Diagnosis {
        id: diagnosis_id.to_string(),
        status: field(keys::STATUS)?,
        name: field(keys::NAME)?,
        appointment: Reference::new(ResourceType::Appointment, appointment_id),
    })
}

/// Convenience for callers that only need one appointment.
pub fn fold_single(rows: &[GraphRow], id: &str) -> Result<Option<Appointment>, FoldError> {
    Ok(AppointmentFold::fold(rows)?
        .into_iter()
        .find(|appointment| appointment.id == id))
}
