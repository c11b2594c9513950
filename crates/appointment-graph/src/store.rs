//! [`AppointmentStore`] on top of any [`GraphBackend`].

use async_trait::async_trait;
use tracing::{debug, instrument};

use appointment_core::{
    Appointment, Diagnosis, Doctor, Feedback, Patient, Reference, ResourceType, TypedResource,
};
use appointment_storage::{AppointmentStore, ResourceWriter, StorageError};

use crate::backend::GraphBackend;
use crate::error::GraphError;
use crate::fold::{AppointmentFold, FoldError, fold_single, is_stub_appointment};
use crate::mapping;
use crate::model::{GraphMutation, GraphNode, NodeLabel, RowScope};

/// Graph-backed appointment store.
///
/// Each call issues exactly one backend transaction. There is no caching,
/// retry or locking at this level.
#[derive(Debug, Clone)]
pub struct GraphStore<B> {
    backend: B,
}

impl<B: GraphBackend> GraphStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    async fn apply(
        &self,
        operation: &'static str,
        reference: Reference,
        mutation: GraphMutation,
    ) -> Result<(), StorageError> {
        debug!(operation, reference = %reference, ops = mutation.len(), "applying graph mutation");
        self.backend
            .apply(&mutation)
            .await
            .map_err(|e| StorageError::write_failed(operation, &reference, e))
    }

    async fn find(
        &self,
        operation: &'static str,
        label: NodeLabel,
        id: &str,
    ) -> Result<Option<GraphNode>, StorageError> {
        self.backend
            .find_node(label, id)
            .await
            .map_err(|e| read_error(operation, e))
    }
}

fn read_error(operation: &'static str, err: GraphError) -> StorageError {
    match err {
        GraphError::Fold(fold) => corrupt(fold),
        GraphError::Connection { message } => StorageError::connection(message),
        other => StorageError::read_failed(operation, other),
    }
}

fn corrupt(err: FoldError) -> StorageError {
    StorageError::corrupt(err)
}

#[async_trait]
impl<B: GraphBackend> ResourceWriter for GraphStore<B> {
    #[instrument(skip_all, fields(id = %patient.id))]
    async fn write_patient(&self, patient: &Patient) -> Result<(), StorageError> {
        self.apply("write_patient", patient.reference(), mapping::patient_mutation(patient))
            .await
    }

    #[instrument(skip_all, fields(id = %doctor.id))]
    async fn write_doctor(&self, doctor: &Doctor) -> Result<(), StorageError> {
        self.apply("write_doctor", doctor.reference(), mapping::doctor_mutation(doctor))
            .await
    }

    #[instrument(skip_all, fields(id = %appointment.id))]
    async fn write_appointment(&self, appointment: &Appointment) -> Result<(), StorageError> {
        let skipped = mapping::unwritten_links(appointment);
        if !skipped.is_empty() {
            debug!(?skipped, "embedded links are written through their own resources");
        }
        self.apply(
            "write_appointment",
            appointment.reference(),
            mapping::appointment_mutation(appointment),
        )
        .await
    }

    #[instrument(skip_all, fields(id = %diagnosis.id))]
    async fn write_diagnosis(&self, diagnosis: &Diagnosis) -> Result<(), StorageError> {
        self.apply(
            "write_diagnosis",
            diagnosis.reference(),
            mapping::diagnosis_mutation(diagnosis),
        )
        .await
    }
}

#[async_trait]
impl<B: GraphBackend> AppointmentStore for GraphStore<B> {
    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StorageError> {
        self.find("get_patient", NodeLabel::Patient, id)
            .await?
            .map(|node| mapping::node_to_patient(&node).map_err(corrupt))
            .transpose()
    }

    async fn get_doctor(&self, id: &str) -> Result<Option<Doctor>, StorageError> {
        self.find("get_doctor", NodeLabel::Doctor, id)
            .await?
            .map(|node| mapping::node_to_doctor(&node).map_err(corrupt))
            .transpose()
    }

    async fn get_patient_appointments(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, StorageError> {
        let rows = self
            .backend
            .appointment_rows(&RowScope::PatientAppointments(patient_id.to_string()))
            .await
            .map_err(|e| read_error("get_patient_appointments", e))?;
        debug!(patient_id, rows = rows.len(), "folding patient appointments");
        AppointmentFold::fold(&rows).map_err(corrupt)
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, StorageError> {
        let rows = self
            .backend
            .appointment_rows(&RowScope::Appointment(id.to_string()))
            .await
            .map_err(|e| read_error("get_appointment", e))?;
        fold_single(&rows, id).map_err(corrupt)
    }

    #[instrument(skip_all, fields(appointment_id = %appointment_id))]
    async fn save_patient_feedback(
        &self,
        appointment_id: &str,
        feedback: &Feedback,
    ) -> Result<(), StorageError> {
        feedback.validate()?;
        let node = self
            .find("save_patient_feedback", NodeLabel::Appointment, appointment_id)
            .await?;
        if node.as_ref().is_none_or(is_stub_appointment) {
            return Err(StorageError::not_found(ResourceType::Appointment, appointment_id));
        }

        self.apply(
            "save_patient_feedback",
            Reference::new(ResourceType::Feedback, appointment_id),
            mapping::feedback_mutation(appointment_id, feedback),
        )
        .await
    }

    async fn get_patient_feedback(
        &self,
        appointment_id: &str,
    ) -> Result<Option<Feedback>, StorageError> {
        self.find("get_patient_feedback", NodeLabel::Feedback, appointment_id)
            .await?
            .map(|node| mapping::node_to_feedback(&node).map_err(corrupt))
            .transpose()
    }

    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }
}
