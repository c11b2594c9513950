//! Writer and store traits.
//!
//! [`ResourceWriter`] is the capability the ingestion pipeline depends on.
//! [`AppointmentStore`] adds the read side used by the HTTP API and the CLI.

use async_trait::async_trait;

use appointment_core::{Appointment, Diagnosis, Doctor, Feedback, Patient, Resource};

use crate::error::StorageError;

/// Persists individual resources.
///
/// Every write is an idempotent upsert keyed by the resource ID.
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait ResourceWriter: Send + Sync {
    async fn write_patient(&self, patient: &Patient) -> Result<(), StorageError>;

    async fn write_doctor(&self, doctor: &Doctor) -> Result<(), StorageError>;

    /// Writes the appointment and links it to its subject and actor, creating
    /// stub nodes for either when they do not exist yet.
    async fn write_appointment(&self, appointment: &Appointment) -> Result<(), StorageError>;

    /// Writes the diagnosis and links it to its appointment, creating a stub
    /// appointment when needed.
    async fn write_diagnosis(&self, diagnosis: &Diagnosis) -> Result<(), StorageError>;

    /// Dispatches on the resource kind. Bundles are expanded in entry order
    /// and stop at the first failing entry.
    async fn write_resource(&self, resource: &Resource) -> Result<(), StorageError> {
        match resource {
            Resource::Patient(patient) => self.write_patient(patient).await,
            Resource::Doctor(doctor) => self.write_doctor(doctor).await,
            Resource::Appointment(appointment) => self.write_appointment(appointment).await,
            Resource::Diagnosis(diagnosis) => self.write_diagnosis(diagnosis).await,
            Resource::Bundle(bundle) => {
                for entry in &bundle.entries {
                    self.write_resource(entry).await?;
                }
                Ok(())
            }
        }
    }
}

/// Full store: writes plus reconstruction of linked resources.
///
/// Reads return `Ok(None)` (or an empty `Vec`) for absent data. Errors are
/// reserved for infrastructure failures and corrupt stored data.
#[async_trait]
pub trait AppointmentStore: ResourceWriter {
    /// Reads a patient. A stub patient created from a reference has no name.
    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StorageError>;

    async fn get_doctor(&self, id: &str) -> Result<Option<Doctor>, StorageError>;

    /// Returns every appointment whose subject is the patient, ordered by ID.
    async fn get_patient_appointments(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, StorageError>;

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, StorageError>;

    /// Stores feedback for an appointment, replacing any previous feedback.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidResource` if `recommend` is outside 1..=10.
    /// Returns `StorageError::NotFound` if the appointment does not exist.
    async fn save_patient_feedback(
        &self,
        appointment_id: &str,
        feedback: &Feedback,
    ) -> Result<(), StorageError>;

    async fn get_patient_feedback(
        &self,
        appointment_id: &str,
    ) -> Result<Option<Feedback>, StorageError>;

    /// Returns the name of the backing database for logging.
    fn backend_name(&self) -> &'static str;
}
