use anyhow::{Result, bail};

use appointment_storage::AppointmentStore;

use crate::cli::OutputFormat;
use crate::output::{print_appointment, print_appointments, print_json, print_person};

pub async fn patient(store: &dyn AppointmentStore, id: &str, format: OutputFormat) -> Result<()> {
    let Some(patient) = store.get_patient(id).await? else {
        bail!("Patient/{id} not found");
    };
    match format {
        OutputFormat::Json => print_json(&patient),
        OutputFormat::Table => {
            print_person("Patient", &patient.id, patient.primary_name());
            Ok(())
        }
    }
}

pub async fn doctor(store: &dyn AppointmentStore, id: &str, format: OutputFormat) -> Result<()> {
    let Some(doctor) = store.get_doctor(id).await? else {
        bail!("Doctor/{id} not found");
    };
    match format {
        OutputFormat::Json => print_json(&doctor),
        OutputFormat::Table => {
            print_person("Doctor", &doctor.id, doctor.primary_name());
            Ok(())
        }
    }
}

pub async fn appointments(
    store: &dyn AppointmentStore,
    patient_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let appointments = store.get_patient_appointments(patient_id).await?;
    print_appointments(&appointments, format)
}

pub async fn appointment(store: &dyn AppointmentStore, id: &str, format: OutputFormat) -> Result<()> {
    let Some(appointment) = store.get_appointment(id).await? else {
        bail!("Appointment/{id} not found");
    };
    print_appointment(&appointment, format)
}
