//! End-to-end store behaviour on the in-memory graph.

use appointment_core::{Appointment, Diagnosis, Doctor, Feedback, HumanName, Patient, ResourceType};
use appointment_db_memory::{InMemoryGraph, create_memory_store};
use appointment_graph::{GraphBackend, GraphMutation, GraphStore, NodeLabel, keys};
use appointment_storage::{
    AppointmentStore, IngestError, IngestOptions, ResourceWriter, StorageError, ingest_slice,
};

const BUNDLE: &str = r#"{
    "resourceType": "Bundle",
    "id": "0c3151bd-1cbf-4d64-b04d-cd9187a4c6e0",
    "entry": [
        {"resource": {
            "resourceType": "Patient",
            "id": "6739ec3e-93bd-11eb-a8b3-0242ac130003",
            "name": [{"text": "Tendai Mahachi", "family": "Mahachi", "given": ["Tendai"]}]
        }},
        {"resource": {
            "resourceType": "Doctor",
            "id": "9bf9e532-93bd-11eb-a8b3-0242ac130003",
            "name": [{"family": "Careful", "given": ["Adam"]}]
        }},
        {"resource": {
            "resourceType": "Appointment",
            "id": "be142dc6-93bd-11eb-a8b3-0242ac130003",
            "status": "finished",
            "type": [{"text": "Endocrinologist visit"}],
            "subject": {"reference": "Patient/6739ec3e-93bd-11eb-a8b3-0242ac130003"},
            "actor": {"reference": "Doctor/9bf9e532-93bd-11eb-a8b3-0242ac130003"},
            "period": {"start": "2021-04-02T11:30:00Z", "end": "2021-04-02T12:00:00Z"}
        }},
        {"resource": {
            "resourceType": "Diagnosis",
            "id": "541a72a8-df75-4484-ac89-ac4923f03b81",
            "status": "final",
            "code": {"coding": [{
                "system": "http://hl7.org/fhir/sid/icd-10",
                "code": "E10-E14.9",
                "name": "Diabetes without complications"
            }]},
            "appointment": {"reference": "Appointment/be142dc6-93bd-11eb-a8b3-0242ac130003"}
        }}
    ]
}"#;

const PATIENT_ID: &str = "6739ec3e-93bd-11eb-a8b3-0242ac130003";
const APPOINTMENT_ID: &str = "be142dc6-93bd-11eb-a8b3-0242ac130003";

#[tokio::test]
async fn test_bundle_ingest_reassembles_appointment() {
    let store = create_memory_store();
    let report = ingest_slice(BUNDLE.as_bytes(), &store, &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.count(), 4);

    let patient = store.get_patient(PATIENT_ID).await.unwrap().unwrap();
    let name = patient.primary_name().unwrap();
    assert_eq!(name.family.as_deref(), Some("Mahachi"));
    assert_eq!(name.first_given(), Some("Tendai"));

    let doctor = store
        .get_doctor("9bf9e532-93bd-11eb-a8b3-0242ac130003")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doctor.primary_name(), Some(&HumanName::new("Careful", "Adam")));

    let appointment = store.get_appointment(APPOINTMENT_ID).await.unwrap().unwrap();
    assert_eq!(appointment.status, "finished");
    assert_eq!(appointment.description, "Endocrinologist visit");
    assert_eq!(appointment.subject.resource_id, PATIENT_ID);
    assert!(!appointment.has_feedback());
    let diagnosis = appointment.diagnosis.unwrap();
    assert_eq!(diagnosis.name, "Diabetes without complications");
    assert_eq!(diagnosis.status, "final");

    let appointments = store.get_patient_appointments(PATIENT_ID).await.unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].id, APPOINTMENT_ID);
}

#[tokio::test]
async fn test_appointment_creates_stub_patient_and_doctor() {
    let store = create_memory_store();
    store
        .write_appointment(&Appointment::new("a-1", "booked", "Checkup", "p-new", "d-new"))
        .await
        .unwrap();

    let patient = store.get_patient("p-new").await.unwrap().unwrap();
    assert_eq!(patient.id, "p-new");
    assert!(patient.name.is_empty());
    assert!(store.get_doctor("d-new").await.unwrap().is_some());

    // Enriching the stub later keeps the link.
    store
        .write_patient(&Patient::new("p-new").with_name(HumanName::new("Mahachi", "Tendai")))
        .await
        .unwrap();
    let appointments = store.get_patient_appointments("p-new").await.unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(
        store.get_patient("p-new").await.unwrap().unwrap().name.len(),
        1
    );
}

#[tokio::test]
async fn test_absent_reads() {
    let store = create_memory_store();
    assert!(store.get_appointment("missing").await.unwrap().is_none());
    assert!(store.get_patient("missing").await.unwrap().is_none());
    assert!(store.get_doctor("missing").await.unwrap().is_none());
    assert!(store.get_patient_feedback("missing").await.unwrap().is_none());
    assert!(store.get_patient_appointments("missing").await.unwrap().is_empty());

    store.write_patient(&Patient::new("lonely")).await.unwrap();
    assert!(store.get_patient_appointments("lonely").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_patient_appointments_are_ordered_by_id() {
    let store = create_memory_store();
    for id in ["c", "a", "b"] {
        store
            .write_appointment(&Appointment::new(id, "booked", "Visit", "p-1", "d-1"))
            .await
            .unwrap();
    }
    store
        .write_appointment(&Appointment::new("other", "booked", "Visit", "p-2", "d-1"))
        .await
        .unwrap();

    let ids: Vec<_> = store
        .get_patient_appointments("p-1")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_rewriting_appointment_moves_subject() {
    let store = create_memory_store();
    store
        .write_appointment(&Appointment::new("a-1", "booked", "Visit", "p-1", "d-1"))
        .await
        .unwrap();
    store
        .write_appointment(&Appointment::new("a-1", "finished", "Visit", "p-2", "d-1"))
        .await
        .unwrap();

    assert!(store.get_patient_appointments("p-1").await.unwrap().is_empty());
    let moved = store.get_appointment("a-1").await.unwrap().unwrap();
    assert_eq!(moved.subject.resource_id, "p-2");
    assert_eq!(moved.status, "finished");
}

#[tokio::test]
async fn test_diagnosis_before_appointment() {
    let store = create_memory_store();
    store
        .write_diagnosis(&Diagnosis::new("dx-1", "final", "Flu", "a-1"))
        .await
        .unwrap();
    // Only a stub appointment exists so far.
    assert!(store.get_appointment("a-1").await.unwrap().is_none());

    store
        .write_appointment(&Appointment::new("a-1", "finished", "Visit", "p-1", "d-1"))
        .await
        .unwrap();
    let appointment = store.get_appointment("a-1").await.unwrap().unwrap();
    assert_eq!(appointment.diagnosis.unwrap().id, "dx-1");
}

#[tokio::test]
async fn test_feedback_rejected_for_stub_appointment() {
    let store = create_memory_store();
    store
        .write_diagnosis(&Diagnosis::new("dx-1", "final", "Flu", "a-ghost"))
        .await
        .unwrap();
    assert!(store.get_appointment("a-ghost").await.unwrap().is_none());

    let err = store
        .save_patient_feedback("a-ghost", &Feedback::new(5))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert!(store.get_patient_feedback("a-ghost").await.unwrap().is_none());

    store
        .write_appointment(&Appointment::new("a-ghost", "finished", "Visit", "p-1", "d-1"))
        .await
        .unwrap();
    store
        .save_patient_feedback("a-ghost", &Feedback::new(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_feedback_round_trip() {
    let store = create_memory_store();
    store
        .write_appointment(&Appointment::new("a-1", "finished", "Visit", "p-1", "d-1"))
        .await
        .unwrap();

    let feedback = Feedback::new(9)
        .with_explained(true)
        .with_feeling("Relieved");
    store.save_patient_feedback("a-1", &feedback).await.unwrap();

    assert_eq!(store.get_patient_feedback("a-1").await.unwrap(), Some(feedback));
    let appointment = store.get_appointment("a-1").await.unwrap().unwrap();
    assert_eq!(appointment.feedback.unwrap().to_string(), "Feedback/a-1");

    // Resubmission replaces, and clears fields that are no longer set.
    store
        .save_patient_feedback("a-1", &Feedback::new(4))
        .await
        .unwrap();
    assert_eq!(
        store.get_patient_feedback("a-1").await.unwrap(),
        Some(Feedback::new(4))
    );
}

#[tokio::test]
async fn test_feedback_validation_and_missing_appointment() {
    let store = create_memory_store();
    let err = store
        .save_patient_feedback("nope", &Feedback::new(5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::NotFound {
            resource_type: ResourceType::Appointment,
            ..
        }
    ));

    store
        .write_appointment(&Appointment::new("a-1", "finished", "Visit", "p-1", "d-1"))
        .await
        .unwrap();
    let err = store
        .save_patient_feedback("a-1", &Feedback::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidResource { .. }));
    assert!(store.get_patient_feedback("a-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_graph_is_reported() {
    let graph = InMemoryGraph::new();
    let store = GraphStore::new(graph.clone());
    store
        .write_appointment(&Appointment::new("a-1", "finished", "Visit", "p-1", "d-1"))
        .await
        .unwrap();

    graph
        .apply(&GraphMutation::new().merge_node(
            NodeLabel::Appointment,
            "a-1",
            [(keys::STATUS, None::<String>.into())],
        ))
        .await
        .unwrap();

    let err = store.get_appointment("a-1").await.unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
}

#[tokio::test]
async fn test_dyn_store_ingest_and_failed_write() {
    let store = appointment_db_memory::create_dyn_store();
    assert_eq!(store.backend_name(), "memory");

    let body = br#"{"resourceType": "Bundle", "entry": [
        {"resource": {"resourceType": "Doctor", "id": "d-1"}},
        {"resource": {"resourceType": "Doctor", "id": "d-2"}}
    ]}"#;
    let err = ingest_slice(body, store.as_ref(), &IngestOptions::default().with_max_bundle_entries(1))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::BundleTooLarge { count: 2, limit: 1 }));
    assert!(store.get_doctor("d-1").await.unwrap().is_none());

    ingest_slice(body, store.as_ref(), &IngestOptions::default())
        .await
        .unwrap();
    assert!(store.get_doctor("d-2").await.unwrap().is_some());
    assert_eq!(Doctor::new("d-2"), store.get_doctor("d-2").await.unwrap().unwrap());
}
