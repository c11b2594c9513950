use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use appointment_core::{Appointment, Doctor, Feedback, Patient, Reference, ResourceType};
use appointment_storage::{DynAppointmentStore, IngestOptions, ingest_slice};

use crate::error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DynAppointmentStore,
    pub ingest: IngestOptions,
}

impl AppState {
    pub fn new(store: DynAppointmentStore, ingest: IngestOptions) -> Self {
        Self { store, ingest }
    }
}

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    pub status: &'a str,
    pub backend: &'a str,
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            backend: state.store.backend_name(),
        }),
    )
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub count: usize,
    pub written: Vec<Reference>,
}

/// Ingests one JSON document: a bare resource or a bundle.
pub async fn ingest_resources(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let report = ingest_slice(&body, state.store.as_ref(), &state.ingest).await?;
    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            count: report.count(),
            written: report.written,
        }),
    ))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    state
        .store
        .get_patient(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Reference::new(ResourceType::Patient, id)))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    state
        .store
        .get_doctor(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Reference::new(ResourceType::Doctor, id)))
}

pub async fn get_patient_appointments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(state.store.get_patient_appointments(&id).await?))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    state
        .store
        .get_appointment(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Reference::new(ResourceType::Appointment, id)))
}

/// Stores feedback for an appointment, replacing any earlier submission.
///
/// The body is decoded here rather than through the `Json` extractor so
/// malformed bodies produce the same error shape as every other route.
pub async fn post_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    let feedback: Feedback = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid feedback body: {e}")))?;
    state.store.save_patient_feedback(&id, &feedback).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Feedback>, ApiError> {
    state
        .store
        .get_patient_feedback(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no feedback for Appointment/{id}")))
}
