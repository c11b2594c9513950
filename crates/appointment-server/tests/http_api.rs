use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use appointment_config::AppConfig;
use appointment_db_memory::create_dyn_store;
use appointment_server::{AppState, build_app};
use appointment_storage::IngestOptions;

const PATIENT_ID: &str = "6739ec3e-93bd-11eb-a8b3-0242ac130003";
const DOCTOR_ID: &str = "9bf9e532-93bd-11eb-a8b3-0242ac130003";
const APPOINTMENT_ID: &str = "be142dc6-93bd-11eb-a8b3-0242ac130003";

fn bundle() -> Value {
    json!({
        "resourceType": "Bundle",
        "id": "0c3151bd-1cbf-4d64-b04d-cd9187a4c6e0",
        "entry": [
            {"resource": {
                "resourceType": "Patient",
                "id": PATIENT_ID,
                "name": [{"family": "Mahachi", "given": ["Tendai"]}]
            }},
            {"resource": {
                "resourceType": "Doctor",
                "id": DOCTOR_ID,
                "name": [{"family": "Careful", "given": ["Adam"]}]
            }},
            {"resource": {
                "resourceType": "Appointment",
                "id": APPOINTMENT_ID,
                "status": "finished",
                "type": [{"text": "Endocrinologist visit"}],
                "subject": {"reference": format!("Patient/{PATIENT_ID}")},
                "actor": {"reference": format!("Doctor/{DOCTOR_ID}")}
            }},
            {"resource": {
                "resourceType": "Diagnosis",
                "id": "541a72a8-df75-4484-ac89-ac4923f03b81",
                "status": "final",
                "code": {"coding": [{"name": "Diabetes without complications"}]},
                "appointment": {"reference": format!("Appointment/{APPOINTMENT_ID}")}
            }}
        ]
    })
}

fn app_with(ingest: IngestOptions) -> Router {
    build_app(AppState::new(create_dyn_store(), ingest), &AppConfig::default())
}

fn app() -> Router {
    app_with(IngestOptions::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_healthz_reports_backend() {
    let app = app();
    let (status, body) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_ingest_then_read_back() {
    let app = app();
    let (status, body) = send(&app, "POST", "/resources", Some(bundle())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 4);
    assert_eq!(
        body["written"][0]["reference"],
        format!("Patient/{PATIENT_ID}")
    );

    let (status, patient) = send(&app, "GET", &format!("/patients/{PATIENT_ID}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patient["name"][0]["family"], "Mahachi");

    let (status, doctor) = send(&app, "GET", &format!("/doctors/{DOCTOR_ID}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doctor["name"][0]["given"][0], "Adam");

    let (status, appointment) =
        send(&app, "GET", &format!("/appointments/{APPOINTMENT_ID}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(appointment["status"], "finished");
    assert_eq!(appointment["description"], "Endocrinologist visit");
    assert_eq!(
        appointment["diagnosis"]["code"]["coding"][0]["display"],
        "Diabetes without complications"
    );

    let (status, list) = send(
        &app,
        "GET",
        &format!("/patients/{PATIENT_ID}/appointments"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_unknown_entities_are_404() {
    let app = app();
    for uri in ["/patients/nope", "/doctors/nope", "/appointments/nope"] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "not_found");
    }

    let (status, body) = send(&app, "GET", "/patients/nope/appointments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_decode_errors_are_400() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/resources",
        Some(json!({"resourceType": "Observation", "id": "o-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("o-1"));

    let (status, _) = send(
        &app,
        "POST",
        "/resources",
        Some(json!({
            "resourceType": "Appointment",
            "id": "a-1",
            "status": "booked",
            "subject": {"reference": "Patient"},
            "actor": {"reference": "Doctor/d-1"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_bundle_is_413() {
    let app = app_with(IngestOptions::default().with_max_bundle_entries(2));
    let (status, body) = send(&app, "POST", "/resources", Some(bundle())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");

    let (status, _) = send(&app, "GET", &format!("/patients/{PATIENT_ID}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_flow() {
    let app = app();
    send(&app, "POST", "/resources", Some(bundle())).await;
    let uri = format!("/appointments/{APPOINTMENT_ID}/feedback");

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"recommend": 9, "explained": true, "feeling": "relieved"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["recommend"], 9);

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feeling"], "relieved");
    assert_eq!(body["explained"], true);

    let (_, appointment) =
        send(&app, "GET", &format!("/appointments/{APPOINTMENT_ID}"), None).await;
    assert!(appointment["feedback"]["reference"].is_string());
}

#[tokio::test]
async fn test_feedback_rejections() {
    let app = app();
    send(&app, "POST", "/resources", Some(bundle())).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/appointments/{APPOINTMENT_ID}/feedback"),
        Some(json!({"recommend": 11})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/appointments/{APPOINTMENT_ID}/feedback"),
        Some(json!({"explained": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/appointments/missing/feedback",
        Some(json!({"recommend": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
