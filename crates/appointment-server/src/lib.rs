//! HTTP API over the appointment store.
//!
//! Routes:
//!
//! - `POST /resources` ingests a resource or bundle
//! - `GET /patients/{id}`, `GET /doctors/{id}`
//! - `GET /patients/{id}/appointments`
//! - `GET /appointments/{id}`
//! - `GET|POST /appointments/{id}/feedback`
//! - `GET /healthz`

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use server::{AppointmentServer, ServerBuilder, build_app};
