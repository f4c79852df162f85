//! Service-level errors shared by HTTP and WebSocket handlers.
//!
//! Execution faults are not here: they become session display state in `grading`.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TutorError {
    #[error("Unknown exerciseId: {0}")]
    UnknownExercise(String),
    #[error("Unknown sessionId: {0}")]
    UnknownSession(String),
}

impl IntoResponse for TutorError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::NOT_FOUND, Json(body)).into_response()
    }
}
