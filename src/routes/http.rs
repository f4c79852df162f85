//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and log include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::TutorError;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_exercises(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::list_exercises(&state))
}

#[instrument(level = "info", skip(state, body), fields(%body.exercise_id))]
pub async fn http_open_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<OpenSessionIn>,
) -> Result<Json<SessionOut>, TutorError> {
  let out = logic::open_session(&state, &body.exercise_id).await?;
  info!(target: "grading", exercise_id = %body.exercise_id, session_id = %out.session_id, "HTTP session opened");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionOut>, TutorError> {
  Ok(Json(logic::session_snapshot(&state, &session_id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_close_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<StatusCode, TutorError> {
  logic::close_session(&state, &session_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body), fields(source_len = body.source.len()))]
pub async fn http_put_source(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
  Json(body): Json<SourceIn>,
) -> Result<Json<SessionOut>, TutorError> {
  Ok(Json(logic::edit_source(&state, &session_id, body.source).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_run_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionOut>, TutorError> {
  let out = logic::run_session(&state, &session_id).await?;
  info!(target: "grading", %session_id, state = ?out.snapshot.state, "HTTP run evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionOut>, TutorError> {
  Ok(Json(logic::reset_session(&state, &session_id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_next_hint(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionOut>, TutorError> {
  Ok(Json(logic::next_hint(&state, &session_id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::progress(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_complete_lesson(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<String>,
) -> impl IntoResponse {
  Json(logic::complete_lesson(&state, &lesson_id))
}

#[instrument(level = "info", skip(state))]
pub async fn http_put_current_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CurrentLessonIn>,
) -> impl IntoResponse {
  Json(logic::set_current_lesson(&state, &body.chapter_id, &body.lesson_id))
}

#[instrument(level = "info", skip(state, body), fields(source_len = body.source.len()))]
pub async fn http_post_execute(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExecuteIn>,
) -> impl IntoResponse {
  Json(logic::execute_source(&state, &body.source).await)
}
