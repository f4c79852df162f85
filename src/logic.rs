//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Listing exercises, opening and closing grading sessions
//!   - Editing, running, resetting a session and revealing hints
//!   - Raw execution without grading
//!   - Progress reporting, lesson completion and the current lesson
//!
//! Runs never hold the session lock across the interpreter latency: the session is
//! moved to Running under the lock, the engine runs unlocked, then the result is
//! applied under the lock again (stale results are dropped by the session).

use tracing::{debug, info, instrument};

use crate::error::TutorError;
use crate::grading::SessionSnapshot;
use crate::protocol::{to_out, ExecuteOut, ExerciseOut, ProgressOut, SessionOut};
use crate::state::AppState;

fn session_out(session_id: &str, snapshot: SessionSnapshot) -> SessionOut {
  SessionOut { session_id: session_id.to_string(), snapshot }
}

pub fn list_exercises(state: &AppState) -> Vec<ExerciseOut> {
  state.exercises().iter().map(|e| to_out(e)).collect()
}

#[instrument(level = "info", skip(state), fields(%exercise_id))]
pub async fn open_session(state: &AppState, exercise_id: &str) -> Result<SessionOut, TutorError> {
  let exercise = state
    .get_exercise(exercise_id)
    .ok_or_else(|| TutorError::UnknownExercise(exercise_id.to_string()))?;
  let session_id = state.insert_session(exercise).await;
  info!(target: "grading", %exercise_id, %session_id, "Session opened");
  session_snapshot(state, &session_id).await
}

#[instrument(level = "debug", skip(state), fields(%session_id))]
pub async fn session_snapshot(state: &AppState, session_id: &str) -> Result<SessionOut, TutorError> {
  let sessions = state.sessions.read().await;
  let s = sessions
    .get(session_id)
    .ok_or_else(|| TutorError::UnknownSession(session_id.to_string()))?;
  Ok(session_out(session_id, s.snapshot()))
}

/// Forget a session. A run still in flight for it finishes with `UnknownSession`.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn close_session(state: &AppState, session_id: &str) -> Result<(), TutorError> {
  if !state.remove_session(session_id).await {
    return Err(TutorError::UnknownSession(session_id.to_string()));
  }
  info!(target: "grading", %session_id, "Session closed");
  Ok(())
}

#[instrument(level = "info", skip(state, source), fields(%session_id, source_len = source.len()))]
pub async fn edit_source(state: &AppState, session_id: &str, source: String) -> Result<SessionOut, TutorError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| TutorError::UnknownSession(session_id.to_string()))?;
  s.edit_source(source);
  Ok(session_out(session_id, s.snapshot()))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn run_session(state: &AppState, session_id: &str) -> Result<SessionOut, TutorError> {
  let ticket = {
    let mut sessions = state.sessions.write().await;
    let s = sessions
      .get_mut(session_id)
      .ok_or_else(|| TutorError::UnknownSession(session_id.to_string()))?;
    match s.begin_run() {
      Some(t) => t,
      None => return Ok(session_out(session_id, s.snapshot())),
    }
  };

  let engine_result = state.interpreter.execute(ticket.source()).await;

  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| TutorError::UnknownSession(session_id.to_string()))?;
  match s.finish_run(ticket, engine_result, state.progress.as_ref()) {
    Some(outcome) if outcome.newly_completed => {
      info!(target: "grading", %session_id, exercise_id = %s.exercise().id, "Exercise completed for the first time");
    }
    Some(outcome) => debug!(target: "grading", %session_id, state = ?outcome.state, "Run finished"),
    None => debug!(target: "grading", %session_id, "Run result superseded"),
  }
  Ok(session_out(session_id, s.snapshot()))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn reset_session(state: &AppState, session_id: &str) -> Result<SessionOut, TutorError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| TutorError::UnknownSession(session_id.to_string()))?;
  s.reset_source();
  Ok(session_out(session_id, s.snapshot()))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn next_hint(state: &AppState, session_id: &str) -> Result<SessionOut, TutorError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| TutorError::UnknownSession(session_id.to_string()))?;
  s.request_next_hint();
  debug!(target: "grading", %session_id, cursor = s.hint_cursor(), "Hint revealed");
  Ok(session_out(session_id, s.snapshot()))
}

/// Run the engine on arbitrary source, without a session and without grading.
#[instrument(level = "info", skip(state, source), fields(source_len = source.len()))]
pub async fn execute_source(state: &AppState, source: &str) -> ExecuteOut {
  match state.interpreter.execute(source).await {
    Ok(output) => ExecuteOut { output: Some(output), error: None },
    Err(e) => ExecuteOut { output: None, error: Some(format!("Error: {}", e)) },
  }
}

pub fn progress(state: &AppState) -> ProgressOut {
  let progress = state.progress.snapshot();
  let total_exercises = state.order.len();
  let percentage = progress.percentage(total_exercises);
  let lesson_percentage = progress.lesson_percentage(state.total_lessons);
  ProgressOut { progress, total_exercises, percentage, total_lessons: state.total_lessons, lesson_percentage }
}

#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub fn complete_lesson(state: &AppState, lesson_id: &str) -> ProgressOut {
  if !state.progress.mark_lesson_complete(lesson_id) {
    debug!(target: "grading", %lesson_id, "Lesson already complete");
  }
  progress(state)
}

#[instrument(level = "info", skip(state), fields(%chapter_id, %lesson_id))]
pub fn set_current_lesson(state: &AppState, chapter_id: &str, lesson_id: &str) -> ProgressOut {
  state.progress.set_current_lesson(chapter_id, lesson_id);
  progress(state)
}
