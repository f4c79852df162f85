//! Grading workflow: one session per exercise instance.
//!
//! State machine:
//!   Idle -> Running -> {GradedCorrect, GradedIncorrect, GradedUnknown, Faulted}
//! Every terminal state goes back to Running on the next run request, and to Idle on reset.
//!
//! A run is split in two (`begin_run` / `finish_run`) so a caller holding the session
//! behind a lock can release it while the interpreter sleeps. Each run carries a
//! sequence number; a result for a superseded run (reset mid-flight) is dropped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::Exercise;
use crate::engine::EngineError;
use crate::progress::ProgressStore;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
  Idle,
  Running,
  GradedCorrect,
  GradedIncorrect,
  GradedUnknown,
  Faulted,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExecutionResult {
  pub output: String,
  /// `None` when the exercise has no expected output.
  pub success: Option<bool>,
  pub faulted: bool,
}

/// Handed out by `begin_run`; must be returned to `finish_run` with the engine result.
#[derive(Debug)]
pub struct RunTicket {
  seq: u64,
  source: String,
}

impl RunTicket {
  pub fn source(&self) -> &str {
    &self.source
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
  pub state: SessionState,
  /// True only for the run that first completed the exercise in this session.
  pub newly_completed: bool,
}

/// Read-only view for rendering.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
  pub exercise_id: String,
  pub source: String,
  pub output: String,
  pub success: Option<bool>,
  pub faulted: bool,
  pub state: SessionState,
  pub running: bool,
  pub hint_cursor: usize,
  pub hint: Option<String>,
  pub hint_count: usize,
  pub completed: bool,
  /// Only present after an incorrect (non-faulted) run, so the learner can compare.
  pub expected_output: Option<String>,
}

#[derive(Debug)]
pub struct GradingSession {
  exercise: Arc<Exercise>,
  source: String,
  result: Option<ExecutionResult>,
  state: SessionState,
  hint_cursor: usize,
  completed: bool,
  run_seq: u64,
}

impl GradingSession {
  /// `already_complete` comes from the Progress Store when the session opens.
  pub fn new(exercise: Arc<Exercise>, already_complete: bool) -> Self {
    Self {
      source: exercise.initial_code.clone(),
      exercise,
      result: None,
      state: SessionState::Idle,
      hint_cursor: 0,
      completed: already_complete,
      run_seq: 0,
    }
  }

  pub fn exercise(&self) -> &Exercise { &self.exercise }
  pub fn is_running(&self) -> bool { self.state == SessionState::Running }
  pub fn hint_cursor(&self) -> usize { self.hint_cursor }

  /// Replace the editable source (editor binding).
  pub fn edit_source(&mut self, text: impl Into<String>) {
    self.source = text.into();
  }

  /// Enter Running. Returns `None` while a run is already in flight.
  #[instrument(level = "debug", skip(self), fields(exercise_id = %self.exercise.id))]
  pub fn begin_run(&mut self) -> Option<RunTicket> {
    if self.is_running() {
      debug!(target: "grading", "Run ignored: already running");
      return None;
    }
    self.result = None;
    self.state = SessionState::Running;
    self.run_seq += 1;
    Some(RunTicket { seq: self.run_seq, source: self.source.clone() })
  }

  /// Apply an engine result. Returns `None` when the ticket is stale.
  #[instrument(level = "info", skip(self, ticket, engine_result, progress), fields(exercise_id = %self.exercise.id, seq = ticket.seq))]
  pub fn finish_run(
    &mut self,
    ticket: RunTicket,
    engine_result: Result<String, EngineError>,
    progress: &dyn ProgressStore,
  ) -> Option<RunOutcome> {
    if ticket.seq != self.run_seq || !self.is_running() {
      warn!(target: "grading", current = self.run_seq, "Discarding stale run result");
      return None;
    }

    let mut newly_completed = false;
    let (result, state) = match engine_result {
      Ok(output) => match self.exercise.graded_output() {
        Some(expected) => {
          let correct = output.trim() == expected.trim();
          let state = if correct { SessionState::GradedCorrect } else { SessionState::GradedIncorrect };
          (ExecutionResult { output, success: Some(correct), faulted: false }, state)
        }
        None => (ExecutionResult { output, success: None, faulted: false }, SessionState::GradedUnknown),
      },
      Err(e) => {
        info!(target: "grading", error = %e, "Execution fault");
        (ExecutionResult { output: format!("Error: {}", e), success: Some(false), faulted: true }, SessionState::Faulted)
      }
    };

    if state == SessionState::GradedCorrect && !self.completed {
      self.completed = true;
      progress.mark_exercise_complete(&self.exercise.id);
      newly_completed = true;
    }

    info!(target: "grading", ?state, newly_completed, output_len = result.output.len(), "Run graded");
    self.result = Some(result);
    self.state = state;
    Some(RunOutcome { state, newly_completed })
  }

  /// Restore the initial source and clear the last result.
  /// Hints and completion are kept; an in-flight run is superseded.
  #[instrument(level = "debug", skip(self), fields(exercise_id = %self.exercise.id))]
  pub fn reset_source(&mut self) {
    if self.is_running() {
      self.run_seq += 1;
    }
    self.source = self.exercise.initial_code.clone();
    self.result = None;
    self.state = SessionState::Idle;
  }

  /// Advance to the next hint, never past the last one. Returns the hint now shown.
  pub fn request_next_hint(&mut self) -> Option<&str> {
    let last = self.exercise.hints.len().checked_sub(1)?;
    self.hint_cursor = (self.hint_cursor + 1).min(last);
    self.current_hint()
  }

  pub fn current_hint(&self) -> Option<&str> {
    self.exercise.hints.get(self.hint_cursor).map(String::as_str)
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    let (output, success, faulted) = match &self.result {
      Some(r) => (r.output.clone(), r.success, r.faulted),
      None => (String::new(), None, false),
    };
    let expected_output = if self.state == SessionState::GradedIncorrect {
      self.exercise.graded_output().map(str::to_string)
    } else {
      None
    };
    SessionSnapshot {
      exercise_id: self.exercise.id.clone(),
      source: self.source.clone(),
      output,
      success,
      faulted,
      state: self.state,
      running: self.is_running(),
      hint_cursor: self.hint_cursor,
      hint: self.current_hint().map(str::to_string),
      hint_count: self.exercise.hints.len(),
      completed: self.completed,
      expected_output,
    }
  }
}

#[cfg(test)]
impl GradingSession {
  pub fn source(&self) -> &str { &self.source }
  pub fn state(&self) -> SessionState { self.state }
  pub fn result(&self) -> Option<&ExecutionResult> { self.result.as_ref() }
  pub fn is_completed(&self) -> bool { self.completed }

  /// Begin, execute and finish in one go, for a session with a single owner.
  pub async fn run(&mut self, interpreter: &crate::engine::MockInterpreter, progress: &dyn ProgressStore) -> Option<RunOutcome> {
    let ticket = self.begin_run()?;
    let engine_result = interpreter.execute(ticket.source()).await;
    self.finish_run(ticket, engine_result, progress)
  }
}
