//! Domain models used by the backend: exercises handed to grading sessions.

use serde::{Deserialize, Serialize};

/// Where did we get the exercise from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseSource {
  LocalBank,   // from user-provided TOML bank
  Seed,  // built-in seeds
}

/// A single graded coding challenge. Immutable once loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub initial_code: String,
  /// Exact-match target after trimming. `None` (or empty) means the exercise is unscored.
  #[serde(default)] pub expected_output: Option<String>,
  #[serde(default)] pub hints: Vec<String>,
  pub source: ExerciseSource,
}

impl Exercise {
  /// Expected output that actually takes part in grading.
  pub fn graded_output(&self) -> Option<&str> {
    self.expected_output.as_deref().filter(|e| !e.is_empty())
  }
}
