//! Loading tutor configuration (runtime knobs + optional exercise bank) from TOML.
//!
//! See `TutorConfig` and `RuntimeCfg` for expected schema:
//!
//! ```toml
//! [runtime]
//! execution_latency_ms = 500
//!
//! [progress]
//! total_lessons = 40
//!
//! [[exercises]]
//! id = "ex-custom-1"
//! title = "Hello"
//! initial_code = "# write here\n"
//! expected_output = "Hello"
//! hints = ["use print()"]
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TutorConfig {
  #[serde(default)]
  pub runtime: RuntimeCfg,
  #[serde(default)]
  pub progress: ProgressCfg,
  #[serde(default)]
  pub exercises: Vec<ExerciseCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeCfg {
  /// Simulated interpreter latency per run.
  #[serde(default = "default_latency_ms")]
  pub execution_latency_ms: u64,
}

fn default_latency_ms() -> u64 { 500 }

impl Default for RuntimeCfg {
  fn default() -> Self {
    Self { execution_latency_ms: default_latency_ms() }
  }
}

impl RuntimeCfg {
  pub fn execution_latency(&self) -> Duration {
    Duration::from_millis(self.execution_latency_ms)
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProgressCfg {
  /// Denominator for the lesson completion percentage.
  #[serde(default = "default_total_lessons")]
  pub total_lessons: usize,
}

fn default_total_lessons() -> usize { 40 }

impl Default for ProgressCfg {
  fn default() -> Self {
    Self { total_lessons: default_total_lessons() }
  }
}

/// Exercise entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ExerciseCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub title: Option<String>,
  #[serde(default)] pub description: String,
  #[serde(default)] pub initial_code: String,
  #[serde(default)] pub expected_output: Option<String>,
  #[serde(default)] pub hints: Vec<String>,
}

pub fn parse_config(text: &str) -> Result<TutorConfig, toml::de::Error> {
  toml::from_str::<TutorConfig>(text)
}

/// Attempt to load `TutorConfig` from TUTOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<TutorConfig> {
  let path = std::env::var("TUTOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "pytutor_backend", %path, exercises = cfg.exercises.len(), "Loaded tutor config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "pytutor_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "pytutor_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
