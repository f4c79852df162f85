//! Application state: exercise bank, grading sessions, progress store and interpreter.
//!
//! This module owns:
//!   - the exercise bank (by id, plus listing order)
//!   - live grading sessions keyed by session id
//!   - the injected Progress Store and the lesson total it reports against
//!   - the mock interpreter (latency from config)

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::{load_config_from_env, TutorConfig};
use crate::domain::{Exercise, ExerciseSource};
use crate::engine::MockInterpreter;
use crate::grading::GradingSession;
use crate::progress::{MemoryProgressStore, ProgressStore};
use crate::seeds::seed_exercises;

#[derive(Clone)]
pub struct AppState {
    pub by_id: Arc<HashMap<String, Arc<Exercise>>>,
    pub order: Arc<Vec<String>>,
    pub sessions: Arc<RwLock<HashMap<String, GradingSession>>>,
    pub progress: Arc<dyn ProgressStore>,
    pub total_lessons: usize,
    pub interpreter: MockInterpreter,
}

impl AppState {
    /// Build state from env: load config, merge bank with seeds, wire the progress store.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();
        Self::from_config(cfg, Arc::new(MemoryProgressStore::new()))
    }

    pub fn from_config(cfg: TutorConfig, progress: Arc<dyn ProgressStore>) -> Self {
        let mut by_id = HashMap::<String, Arc<Exercise>>::new();
        let mut order = Vec::<String>::new();

        // Insert config-based exercises (if any).
        for ec in cfg.exercises {
            let id = ec.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            let title = match ec.title {
                Some(t) if !t.trim().is_empty() => t,
                _ => {
                    error!(target: "pytutor_backend", %id, "Skipping bank item: missing title.");
                    continue;
                }
            };
            if by_id.contains_key(&id) {
                error!(target: "pytutor_backend", %id, "Skipping bank item: duplicate id.");
                continue;
            }
            let ex = Exercise {
                id: id.clone(),
                title,
                description: ec.description,
                initial_code: ec.initial_code,
                expected_output: ec.expected_output,
                hints: ec.hints,
                source: ExerciseSource::LocalBank,
            };
            order.push(id.clone());
            by_id.insert(id, Arc::new(ex));
        }

        // Always insert built-in seeds, but don't overwrite existing ids.
        let mut seeded = 0usize;
        for ex in seed_exercises() {
            if by_id.contains_key(&ex.id) {
                continue;
            }
            order.push(ex.id.clone());
            by_id.insert(ex.id.clone(), Arc::new(ex));
            seeded += 1;
        }

        let interpreter = MockInterpreter::new(cfg.runtime.execution_latency());
        info!(
            target: "pytutor_backend",
            local_bank = order.len() - seeded,
            seed = seeded,
            latency_ms = interpreter.latency().as_millis() as u64,
            "Startup exercise inventory"
        );

        Self {
            by_id: Arc::new(by_id),
            order: Arc::new(order),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            progress,
            total_lessons: cfg.progress.total_lessons,
            interpreter,
        }
    }

    /// Read-only access to an exercise by id.
    pub fn get_exercise(&self, id: &str) -> Option<Arc<Exercise>> {
        self.by_id.get(id).cloned()
    }

    /// Exercises in listing order (configured bank first, then seeds).
    pub fn exercises(&self) -> Vec<Arc<Exercise>> {
        self.order.iter().filter_map(|id| self.get_exercise(id)).collect()
    }

    /// Open a new grading session for an exercise; returns its id.
    #[instrument(level = "debug", skip(self, exercise), fields(exercise_id = %exercise.id))]
    pub async fn insert_session(&self, exercise: Arc<Exercise>) -> String {
        let already_complete = self.progress.is_exercise_complete(&exercise.id);
        let session_id = Uuid::new_v4().to_string();
        let session = GradingSession::new(exercise, already_complete);
        self.sessions.write().await.insert(session_id.clone(), session);
        session_id
    }

    /// Drop a grading session; returns `false` when the id was unknown.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}
