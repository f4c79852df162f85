//! Progress Store: which lessons and exercises a learner has completed, and where they are.
//!
//! Injected into the app state as `Arc<dyn ProgressStore>` so grading never touches
//! ambient global state. The in-memory implementation keeps completion order.

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

pub const DEFAULT_CHAPTER: &str = "chapter1";
pub const DEFAULT_LESSON: &str = "lesson1-1";

pub trait ProgressStore: Send + Sync {
    fn is_exercise_complete(&self, exercise_id: &str) -> bool;

    /// Record completion. Idempotent; returns `true` only on the first call for an id.
    fn mark_exercise_complete(&self, exercise_id: &str) -> bool;

    fn is_lesson_complete(&self, lesson_id: &str) -> bool;

    /// Same contract as `mark_exercise_complete`, for lessons.
    fn mark_lesson_complete(&self, lesson_id: &str) -> bool;

    fn set_current_lesson(&self, chapter_id: &str, lesson_id: &str);

    fn snapshot(&self) -> UserProgress;
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub completed_lessons: Vec<String>,
    pub completed_exercises: Vec<String>,
    pub current_chapter: String,
    pub current_lesson: String,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            completed_lessons: Vec::new(),
            completed_exercises: Vec::new(),
            current_chapter: DEFAULT_CHAPTER.to_string(),
            current_lesson: DEFAULT_LESSON.to_string(),
        }
    }
}

impl UserProgress {
    /// Rounded exercise completion percentage over `total` known exercises.
    pub fn percentage(&self, total: usize) -> u8 {
        rounded_share(self.completed_exercises.len(), total)
    }

    /// Rounded lesson completion percentage over `total_lessons`.
    pub fn lesson_percentage(&self, total_lessons: usize) -> u8 {
        rounded_share(self.completed_lessons.len(), total_lessons)
    }
}

fn rounded_share(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    ((done as f64 / total as f64) * 100.0).round() as u8
}

fn push_once(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|known| known == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    progress: RwLock<UserProgress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn is_exercise_complete(&self, exercise_id: &str) -> bool {
        self.progress.read().completed_exercises.iter().any(|id| id == exercise_id)
    }

    fn mark_exercise_complete(&self, exercise_id: &str) -> bool {
        let mut p = self.progress.write();
        if !push_once(&mut p.completed_exercises, exercise_id) {
            return false;
        }
        info!(target: "grading", %exercise_id, total_completed = p.completed_exercises.len(), "Exercise marked complete");
        true
    }

    fn is_lesson_complete(&self, lesson_id: &str) -> bool {
        self.progress.read().completed_lessons.iter().any(|id| id == lesson_id)
    }

    fn mark_lesson_complete(&self, lesson_id: &str) -> bool {
        let mut p = self.progress.write();
        if !push_once(&mut p.completed_lessons, lesson_id) {
            return false;
        }
        info!(target: "grading", %lesson_id, total_completed = p.completed_lessons.len(), "Lesson marked complete");
        true
    }

    fn set_current_lesson(&self, chapter_id: &str, lesson_id: &str) {
        let mut p = self.progress.write();
        p.current_chapter = chapter_id.to_string();
        p.current_lesson = lesson_id.to_string();
        debug!(target: "grading", %chapter_id, %lesson_id, "Current lesson set");
    }

    fn snapshot(&self) -> UserProgress {
        self.progress.read().clone()
    }
}
