//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Exercise, ExerciseSource};
use crate::grading::SessionSnapshot;
use crate::progress::UserProgress;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListExercises,
    OpenSession {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
    GetSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    EditSource {
        #[serde(rename = "sessionId")]
        session_id: String,
        source: String,
    },
    Run {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Reset {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Hint {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    CloseSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Execute {
        source: String,
    },
    Progress,
    CompleteLesson {
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
    SetCurrentLesson {
        #[serde(rename = "chapterId")]
        chapter_id: String,
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
}

impl ClientWsMessage {
    /// Message tag, for logging without payloads (source text stays out of logs).
    pub fn kind(&self) -> &'static str {
        match self {
            ClientWsMessage::Ping => "ping",
            ClientWsMessage::ListExercises => "list_exercises",
            ClientWsMessage::OpenSession { .. } => "open_session",
            ClientWsMessage::GetSession { .. } => "get_session",
            ClientWsMessage::EditSource { .. } => "edit_source",
            ClientWsMessage::Run { .. } => "run",
            ClientWsMessage::Reset { .. } => "reset",
            ClientWsMessage::Hint { .. } => "hint",
            ClientWsMessage::CloseSession { .. } => "close_session",
            ClientWsMessage::Execute { .. } => "execute",
            ClientWsMessage::Progress => "progress",
            ClientWsMessage::CompleteLesson { .. } => "complete_lesson",
            ClientWsMessage::SetCurrentLesson { .. } => "set_current_lesson",
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Exercises {
        exercises: Vec<ExerciseOut>,
    },
    Session {
        session: SessionOut,
    },
    SessionClosed {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Executed {
        result: ExecuteOut,
    },
    Progress {
        progress: ProgressOut,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for exercise listing. The expected output is not sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub initial_code: String,
    pub graded: bool,
    pub hint_count: usize,
    pub source: ExerciseSource,
}

/// Convert full `Exercise` (internal) to the public DTO.
pub fn to_out(e: &Exercise) -> ExerciseOut {
    ExerciseOut {
        id: e.id.clone(),
        title: e.title.clone(),
        description: e.description.clone(),
        initial_code: e.initial_code.clone(),
        graded: e.graded_output().is_some(),
        hint_count: e.hints.len(),
        source: e.source.clone(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub session_id: String,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOut {
    #[serde(flatten)]
    pub progress: UserProgress,
    pub total_exercises: usize,
    /// Share of exercises completed.
    pub percentage: u8,
    pub total_lessons: usize,
    pub lesson_percentage: u8,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct OpenSessionIn {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
}

#[derive(Deserialize)]
pub struct SourceIn {
    pub source: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLessonIn {
    pub chapter_id: String,
    pub lesson_id: String,
}

#[derive(Deserialize)]
pub struct ExecuteIn {
    pub source: String,
}

/// Raw engine result: exactly one of `output` / `error` is set.
#[derive(Debug, Serialize)]
pub struct ExecuteOut {
    pub output: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags_and_camel_ids() {
        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"edit_source","sessionId":"s1","source":"print(1)"}"#).unwrap();
        match m {
            ClientWsMessage::EditSource { session_id, source } => {
                assert_eq!(session_id, "s1");
                assert_eq!(source, "print(1)");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            serde_json::from_str::<ClientWsMessage>(r#"{"type":"list_exercises"}"#).unwrap(),
            ClientWsMessage::ListExercises
        ));
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"run"}"#).is_err());
    }

    #[test]
    fn session_output_fields_are_camel_case() {
        use crate::grading::{SessionSnapshot, SessionState};

        let out = SessionOut {
            session_id: "s1".into(),
            snapshot: SessionSnapshot {
                exercise_id: "ex1".into(),
                source: String::new(),
                output: "2".into(),
                success: Some(false),
                faulted: false,
                state: SessionState::GradedIncorrect,
                running: false,
                hint_cursor: 0,
                hint: None,
                hint_count: 2,
                completed: false,
                expected_output: Some("1".into()),
            },
        };
        let v = serde_json::to_value(out).unwrap();
        for key in ["sessionId", "exerciseId", "hintCursor", "hintCount", "expectedOutput"] {
            assert!(v.get(key).is_some(), "missing {key} in {v}");
        }
        assert_eq!(v["state"], "graded_incorrect");
        assert!(v.get("hint_cursor").is_none());
    }

    #[test]
    fn lesson_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(
            r#"{"type":"set_current_lesson","chapterId":"chapter2","lessonId":"lesson2-1"}"#,
        )
        .unwrap();
        assert!(matches!(
            m,
            ClientWsMessage::SetCurrentLesson { ref chapter_id, ref lesson_id }
                if chapter_id == "chapter2" && lesson_id == "lesson2-1"
        ));
    }

    #[test]
    fn server_error_shape() {
        let v = serde_json::to_value(ServerWsMessage::Error { message: "boom".into() }).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "error", "message": "boom" }));
    }
}
