//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::TutorError;
use crate::protocol::{ClientWsMessage, ServerWsMessage, SessionOut};
use crate::logic;
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "pytutor_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "pytutor_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = reply_to_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "pytutor_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "pytutor_backend", "WebSocket disconnected");
}

/// Parse, dispatch, serialize response.
async fn reply_to_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "pytutor_backend", kind = incoming.kind(), "WS received");
      handle_client_ws(incoming, state).await
    }
    Err(e) => {
      debug!(target: "pytutor_backend", payload = %trunc_for_log(txt, 200), "WS invalid payload");
      ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }
    }
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

fn session_reply(result: Result<SessionOut, TutorError>) -> ServerWsMessage {
  match result {
    Ok(session) => ServerWsMessage::Session { session },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

#[instrument(level = "info", skip(msg, state), fields(kind = msg.kind()))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListExercises =>
      ServerWsMessage::Exercises { exercises: logic::list_exercises(state) },

    ClientWsMessage::OpenSession { exercise_id } =>
      session_reply(logic::open_session(state, &exercise_id).await),

    ClientWsMessage::GetSession { session_id } =>
      session_reply(logic::session_snapshot(state, &session_id).await),

    ClientWsMessage::EditSource { session_id, source } =>
      session_reply(logic::edit_source(state, &session_id, source).await),

    ClientWsMessage::Run { session_id } => {
      let reply = session_reply(logic::run_session(state, &session_id).await);
      tracing::info!(target: "grading", %session_id, "WS run evaluated");
      reply
    }

    ClientWsMessage::Reset { session_id } =>
      session_reply(logic::reset_session(state, &session_id).await),

    ClientWsMessage::Hint { session_id } =>
      session_reply(logic::next_hint(state, &session_id).await),

    ClientWsMessage::CloseSession { session_id } => match logic::close_session(state, &session_id).await {
      Ok(()) => ServerWsMessage::SessionClosed { session_id },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::Execute { source } =>
      ServerWsMessage::Executed { result: logic::execute_source(state, &source).await },

    ClientWsMessage::Progress =>
      ServerWsMessage::Progress { progress: logic::progress(state) },

    ClientWsMessage::CompleteLesson { lesson_id } =>
      ServerWsMessage::Progress { progress: logic::complete_lesson(state, &lesson_id) },

    ClientWsMessage::SetCurrentLesson { chapter_id, lesson_id } =>
      ServerWsMessage::Progress { progress: logic::set_current_lesson(state, &chapter_id, &lesson_id) },
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::config::parse_config;
  use crate::progress::MemoryProgressStore;

  fn state() -> AppState {
    let cfg = parse_config("[runtime]\nexecution_latency_ms = 0").unwrap();
    AppState::from_config(cfg, Arc::new(MemoryProgressStore::new()))
  }

  async fn send(state: &AppState, msg: serde_json::Value) -> serde_json::Value {
    let out = reply_to_text(&msg.to_string(), state).await;
    serde_json::from_str(&out).unwrap()
  }

  #[tokio::test]
  async fn ping_and_invalid_json() {
    let state = state();
    assert_eq!(send(&state, serde_json::json!({ "type": "ping" })).await["type"], "pong");
    let out: serde_json::Value = serde_json::from_str(&reply_to_text("{not json", &state).await).unwrap();
    assert_eq!(out["type"], "error");
    assert!(out["message"].as_str().unwrap().starts_with("Invalid JSON"));
  }

  #[tokio::test]
  async fn session_round_trip_over_messages() {
    let state = state();
    let opened = send(&state, serde_json::json!({ "type": "open_session", "exerciseId": "ex4-1-1" })).await;
    assert_eq!(opened["type"], "session");
    let sid = opened["session"]["sessionId"].as_str().unwrap().to_string();

    send(&state, serde_json::json!({
      "type": "edit_source", "sessionId": sid, "source": "for i in range(1, 6):\n    print(i)"
    })).await;
    let ran = send(&state, serde_json::json!({ "type": "run", "sessionId": sid })).await;
    assert_eq!(ran["session"]["state"], "graded_correct");
    assert_eq!(ran["session"]["output"], "1\n2\n3\n4\n5");
    assert_eq!(ran["session"]["success"], true);

    let progress = send(&state, serde_json::json!({ "type": "progress" })).await;
    assert_eq!(progress["progress"]["completedExercises"][0], "ex4-1-1");
  }

  #[tokio::test]
  async fn lesson_messages_update_progress() {
    let state = state();
    let done = send(&state, serde_json::json!({ "type": "complete_lesson", "lessonId": "lesson1-2" })).await;
    assert_eq!(done["type"], "progress");
    assert_eq!(done["progress"]["completedLessons"][0], "lesson1-2");

    let moved = send(&state, serde_json::json!({
      "type": "set_current_lesson", "chapterId": "chapter1", "lessonId": "lesson1-3"
    })).await;
    assert_eq!(moved["progress"]["currentLesson"], "lesson1-3");
    assert_eq!(moved["progress"]["completedLessons"][0], "lesson1-2");
  }

  #[tokio::test]
  async fn close_session_message() {
    let state = state();
    let opened = send(&state, serde_json::json!({ "type": "open_session", "exerciseId": "ex1-5-1" })).await;
    let sid = opened["session"]["sessionId"].as_str().unwrap().to_string();

    let closed = send(&state, serde_json::json!({ "type": "close_session", "sessionId": sid })).await;
    assert_eq!(closed, serde_json::json!({ "type": "session_closed", "sessionId": sid }));
    let again = send(&state, serde_json::json!({ "type": "close_session", "sessionId": sid })).await;
    assert_eq!(again["type"], "error");
    assert!(state.sessions.read().await.is_empty());
  }

  #[tokio::test]
  async fn unknown_session_is_an_error_reply() {
    let state = state();
    let out = send(&state, serde_json::json!({ "type": "hint", "sessionId": "nope" })).await;
    assert_eq!(out["type"], "error");
    assert_eq!(out["message"], "Unknown sessionId: nope");
  }
}
