//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! Messages on one socket are handled strictly in arrival order, so review
//! outcomes streamed over a socket are applied in the order they were emitted.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "orbit_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "orbit_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "orbit_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "orbit_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "orbit_backend", "WebSocket disconnected");
}

fn reply<T>(res: Result<T, ApiError>, ok: impl FnOnce(T) -> ServerWsMessage) -> ServerWsMessage {
  match res {
    Ok(v) => ok(v),
    Err(e) => {
      debug!(target: "orbit_backend", error = %e, "WS request failed");
      ServerWsMessage::Error { message: e.to_string() }
    }
  }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::OpenDocument { document } => {
      reply(open_document(state, &document).await, ServerWsMessage::Prompts)
    }

    ClientWsMessage::CloseDocument { document } => {
      let res = state.close_document(&document).await;
      reply(res, |_| ServerWsMessage::Closed { document })
    }

    ClientWsMessage::ReloadDocument { document } =>
      reply(reload_document(state, &document).await, ServerWsMessage::Prompts),

    ClientWsMessage::SavePrompt { document, id } =>
      reply(apply_prompt_op(state, &document, PromptOp::Save(id)).await, ServerWsMessage::Prompts),

    ClientWsMessage::SaveAll { document, ids } =>
      reply(apply_prompt_op(state, &document, PromptOp::SaveAll(ids)).await, ServerWsMessage::Prompts),

    ClientWsMessage::UnsavePrompt { document, id } =>
      reply(apply_prompt_op(state, &document, PromptOp::Unsave(id)).await, ServerWsMessage::Prompts),

    ClientWsMessage::DeletePrompt { document, id } =>
      reply(apply_prompt_op(state, &document, PromptOp::Delete(id)).await, ServerWsMessage::Prompts),

    ClientWsMessage::UpdateFront { document, id, text } =>
      reply(apply_prompt_op(state, &document, PromptOp::UpdateFront(id, text)).await, ServerWsMessage::Prompts),

    ClientWsMessage::UpdateBack { document, id, text } =>
      reply(apply_prompt_op(state, &document, PromptOp::UpdateBack(id, text)).await, ServerWsMessage::Prompts),

    ClientWsMessage::CreatePrompt { document, id, prompt } => {
      let res = create_prompt(state, &document, id, prompt).await;
      reply(res, |(id, snapshot)| ServerWsMessage::Created { id, snapshot })
    }

    ClientWsMessage::ReviewOutcomes { document, outcomes } => {
      let res = sync_review_outcomes(state, &document, &outcomes).await;
      if let Ok((report, _)) = &res {
        info!(target: "prompt_store", %document, applied = report.applied.len(), missing = report.missing.len(), "WS review outcomes synced");
      }
      reply(res, |(report, snapshot)| ServerWsMessage::ReviewSynced { report, snapshot })
    }

    ClientWsMessage::StartReview { document, queue, base_uri } =>
      reply(review_queue(state, &document, &queue, base_uri.as_deref()).await, ServerWsMessage::ReviewQueue),

    ClientWsMessage::Due { document } =>
      reply(due_summary(state, &document).await, ServerWsMessage::Due),

    ClientWsMessage::ListStatus { document, ids } =>
      reply(list_status(state, &document, &ids).await, ServerWsMessage::ListStatus),
  }
}
