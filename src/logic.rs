//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Every mutation returns a fresh snapshot so clients always see the due set
//! as recomputed after the change.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Prompt, PromptId, ReviewOutcome};
use crate::error::ApiError;
use crate::protocol::{to_out, DueOut, PromptsOut, ReviewQueueOut};
use crate::review::{build_review_queue, due_message, ReviewQueueMode, ReviewSyncReport};
use crate::state::AppState;
use crate::store::ListStatus;

/// A single-prompt store operation requested by a client.
#[derive(Debug, Clone)]
pub enum PromptOp {
  Save(PromptId),
  SaveAll(Vec<PromptId>),
  Unsave(PromptId),
  Delete(PromptId),
  UpdateFront(PromptId, String),
  UpdateBack(PromptId, String),
}

#[instrument(level = "info", skip(state))]
pub async fn open_document(state: &AppState, document: &str) -> Result<PromptsOut, ApiError> {
  state.open_document(document).await?;
  snapshot(state, document).await
}

/// Replace a document's prompts with a fresh read of its baseline.
#[instrument(level = "info", skip(state))]
pub async fn reload_document(state: &AppState, document: &str) -> Result<PromptsOut, ApiError> {
  state.reload_document(document).await?;
  snapshot(state, document).await
}

pub async fn snapshot(state: &AppState, document: &str) -> Result<PromptsOut, ApiError> {
  state.read_session(document, |s| Ok(to_out(document, s.store()))).await
}

#[instrument(level = "info", skip(state))]
pub async fn apply_prompt_op(state: &AppState, document: &str, op: PromptOp) -> Result<PromptsOut, ApiError> {
  state.with_session(document, |s| {
    match op {
      PromptOp::Save(id) => s.save(&id)?,
      PromptOp::SaveAll(ids) => s.save_all(&ids)?,
      PromptOp::Unsave(id) => s.unsave(&id)?,
      PromptOp::Delete(id) => { s.delete(&id)?; }
      PromptOp::UpdateFront(id, text) => s.update_front(&id, text)?,
      PromptOp::UpdateBack(id, text) => s.update_back(&id, text)?,
    }
    Ok(to_out(document, s.store()))
  }).await
}

/// Insert a reader-authored prompt. Generates an id when none is given.
#[instrument(level = "info", skip(state, prompt))]
pub async fn create_prompt(
  state: &AppState,
  document: &str,
  id: Option<PromptId>,
  prompt: Prompt,
) -> Result<(PromptId, PromptsOut), ApiError> {
  let id = match id {
    Some(id) if id.trim().is_empty() => return Err(ApiError::BadRequest("prompt id must not be blank".into())),
    Some(id) => id,
    None => Uuid::new_v4().to_string(),
  };
  state.with_session(document, |s| {
    if s.create(id.clone(), prompt).is_some() {
      info!(target: "prompt_store", %document, %id, "Existing prompt replaced by create");
    }
    Ok((id.clone(), to_out(document, s.store())))
  }).await
}

#[instrument(level = "info", skip(state, outcomes), fields(count = outcomes.len()))]
pub async fn sync_review_outcomes(
  state: &AppState,
  document: &str,
  outcomes: &[ReviewOutcome],
) -> Result<(ReviewSyncReport, PromptsOut), ApiError> {
  state.with_session(document, |s| {
    let report = s.apply_review_outcomes(outcomes);
    Ok((report, to_out(document, s.store())))
  }).await
}

/// Compose a review queue. Relative image answers resolve against `base_uri`
/// (the page's own base URL) when given, else against the document path.
#[instrument(level = "info", skip(state))]
pub async fn review_queue(
  state: &AppState,
  document: &str,
  mode: &ReviewQueueMode,
  base_uri: Option<&str>,
) -> Result<ReviewQueueOut, ApiError> {
  let page = state.resolver.page_base(document, base_uri)?;
  state.read_session(document, |s| {
    let items = build_review_queue(s.store(), mode, &state.resolver, &page, state.shuffle_review_queue)?;
    info!(target: "prompt_store", %document, items = items.len(), "Review queue built");
    Ok(ReviewQueueOut { document: document.to_string(), items })
  }).await
}

pub async fn due_summary(state: &AppState, document: &str) -> Result<DueOut, ApiError> {
  state.read_session(document, |s| {
    let due = s.store().due_ids();
    let count = due.len();
    Ok(DueOut { document: document.to_string(), due, count, message: due_message(count) })
  }).await
}

pub async fn list_status(state: &AppState, document: &str, ids: &[PromptId]) -> Result<ListStatus, ApiError> {
  state.read_session(document, |s| Ok(s.store().list_status(ids)?)).await
}
