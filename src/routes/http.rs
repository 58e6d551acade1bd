//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::error::{ApiError, ReviewError};
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::UnknownDocument(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) => StatusCode::NOT_FOUND,
      ApiError::Review(ReviewError::Store(_)) => StatusCode::NOT_FOUND,
      ApiError::Review(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    warn!(target: "orbit_backend", %status, error = %self, "Request failed");
    (status, Json(ErrorOut { message: self.to_string() })).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state), fields(document = %body.document))]
pub async fn http_open_document(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DocumentIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  let out = open_document(&state, &body.document).await?;
  info!(target: "prompt_store", document = %body.document, prompts = out.prompts.len(), due = out.due.len(), "HTTP document opened");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(document = %body.document))]
pub async fn http_close_document(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DocumentIn>,
) -> Result<Json<ClosedOut>, ApiError> {
  state.close_document(&body.document).await?;
  Ok(Json(ClosedOut { document: body.document }))
}

#[instrument(level = "info", skip(state), fields(document = %body.document))]
pub async fn http_reload_document(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DocumentIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  Ok(Json(reload_document(&state, &body.document).await?))
}

#[instrument(level = "info", skip(state), fields(document = %q.document))]
pub async fn http_get_prompts(
  State(state): State<Arc<AppState>>,
  Query(q): Query<DocumentQuery>,
) -> Result<Json<PromptsOut>, ApiError> {
  Ok(Json(snapshot(&state, &q.document).await?))
}

async fn run_op(state: &AppState, document: &str, op: PromptOp) -> Result<Json<PromptsOut>, ApiError> {
  Ok(Json(apply_prompt_op(state, document, op).await?))
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, id = %body.id))]
pub async fn http_save_prompt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptIdIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  run_op(&state, &body.document, PromptOp::Save(body.id)).await
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, count = body.ids.len()))]
pub async fn http_save_all(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptIdsIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  run_op(&state, &body.document, PromptOp::SaveAll(body.ids)).await
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, id = %body.id))]
pub async fn http_unsave_prompt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptIdIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  run_op(&state, &body.document, PromptOp::Unsave(body.id)).await
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, id = %body.id))]
pub async fn http_delete_prompt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptIdIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  run_op(&state, &body.document, PromptOp::Delete(body.id)).await
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, id = %body.id, text_len = body.text.len()))]
pub async fn http_update_front(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptTextIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  run_op(&state, &body.document, PromptOp::UpdateFront(body.id, body.text)).await
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, id = %body.id, text_len = body.text.len()))]
pub async fn http_update_back(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptTextIn>,
) -> Result<Json<PromptsOut>, ApiError> {
  run_op(&state, &body.document, PromptOp::UpdateBack(body.id, body.text)).await
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document))]
pub async fn http_create_prompt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreatePromptIn>,
) -> Result<Json<CreatedOut>, ApiError> {
  let (id, snapshot) = create_prompt(&state, &body.document, body.id, body.prompt).await?;
  info!(target: "prompt_store", document = %body.document, %id, "HTTP prompt created");
  Ok(Json(CreatedOut { id, snapshot }))
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, count = body.ids.len()))]
pub async fn http_list_status(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PromptIdsIn>,
) -> Result<Json<crate::store::ListStatus>, ApiError> {
  Ok(Json(list_status(&state, &body.document, &body.ids).await?))
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, count = body.outcomes.len()))]
pub async fn http_review_outcomes(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReviewOutcomesIn>,
) -> Result<Json<ReviewSyncedOut>, ApiError> {
  let (report, snapshot) = sync_review_outcomes(&state, &body.document, &body.outcomes).await?;
  info!(target: "prompt_store", document = %body.document, applied = report.applied.len(), missing = report.missing.len(), "HTTP review outcomes synced");
  Ok(Json(ReviewSyncedOut { report, snapshot }))
}

#[instrument(level = "info", skip(state, body), fields(document = %body.document, queue = ?body.queue))]
pub async fn http_review_queue(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReviewQueueIn>,
) -> Result<Json<ReviewQueueOut>, ApiError> {
  Ok(Json(review_queue(&state, &body.document, &body.queue, body.base_uri.as_deref()).await?))
}

#[instrument(level = "info", skip(state), fields(document = %q.document))]
pub async fn http_get_due(
  State(state): State<Arc<AppState>>,
  Query(q): Query<DocumentQuery>,
) -> Result<Json<DueOut>, ApiError> {
  Ok(Json(due_summary(&state, &q.document).await?))
}
