//! Prompt content stub: maps a page URL to its prompt data.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::protocol::ErrorOut;
use crate::state::AppState;

fn missing_url(what: &str) -> Response {
  (
    StatusCode::BAD_REQUEST,
    Json(ErrorOut { message: format!("A valid url is required for {}", what) }),
  ).into_response()
}

fn slice(key: &str, value: Option<&Value>) -> Response {
  let mut body = Map::new();
  body.insert(key.to_string(), value.cloned().unwrap_or(Value::Null));
  Json(Value::Object(body)).into_response()
}

/// `/config/`, `/page/` and `/inline/` with nothing after the slash.
pub async fn no_config_url() -> Response { missing_url("prompt data") }
pub async fn no_page_url() -> Response { missing_url("prompt data") }
pub async fn no_inline_url() -> Response { missing_url("prompt lists data") }

#[instrument(level = "info", skip(state))]
pub async fn get_config(State(state): State<Arc<AppState>>, Path(url): Path<String>) -> Response {
  if url.trim().is_empty() { return missing_url("prompt data"); }
  debug!(target: "orbit_backend", %url, found = state.prompt_config.config(&url).is_some(), "Config lookup");
  slice("config", state.prompt_config.config(&url))
}

#[instrument(level = "info", skip(state))]
pub async fn get_page_prompts(State(state): State<Arc<AppState>>, Path(url): Path<String>) -> Response {
  if url.trim().is_empty() { return missing_url("prompt data"); }
  slice("prompts", state.prompt_config.prompts(&url))
}

#[instrument(level = "info", skip(state))]
pub async fn get_prompt_lists(State(state): State<Arc<AppState>>, Path(url): Path<String>) -> Response {
  if url.trim().is_empty() { return missing_url("prompt lists data"); }
  slice("promptLists", state.prompt_config.prompt_lists(&url))
}
