//! Error types shared across the store, loader, persistence and review modules.

use thiserror::Error;

use crate::domain::PromptId;

/// Failures of prompt store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  /// The addressed prompt is not in the store. Always a caller bug.
  #[error("prompt not found: {0}")]
  NotFound(PromptId),
}

/// Why a baseline load came back empty. Never leaves the loader.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("invalid document subpath: {0:?}")]
  InvalidSubpath(String),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("baseline source returned HTTP {0}")]
  Status(reqwest::StatusCode),
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PersistError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Failures while building a review queue for the review surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error("unsupported image URL: {0}")]
  UnsupportedAttachment(String),
  #[error("invalid document base URL: {0}")]
  InvalidBaseUrl(String),
}

/// Errors surfaced by the HTTP / WebSocket layer.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("no open session for document: {0}")]
  UnknownDocument(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Review(#[from] ReviewError),
}
