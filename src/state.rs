//! Application state: open document sessions plus the collaborators they need.
//!
//! Each open document has exactly one `DocumentSession`. Sessions live behind
//! one tokio `RwLock`; every mutation holds the write lock for its whole
//! duration, so store operations never interleave. Baseline loads run outside
//! the lock and merge once they complete.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::OverlayConfig;
use crate::content::PromptConfigIndex;
use crate::error::{ApiError, ReviewError};
use crate::loader::{load_prompts, ContentSource};
use crate::persistence::Persistence;
use crate::review::AttachmentResolver;
use crate::session::DocumentSession;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, DocumentSession>>>,
    pub source: ContentSource,
    pub persistence: Persistence,
    pub resolver: AttachmentResolver,
    pub shuffle_review_queue: bool,
    pub prompt_config: PromptConfigIndex,
}

impl AppState {
    /// Build state from config: content source, persistence, attachment hosts, stub content.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &OverlayConfig) -> Result<Self, ReviewError> {
        let resolver = AttachmentResolver::new(&cfg.document_base_url, cfg.attachment_hosts.clone())?;
        let prompt_config = cfg
            .prompt_config_path
            .as_deref()
            .map(PromptConfigIndex::load_from_path)
            .unwrap_or_default();

        let source = cfg.content_source();
        let persistence = cfg.persistence();
        info!(target: "orbit_backend", ?source, ?persistence, pages = prompt_config.len(), "Overlay state configured");

        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            source,
            persistence,
            resolver,
            shuffle_review_queue: cfg.shuffle_review_queue,
            prompt_config,
        })
    }

    /// Open (or revisit) a document. The baseline is loaded on every visit and
    /// merged without overwriting what the session already holds.
    #[instrument(level = "info", skip(self))]
    pub async fn open_document(&self, document: &str) -> Result<(), ApiError> {
        if document.trim().is_empty() {
            return Err(ApiError::BadRequest("document is required".into()));
        }

        let already_open = { self.sessions.read().await.contains_key(document) };
        if already_open {
            let loaded = load_prompts(&self.source, document).await;
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(document) {
                let added = session.merge_loaded(loaded);
                info!(target: "prompt_store", %document, added, "Baseline re-merged into open session");
                return Ok(());
            }
            // Closed while we were loading; fall through and start fresh.
        }

        let fresh = DocumentSession::init(document, &self.source, self.persistence.clone()).await;
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(document) {
            Some(existing) => {
                // Another open won the race; its state wins, ours only fills gaps.
                existing.merge_loaded(fresh.store().clone());
            }
            None => {
                sessions.insert(document.to_string(), fresh);
            }
        }
        Ok(())
    }

    /// Re-read the baseline and replace the open session's store with it,
    /// discarding saved, due and edited state.
    #[instrument(level = "info", skip(self))]
    pub async fn reload_document(&self, document: &str) -> Result<usize, ApiError> {
        if !self.sessions.read().await.contains_key(document) {
            return Err(ApiError::UnknownDocument(document.to_string()));
        }
        let loaded = load_prompts(&self.source, document).await;
        let count = loaded.len();
        self.with_session(document, |s| {
            s.reload_from(loaded);
            Ok(())
        })
        .await?;
        info!(target: "prompt_store", %document, count, "Session reloaded from baseline");
        Ok(count)
    }

    /// Tear down a session, persisting it.
    #[instrument(level = "info", skip(self))]
    pub async fn close_document(&self, document: &str) -> Result<(), ApiError> {
        let session = { self.sessions.write().await.remove(document) };
        match session {
            Some(session) => {
                session.teardown().await;
                Ok(())
            }
            None => Err(ApiError::UnknownDocument(document.to_string())),
        }
    }

    /// Run `f` against an open session under the write lock.
    pub async fn with_session<T>(
        &self,
        document: &str,
        f: impl FnOnce(&mut DocumentSession) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(document)
            .ok_or_else(|| ApiError::UnknownDocument(document.to_string()))?;
        f(session)
    }

    /// Read-only access to an open session.
    pub async fn read_session<T>(
        &self,
        document: &str,
        f: impl FnOnce(&DocumentSession) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(document)
            .ok_or_else(|| ApiError::UnknownDocument(document.to_string()))?;
        f(session)
    }

    /// Persist every dirty session (shutdown path).
    #[instrument(level = "info", skip(self))]
    pub async fn flush_all(&self) {
        let mut sessions = self.sessions.write().await;
        for (document, session) in sessions.iter_mut() {
            if let Err(e) = session.flush().await {
                warn!(target: "prompt_store", %document, error = %e, "Failed to persist session");
            }
        }
    }
}
