//! Document session: the single owner of one document's prompt store.
//!
//! `init` restores what was persisted for the document, loads the authored
//! baseline and merges it in (persisted state wins). Mutations go through the
//! session so it knows when a flush is needed; `teardown` flushes and ends it.

use tracing::{error, info, instrument, warn};

use crate::domain::{Prompt, PromptId, ReviewOutcome};
use crate::error::{PersistError, StoreError};
use crate::loader::{load_prompts, ContentSource};
use crate::persistence::Persistence;
use crate::review::{apply_review_outcomes, ReviewSyncReport};
use crate::store::PromptStore;

#[derive(Debug)]
pub struct DocumentSession {
  document: String,
  store: PromptStore,
  persistence: Persistence,
  dirty: bool,
}

impl DocumentSession {
  /// Start a session for `document` (the baseline subpath, also the persistence key).
  #[instrument(level = "info", skip(source, persistence))]
  pub async fn init(document: &str, source: &ContentSource, persistence: Persistence) -> Self {
    let mut store = match persistence.get_all(document).await {
      Ok(Some(store)) => store,
      Ok(None) => PromptStore::new(),
      Err(e) => {
        error!(target: "prompt_store", %document, error = %e, "Persisted prompts unreadable; starting empty");
        PromptStore::new()
      }
    };
    let restored = store.len();
    let added = store.merge_loaded(load_prompts(source, document).await);
    info!(target: "prompt_store", %document, restored, added, due = store.due_count(), "Document session ready");

    Self {
      document: document.to_string(),
      store,
      persistence,
      dirty: added > 0,
    }
  }

  pub fn document(&self) -> &str {
    &self.document
  }

  pub fn store(&self) -> &PromptStore {
    &self.store
  }

  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Run a store mutation; marks the session dirty when it succeeds.
  fn mutate<T>(&mut self, f: impl FnOnce(&mut PromptStore) -> Result<T, StoreError>) -> Result<T, StoreError> {
    let out = f(&mut self.store)?;
    self.dirty = true;
    Ok(out)
  }

  pub fn save(&mut self, id: &str) -> Result<(), StoreError> {
    self.mutate(|s| s.save(id))
  }

  pub fn save_all(&mut self, ids: &[PromptId]) -> Result<(), StoreError> {
    self.mutate(|s| s.save_all(ids))
  }

  pub fn unsave(&mut self, id: &str) -> Result<(), StoreError> {
    self.mutate(|s| s.unsave(id))
  }

  pub fn delete(&mut self, id: &str) -> Result<Prompt, StoreError> {
    self.mutate(|s| s.delete(id))
  }

  pub fn update_front(&mut self, id: &str, text: String) -> Result<(), StoreError> {
    self.mutate(|s| s.update_front(id, text))
  }

  pub fn update_back(&mut self, id: &str, text: String) -> Result<(), StoreError> {
    self.mutate(|s| s.update_back(id, text))
  }

  pub fn create(&mut self, id: PromptId, prompt: Prompt) -> Option<Prompt> {
    self.dirty = true;
    self.store.create(id, prompt)
  }

  pub fn apply_review_outcomes(&mut self, outcomes: &[ReviewOutcome]) -> ReviewSyncReport {
    let report = apply_review_outcomes(&mut self.store, outcomes);
    if !report.applied.is_empty() {
      self.dirty = true;
    }
    report
  }

  /// Merge a later baseline load (existing entries win).
  pub fn merge_loaded(&mut self, loaded: PromptStore) -> usize {
    let added = self.store.merge_loaded(loaded);
    if added > 0 {
      self.dirty = true;
    }
    added
  }

  /// Replace the whole store with freshly read baseline data.
  pub fn reload_from(&mut self, loaded: PromptStore) {
    self.store.replace_all(loaded);
    self.dirty = true;
  }

  /// Persist if anything changed since the last flush.
  #[instrument(level = "debug", skip(self), fields(document = %self.document))]
  pub async fn flush(&mut self) -> Result<(), PersistError> {
    if !self.dirty {
      return Ok(());
    }
    self.persistence.set_all(&self.document, &self.store).await?;
    self.dirty = false;
    Ok(())
  }

  /// Flush and end the session. A failed flush is logged; state is lost.
  #[instrument(level = "info", skip(self), fields(document = %self.document))]
  pub async fn teardown(mut self) -> PromptStore {
    if let Err(e) = self.flush().await {
      warn!(target: "prompt_store", document = %self.document, error = %e, "Failed to persist prompts at teardown");
    }
    self.store
  }
}
