//! Prompt entity store: id -> prompt, plus every rule for mutating a prompt's lifecycle.
//!
//! Lifecycle: unsaved -> saved (+due) -> reviewed (due or not, by interval).
//! The store also owns the due-set projection, which is computed on every
//! read so it can never go stale after a mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Prompt, PromptId, ReviewOutcome};
use crate::error::StoreError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptStore {
  prompts: HashMap<PromptId, Prompt>,
}

/// Button state for an author-defined prompt list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStatus {
  /// Every prompt is already saved ("save all" has nothing to do).
  pub all_saved: bool,
  /// Every prompt is saved and none is due ("review all" has nothing to do).
  pub all_reviewed: bool,
}

impl PromptStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, id: &str) -> Option<&Prompt> {
    self.prompts.get(id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.prompts.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.prompts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prompts.is_empty()
  }

  /// All ids, sorted for stable output.
  pub fn ids(&self) -> Vec<PromptId> {
    let mut ids: Vec<PromptId> = self.prompts.keys().cloned().collect();
    ids.sort();
    ids
  }

  fn get_mut(&mut self, id: &str) -> Result<&mut Prompt, StoreError> {
    self.prompts
      .get_mut(id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))
  }

  /// Commit to reviewing a prompt. A newly saved prompt is immediately due.
  #[instrument(level = "debug", skip(self))]
  pub fn save(&mut self, id: &str) -> Result<(), StoreError> {
    let prompt = self.get_mut(id)?;
    if !prompt.is_saved {
      prompt.is_saved = true;
      prompt.is_due = true;
      debug!(target: "prompt_store", %id, "Prompt saved");
    }
    Ok(())
  }

  /// Save every id in order. Checks all ids first so a bad id mutates nothing.
  #[instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
  pub fn save_all(&mut self, ids: &[PromptId]) -> Result<(), StoreError> {
    if let Some(missing) = ids.iter().find(|id| !self.contains(id)) {
      return Err(StoreError::NotFound(missing.clone()));
    }
    for id in ids {
      self.save(id)?;
    }
    Ok(())
  }

  /// Undo a save. Also drops the auto-save provenance for good.
  #[instrument(level = "debug", skip(self))]
  pub fn unsave(&mut self, id: &str) -> Result<(), StoreError> {
    let prompt = self.get_mut(id)?;
    prompt.is_saved = false;
    prompt.is_due = false;
    prompt.source_review_area_id = None;
    debug!(target: "prompt_store", %id, "Prompt unsaved");
    Ok(())
  }

  #[instrument(level = "debug", skip(self))]
  pub fn delete(&mut self, id: &str) -> Result<Prompt, StoreError> {
    let removed = self.prompts
      .remove(id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    debug!(target: "prompt_store", %id, "Prompt deleted");
    Ok(removed)
  }

  #[instrument(level = "debug", skip(self, text))]
  pub fn update_front(&mut self, id: &str, text: impl Into<String>) -> Result<(), StoreError> {
    self.get_mut(id)?.content.front = text.into();
    Ok(())
  }

  #[instrument(level = "debug", skip(self, text))]
  pub fn update_back(&mut self, id: &str, text: impl Into<String>) -> Result<(), StoreError> {
    self.get_mut(id)?.content.back = text.into();
    Ok(())
  }

  /// Insert a caller-built prompt. An existing entry at `id` is replaced.
  /// Returns the replaced entry, if any.
  #[instrument(level = "debug", skip(self, id, prompt), fields(id = %id.as_ref()))]
  pub fn create(&mut self, id: impl Into<PromptId> + AsRef<str>, prompt: Prompt) -> Option<Prompt> {
    let id = id.into();
    debug!(target: "prompt_store", %id, by_author = prompt.is_by_author, "Prompt created");
    self.prompts.insert(id, prompt)
  }

  /// Fold one review outcome into the prompt.
  ///
  /// Reviewing an unsaved prompt saves it (unless skipped) and records which
  /// review area did so; the first recorded area is kept. Due status is then
  /// set purely from the outcome: a zero interval that was not a skip means
  /// "forgotten, show again", anything else clears it.
  #[instrument(level = "debug", skip(self, outcome), fields(id = %outcome.id, skipped = outcome.was_skipped, interval = outcome.new_interval))]
  pub fn sync_from_review(&mut self, outcome: &ReviewOutcome) -> Result<(), StoreError> {
    let prompt = self.get_mut(&outcome.id)?;
    if !prompt.is_saved && !outcome.was_skipped {
      prompt.is_saved = true;
      if prompt.source_review_area_id.is_none() {
        prompt.source_review_area_id = Some(outcome.source_review_area_id.clone());
      }
      debug!(target: "prompt_store", id = %outcome.id, area = %outcome.source_review_area_id, "Prompt auto-saved by review");
    }
    prompt.is_due = outcome.new_interval == 0.0 && !outcome.was_skipped;
    Ok(())
  }

  /// Throw away current state and take `other` wholesale (baseline reload).
  pub fn replace_all(&mut self, other: PromptStore) {
    self.prompts = other.prompts;
  }

  /// Fill gaps from `loaded`; entries already present always win.
  /// Returns how many prompts were added.
  pub fn merge_loaded(&mut self, loaded: PromptStore) -> usize {
    let mut added = 0;
    for (id, prompt) in loaded.prompts {
      if let std::collections::hash_map::Entry::Vacant(slot) = self.prompts.entry(id) {
        slot.insert(prompt);
        added += 1;
      }
    }
    added
  }

  /// Ids of every due prompt, sorted.
  pub fn due_ids(&self) -> Vec<PromptId> {
    let mut ids: Vec<PromptId> = self.prompts
      .iter()
      .filter(|(_, p)| p.is_due)
      .map(|(id, _)| id.clone())
      .collect();
    ids.sort();
    ids
  }

  pub fn due_count(&self) -> usize {
    self.prompts.values().filter(|p| p.is_due).count()
  }

  /// Button state for a list of prompt ids. Unknown ids are `NotFound`.
  pub fn list_status(&self, ids: &[PromptId]) -> Result<ListStatus, StoreError> {
    let mut all_saved = true;
    let mut all_reviewed = true;
    for id in ids {
      let p = self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
      all_saved &= p.is_saved;
      all_reviewed &= p.is_saved && !p.is_due;
    }
    Ok(ListStatus { all_saved, all_reviewed })
  }
}

impl FromIterator<(PromptId, Prompt)> for PromptStore {
  fn from_iter<T: IntoIterator<Item = (PromptId, Prompt)>>(iter: T) -> Self {
    Self { prompts: iter.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::PromptContent;

  fn outcome(id: &str, was_skipped: bool, new_interval: f64, area: &str) -> ReviewOutcome {
    ReviewOutcome {
      id: id.into(),
      was_skipped,
      new_interval,
      source_review_area_id: area.into(),
    }
  }

  fn store_with(id: &str) -> PromptStore {
    let mut s = PromptStore::new();
    s.create(id, Prompt::user_created("Q", "A"));
    s
  }

  #[test]
  fn create_then_save_marks_saved_and_due() {
    let mut s = PromptStore::new();
    s.create("p1", Prompt {
      content: PromptContent { front: "Q".into(), back: "A".into() },
      ..Prompt::default()
    });
    s.save("p1").unwrap();

    let p = s.get("p1").unwrap();
    assert!(p.is_saved && p.is_due);
    assert_eq!(p.content.front, "Q");
    assert_eq!(s.len(), 1);
  }

  #[test]
  fn only_an_exact_zero_interval_is_due() {
    let mut s = store_with("p1");
    s.sync_from_review(&outcome("p1", false, 0.0, "R1")).unwrap();
    assert!(s.get("p1").unwrap().is_due);
    s.sync_from_review(&outcome("p1", false, 1.5, "R1")).unwrap();
    assert!(!s.get("p1").unwrap().is_due);
    s.sync_from_review(&outcome("p1", false, 0.25, "R1")).unwrap();
    assert!(!s.get("p1").unwrap().is_due);
  }

  #[test]
  fn save_is_idempotent_and_keeps_source_area() {
    let mut s = store_with("p1");
    s.sync_from_review(&outcome("p1", false, 5.0, "R1")).unwrap();
    s.save("p1").unwrap();
    let once = s.get("p1").unwrap().clone();
    s.save("p1").unwrap();
    assert_eq!(s.get("p1").unwrap(), &once);
    assert_eq!(once.source_review_area_id.as_deref(), Some("R1"));

    let mut fresh = store_with("p2");
    fresh.save("p2").unwrap();
    fresh.save("p2").unwrap();
    let p = fresh.get("p2").unwrap();
    assert!(p.is_saved && p.is_due);
  }

  #[test]
  fn unsave_clears_everything_from_any_state() {
    let mut s = store_with("p1");
    s.sync_from_review(&outcome("p1", false, 0.0, "R1")).unwrap();
    assert!(s.get("p1").unwrap().is_due);

    s.unsave("p1").unwrap();
    let p = s.get("p1").unwrap();
    assert!(!p.is_saved);
    assert!(!p.is_due);
    assert_eq!(p.source_review_area_id, None);

    s.unsave("p1").unwrap();
    assert!(!s.get("p1").unwrap().is_saved);
  }

  #[test]
  fn review_with_zero_interval_saves_and_marks_due() {
    let mut s = store_with("p1");
    s.sync_from_review(&outcome("p1", false, 0.0, "R1")).unwrap();
    let p = s.get("p1").unwrap();
    assert!(p.is_saved);
    assert!(p.is_due);
    assert_eq!(p.source_review_area_id.as_deref(), Some("R1"));
  }

  #[test]
  fn skipped_review_never_saves() {
    let mut s = store_with("p1");
    s.sync_from_review(&outcome("p1", true, 0.0, "R1")).unwrap();
    let p = s.get("p1").unwrap();
    assert!(!p.is_saved);
    assert!(!p.is_due);
    assert_eq!(p.source_review_area_id, None);
  }

  #[test]
  fn first_review_area_wins() {
    let mut s = store_with("p1");
    s.sync_from_review(&outcome("p1", false, 0.0, "R1")).unwrap();
    s.sync_from_review(&outcome("p1", false, 0.0, "R2")).unwrap();
    assert_eq!(s.get("p1").unwrap().source_review_area_id.as_deref(), Some("R1"));

    // an unsave then a re-review lets a new area record itself
    s.unsave("p1").unwrap();
    s.sync_from_review(&outcome("p1", false, 3.0, "R3")).unwrap();
    assert_eq!(s.get("p1").unwrap().source_review_area_id.as_deref(), Some("R3"));
  }

  #[test]
  fn explicit_save_does_not_record_review_area() {
    let mut s = store_with("p1");
    s.save("p1").unwrap();
    s.sync_from_review(&outcome("p1", false, 0.0, "R1")).unwrap();
    assert_eq!(s.get("p1").unwrap().source_review_area_id, None);
  }

  #[test]
  fn nonzero_interval_drops_prompt_from_due_set() {
    let mut s = store_with("p1");
    s.create("p2", Prompt::user_created("Q2", "A2"));
    s.save("p1").unwrap();
    s.save("p2").unwrap();
    assert_eq!(s.due_ids(), vec!["p1".to_string(), "p2".to_string()]);

    s.sync_from_review(&outcome("p1", false, 5.0, "R1")).unwrap();
    assert_eq!(s.due_ids(), vec!["p2".to_string()]);
    assert_eq!(s.due_count(), 1);
    assert!(s.get("p1").unwrap().is_saved);
  }

  #[test]
  fn skip_clears_due_on_saved_prompt() {
    let mut s = store_with("p1");
    s.save("p1").unwrap();
    s.sync_from_review(&outcome("p1", true, 0.0, "R1")).unwrap();
    let p = s.get("p1").unwrap();
    assert!(p.is_saved);
    assert!(!p.is_due);
  }

  #[test]
  fn missing_ids_are_not_found() {
    let mut s = PromptStore::new();
    let nf = StoreError::NotFound("ghost".into());
    assert_eq!(s.save("ghost"), Err(nf.clone()));
    assert_eq!(s.unsave("ghost"), Err(nf.clone()));
    assert_eq!(s.delete("ghost").unwrap_err(), nf.clone());
    assert_eq!(s.update_front("ghost", "x"), Err(nf.clone()));
    assert_eq!(s.update_back("ghost", "x"), Err(nf.clone()));
    assert_eq!(s.sync_from_review(&outcome("ghost", false, 0.0, "R")), Err(nf));
  }

  #[test]
  fn delete_removes_and_edits_apply() {
    let mut s = store_with("p1");
    s.update_front("p1", "").unwrap();
    s.update_back("p1", "new back").unwrap();
    assert_eq!(s.get("p1").unwrap().content.front, "");
    assert_eq!(s.get("p1").unwrap().content.back, "new back");

    let removed = s.delete("p1").unwrap();
    assert_eq!(removed.content.back, "new back");
    assert!(s.is_empty());
  }

  #[test]
  fn save_all_checks_ids_before_mutating() {
    let mut s = store_with("p1");
    let err = s.save_all(&["p1".into(), "nope".into()]).unwrap_err();
    assert_eq!(err, StoreError::NotFound("nope".into()));
    assert!(!s.get("p1").unwrap().is_saved);

    s.save_all(&["p1".into()]).unwrap();
    assert!(s.get("p1").unwrap().is_saved);
  }

  #[test]
  fn merge_keeps_existing_and_adds_missing() {
    let mut existing = store_with("p1");
    existing.save("p1").unwrap();

    let mut loaded = PromptStore::new();
    let mut baseline_p1 = Prompt::user_created("baseline Q", "baseline A");
    baseline_p1.is_by_author = true;
    loaded.create("p1", baseline_p1);
    let p2 = Prompt { is_by_author: true, ..Prompt::user_created("Q2", "A2") };
    loaded.create("p2", p2.clone());

    let added = existing.merge_loaded(loaded);
    assert_eq!(added, 1);
    assert!(existing.get("p1").unwrap().is_saved);
    assert_eq!(existing.get("p1").unwrap().content.front, "Q");
    assert_eq!(existing.get("p2"), Some(&p2));
  }

  #[test]
  fn list_status_tracks_saved_and_due() {
    let mut s = store_with("a");
    s.create("b", Prompt::user_created("Q", "A"));
    let ids = vec!["a".to_string(), "b".to_string()];
    assert_eq!(s.list_status(&ids).unwrap(), ListStatus { all_saved: false, all_reviewed: false });

    s.save_all(&ids).unwrap();
    assert_eq!(s.list_status(&ids).unwrap(), ListStatus { all_saved: true, all_reviewed: false });

    for id in &ids {
      s.sync_from_review(&outcome(id, false, 4.0, "R")).unwrap();
    }
    assert_eq!(s.list_status(&ids).unwrap(), ListStatus { all_saved: true, all_reviewed: true });
  }

  #[test]
  fn store_serializes_as_plain_map() {
    let s = store_with("p1");
    let v = serde_json::to_value(&s).unwrap();
    assert!(v.get("p1").is_some());
    let back: PromptStore = serde_json::from_value(v).unwrap();
    assert_eq!(back, s);
  }
}
