//! Domain models: prompts, their content, and review outcomes reported by the review surface.

use serde::{Deserialize, Serialize};

use crate::selector::Selector;

pub type PromptId = String;

/// Question/answer text. `back` may hold an `<img src=...>` fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContent {
  pub front: String,
  pub back: String,
}

/// One flashcard-like unit overlaid on a document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
  pub content: PromptContent,
  #[serde(default)] pub selectors: Vec<Selector>,

  #[serde(default)] pub is_by_author: bool,
  #[serde(default)] pub is_saved: bool,
  #[serde(default)] pub is_due: bool,
  #[serde(default)] pub show_anchors: bool,

  /// Review area that auto-saved this prompt. Only set when saving happened
  /// as a side effect of reviewing, so the save can be undone.
  #[serde(rename = "sourceReviewAreaID", default, skip_serializing_if = "Option::is_none")]
  pub source_review_area_id: Option<String>,
}

impl Prompt {
  /// A fresh, unanchored prompt written by the reader.
  pub fn user_created(front: impl Into<String>, back: impl Into<String>) -> Self {
    Self {
      content: PromptContent { front: front.into(), back: back.into() },
      ..Self::default()
    }
  }
}

/// One completed review item as emitted by the review surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
  pub id: PromptId,
  pub was_skipped: bool,
  /// Days until the next review as scheduled by the review surface. Any
  /// JSON number is accepted; only zero carries meaning here.
  pub new_interval: f64,
  #[serde(rename = "sourceReviewAreaID")]
  pub source_review_area_id: String,
}
