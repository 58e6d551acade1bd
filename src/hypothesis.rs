//! Reading authored prompts from a Hypothes.is annotation export.
//!
//! Expected shape:
//! ```json
//! { "rows": [ { "id": "...", "text": "Q. front\nA. back",
//!               "target": [ { "source": "...", "selector": [ ... ] } ] } ] }
//! ```
//! Each row with a `Q.`/`A.` body becomes one authored prompt. Selector kinds
//! we don't store (e.g. `FragmentSelector`) are dropped; the rest are kept
//! exactly as exported.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Prompt, PromptContent};
use crate::selector::Selector;
use crate::store::PromptStore;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HypothesisExport {
  #[serde(default)] pub rows: Vec<HypothesisRow>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HypothesisRow {
  pub id: String,
  #[serde(default)] pub text: String,
  #[serde(default)] pub target: Vec<HypothesisTarget>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HypothesisTarget {
  #[serde(default)] pub source: Option<String>,
  #[serde(default)] pub selector: Vec<Value>,
}

/// Split an annotation body into (front, back) on its `Q.` / `A.` markers.
pub fn split_question_answer(text: &str) -> Option<(String, String)> {
  let text = text.trim();
  let body = text.strip_prefix("Q.").unwrap_or(text);
  let (front, back) = match body.find("\nA.") {
    Some(i) => (&body[..i], &body[i + 3..]),
    None => return None,
  };
  Some((front.trim().to_string(), back.trim().to_string()))
}

/// Keep the selectors we understand, in their exported order.
fn supported_selectors(raw: &[Value]) -> Vec<Selector> {
  raw.iter()
    .filter_map(|v| match serde_json::from_value::<Selector>(v.clone()) {
      Ok(s) => Some(s),
      Err(e) => {
        debug!(target: "prompt_store", kind = ?v.get("type"), error = %e, "Dropping unsupported selector");
        None
      }
    })
    .collect()
}

/// Convert an export into a store of authored, unsaved prompts.
pub fn read_prompts_from_hypothesis(export: HypothesisExport) -> PromptStore {
  export.rows
    .into_iter()
    .filter_map(|row| {
      let Some((front, back)) = split_question_answer(&row.text) else {
        debug!(target: "prompt_store", id = %row.id, "Skipping annotation without Q./A. body");
        return None;
      };
      let selectors = row.target
        .first()
        .map(|t| supported_selectors(&t.selector))
        .unwrap_or_default();
      let prompt = Prompt {
        content: PromptContent { front, back },
        selectors,
        is_by_author: true,
        is_saved: false,
        is_due: false,
        show_anchors: true,
        source_review_area_id: None,
      };
      Some((row.id, prompt))
    })
    .collect()
}

/// Parse raw JSON text and convert it.
pub fn read_prompts_from_hypothesis_json(json: &str) -> Result<PromptStore, serde_json::Error> {
  let export: HypothesisExport = serde_json::from_str(json)?;
  Ok(read_prompts_from_hypothesis(export))
}

#[cfg(test)]
mod tests {
  use super::*;

  const EXPORT: &str = r#"{
    "total": 3,
    "rows": [
      {
        "id": "a1",
        "text": "Q. What does an appetite fix?\nA. Time, not scope.",
        "target": [{
          "source": "https://basecamp.com/shapeup/1.2-chapter-03",
          "selector": [
            { "type": "RangeSelector", "startOffset": 0, "endOffset": 12,
              "startContainer": "/div[2]/p[4]", "endContainer": "/div[2]/p[4]" },
            { "type": "FragmentSelector", "value": "p4" },
            { "type": "TextQuoteSelector", "exact": "appetite", "prefix": "an ", "suffix": " is" }
          ]
        }]
      },
      { "id": "a2", "text": "just a highlight note", "target": [] },
      { "id": "a3", "text": "Q. Image?\nA. <img src=\"../images/fig1.png\" alt=\"x\">" }
    ]
  }"#;

  #[test]
  fn export_rows_become_authored_prompts() {
    let store = read_prompts_from_hypothesis_json(EXPORT).expect("parse");
    assert_eq!(store.ids(), vec!["a1".to_string(), "a3".to_string()]);

    let p = store.get("a1").unwrap();
    assert_eq!(p.content.front, "What does an appetite fix?");
    assert_eq!(p.content.back, "Time, not scope.");
    assert!(p.is_by_author && p.show_anchors);
    assert!(!p.is_saved && !p.is_due);
    assert_eq!(p.selectors.len(), 2);
    assert!(matches!(p.selectors[0], Selector::RangeSelector(_)));
    assert!(matches!(p.selectors[1], Selector::TextQuoteSelector(_)));

    assert!(store.get("a3").unwrap().selectors.is_empty());
  }

  #[test]
  fn split_handles_missing_markers() {
    assert_eq!(split_question_answer("Q. a\nA. b"), Some(("a".into(), "b".into())));
    assert_eq!(split_question_answer("front\nA. back"), Some(("front".into(), "back".into())));
    assert_eq!(split_question_answer("no answer here"), None);
  }

  #[test]
  fn garbage_is_a_parse_error() {
    assert!(read_prompts_from_hypothesis_json("not json").is_err());
    assert!(read_prompts_from_hypothesis_json("{}").expect("empty").is_empty());
  }
}
