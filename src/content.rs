//! Local stand-in for the prompt content server.
//!
//! A single JSON file maps a page URL to its prompt configuration:
//! `{ "<url>": { "prompts": ..., "promptLists": ... } }`. The `/config`, `/page`
//! and `/inline` endpoints serve slices of it.

use std::{collections::HashMap, path::Path, sync::Arc};

use serde_json::Value;
use tracing::{error, info};

#[derive(Clone, Debug, Default)]
pub struct PromptConfigIndex {
  pages: Arc<HashMap<String, Value>>,
}

impl PromptConfigIndex {
  pub fn from_map(pages: HashMap<String, Value>) -> Self {
    Self { pages: Arc::new(pages) }
  }

  /// Read the index file. Any IO/parse error yields an empty index.
  pub fn load_from_path(path: &Path) -> Self {
    let parsed = std::fs::read_to_string(path)
      .map_err(|e| e.to_string())
      .and_then(|s| serde_json::from_str::<HashMap<String, Value>>(&s).map_err(|e| e.to_string()));
    match parsed {
      Ok(pages) => {
        info!(target: "orbit_backend", path = %path.display(), pages = pages.len(), "Loaded prompt config index");
        Self::from_map(pages)
      }
      Err(e) => {
        error!(target: "orbit_backend", path = %path.display(), error = %e, "Error parsing local json");
        Self::default()
      }
    }
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  /// Whole config for a page.
  pub fn config(&self, url: &str) -> Option<&Value> {
    self.pages.get(url)
  }

  pub fn prompts(&self, url: &str) -> Option<&Value> {
    self.config(url).and_then(|c| c.get("prompts"))
  }

  pub fn prompt_lists(&self, url: &str) -> Option<&Value> {
    self.config(url).and_then(|c| c.get("promptLists"))
  }
}
