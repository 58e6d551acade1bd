//! Baseline prompt loading for a document.
//!
//! A document's authored prompts are fetched by subpath (e.g. `shapeup/1.2-chapter-03`)
//! from a local directory or a remote content server. Missing or broken baseline
//! data is not an error for the application: it just means zero authored prompts.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{info, instrument, warn};

use crate::error::LoadError;
use crate::hypothesis::read_prompts_from_hypothesis_json;
use crate::store::PromptStore;

/// Where baseline prompt JSON comes from.
#[derive(Clone, Debug)]
pub enum ContentSource {
  /// No baseline data at all.
  None,
  /// `<dir>/<subpath>.json` on local disk.
  Dir(PathBuf),
  /// `GET <base_url>/<subpath>.json`.
  Http { client: reqwest::Client, base_url: String },
}

impl ContentSource {
  pub fn http(base_url: impl Into<String>) -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .unwrap_or_default();
    let base_url = base_url.into().trim_end_matches('/').to_string();
    ContentSource::Http { client, base_url }
  }

  fn describe(&self) -> String {
    match self {
      ContentSource::None => "none".into(),
      ContentSource::Dir(dir) => dir.display().to_string(),
      ContentSource::Http { base_url, .. } => base_url.clone(),
    }
  }

  async fn fetch(&self, subpath: &str) -> Result<String, LoadError> {
    let subpath = validate_subpath(subpath)?;
    match self {
      ContentSource::None => Ok("{}".into()),
      ContentSource::Dir(dir) => {
        let path = dir.join(format!("{}.json", subpath));
        Ok(tokio::fs::read_to_string(&path).await?)
      }
      ContentSource::Http { client, base_url } => {
        let url = format!("{}/{}.json", base_url, subpath);
        let res = client.get(&url)
          .header(USER_AGENT, "orbit-overlay-backend/0.1")
          .header(ACCEPT, "application/json")
          .send().await?;
        if !res.status().is_success() {
          return Err(LoadError::Status(res.status()));
        }
        Ok(res.text().await?)
      }
    }
  }
}

/// Reject subpaths that could leave the content root.
fn validate_subpath(subpath: &str) -> Result<&str, LoadError> {
  let trimmed = subpath.trim_matches('/');
  let invalid = trimmed.is_empty()
    || trimmed.contains('\\')
    || Path::new(trimmed).components().any(|c| !matches!(c, Component::Normal(_)));
  if invalid {
    return Err(LoadError::InvalidSubpath(subpath.to_string()));
  }
  Ok(trimmed)
}

async fn try_load(source: &ContentSource, subpath: &str) -> Result<PromptStore, LoadError> {
  let raw = source.fetch(subpath).await?;
  Ok(read_prompts_from_hypothesis_json(&raw)?)
}

/// Load baseline prompts for `subpath`. Any failure yields an empty store.
#[instrument(level = "info", skip(source), fields(origin = %source.describe()))]
pub async fn load_prompts(source: &ContentSource, subpath: &str) -> PromptStore {
  match try_load(source, subpath).await {
    Ok(store) => {
      info!(target: "prompt_store", %subpath, count = store.len(), "Loaded baseline prompts");
      store
    }
    Err(e) => {
      warn!(target: "prompt_store", %subpath, error = %e, "Baseline prompts unavailable; continuing with none");
      PromptStore::new()
    }
  }
}
