//! Loading backend configuration from TOML plus a few environment overrides.
//!
//! See `OverlayConfig` for the expected schema. Every key is optional.
//!
//! ```toml
//! prompt_data_dir = "./static/promptData"
//! persistence_dir = "./data/prompts"
//! prompt_config_path = "./static/prompt-config.json"
//! document_base_url = "https://example.org/"
//! shuffle_review_queue = false
//!
//! [attachment_hosts]
//! "shape-up" = "https://basecamp.com"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::loader::ContentSource;
use crate::persistence::Persistence;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
  /// Directory of `<subpath>.json` baseline files.
  pub prompt_data_dir: Option<PathBuf>,
  /// Remote base URL for baseline files; wins over `prompt_data_dir`.
  pub content_base_url: Option<String>,
  /// Where sessions are persisted. In-memory when absent.
  pub persistence_dir: Option<PathBuf>,
  /// JSON file backing the `/config`, `/page`, `/inline` stub endpoints.
  pub prompt_config_path: Option<PathBuf>,
  /// Site root that documents are served under. A document's page URL is its
  /// path joined onto this, unless the client reports the page's own base URL.
  pub document_base_url: String,
  /// First path segment of a resolved attachment -> publication host.
  pub attachment_hosts: BTreeMap<String, String>,
  pub shuffle_review_queue: bool,
}

impl Default for OverlayConfig {
  fn default() -> Self {
    let mut attachment_hosts = BTreeMap::new();
    attachment_hosts.insert("shape-up".into(), "https://basecamp.com".into());
    attachment_hosts.insert("ims".into(), "https://openintro-ims.netlify.app".into());
    Self {
      prompt_data_dir: Some(PathBuf::from("./static/promptData")),
      content_base_url: None,
      persistence_dir: None,
      prompt_config_path: None,
      document_base_url: "http://localhost:3000/".into(),
      attachment_hosts,
      shuffle_review_queue: false,
    }
  }
}

impl OverlayConfig {
  /// Which baseline source this config selects.
  pub fn content_source(&self) -> ContentSource {
    if let Some(url) = &self.content_base_url {
      ContentSource::http(url.clone())
    } else if let Some(dir) = &self.prompt_data_dir {
      ContentSource::Dir(dir.clone())
    } else {
      ContentSource::None
    }
  }

  pub fn persistence(&self) -> Persistence {
    match &self.persistence_dir {
      Some(dir) => Persistence::JsonDir(dir.clone()),
      None => Persistence::memory(),
    }
  }

  /// Apply `PROMPT_DATA_DIR`, `CONTENT_BASE_URL`, `PERSISTENCE_DIR`, `DOCUMENT_BASE_URL`.
  fn apply_env(mut self) -> Self {
    if let Ok(v) = std::env::var("PROMPT_DATA_DIR") { self.prompt_data_dir = Some(v.into()); }
    if let Ok(v) = std::env::var("CONTENT_BASE_URL") { self.content_base_url = Some(v); }
    if let Ok(v) = std::env::var("PERSISTENCE_DIR") { self.persistence_dir = Some(v.into()); }
    if let Ok(v) = std::env::var("DOCUMENT_BASE_URL") { self.document_base_url = v; }
    self
  }
}

/// Parse a TOML document into a config.
pub fn parse_config(s: &str) -> Result<OverlayConfig, toml::de::Error> {
  toml::from_str::<OverlayConfig>(s)
}

/// Load from OVERLAY_CONFIG_PATH (if set) then apply env overrides.
/// Any read/parse error falls back to defaults.
pub fn load_config_from_env() -> OverlayConfig {
  let base = match std::env::var("OVERLAY_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "orbit_backend", %path, "Loaded overlay config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "orbit_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
          OverlayConfig::default()
        }
      },
      Err(e) => {
        error!(target: "orbit_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
        OverlayConfig::default()
      }
    },
    Err(_) => OverlayConfig::default(),
  };
  base.apply_env()
}
