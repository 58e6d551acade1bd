//! The boundary with the external review surface.
//!
//! Outbound: compose the review queue (ids + question/answer text, with image
//! answers passed as attachments). Inbound: fold each review outcome back into
//! the prompt store, in the order the review surface emitted them.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::{PromptId, ReviewOutcome};
use crate::error::{ReviewError, StoreError};
use crate::store::PromptStore;

/// What a review session was started from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReviewQueueMode {
  /// A list of prompts chosen by the author.
  List {
    #[serde(rename = "promptIds")]
    prompt_ids: Vec<PromptId>,
  },
  /// Everything the reader has saved that is currently due.
  User,
}

/// One entry handed to the review surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
  pub id: PromptId,
  pub question: String,
  /// Empty when the answer is an image attachment.
  pub answer: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub answer_attachments: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSyncReport {
  pub applied: Vec<PromptId>,
  pub missing: Vec<PromptId>,
}

/// Rewrites relative image sources to absolute URLs on the original
/// publication hosts (the review surface cannot reach local URLs).
///
/// Sources are relative to the page they appear on, so every lookup takes a
/// page base; see [`AttachmentResolver::page_base`].
#[derive(Clone, Debug)]
pub struct AttachmentResolver {
  site: Url,
  hosts: BTreeMap<String, String>,
}

fn parse_base(url: &str) -> Result<Url, ReviewError> {
  Url::parse(url).map_err(|e| ReviewError::InvalidBaseUrl(format!("{url}: {e}")))
}

fn img_src_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r#"<img src="(.+?)".+$"#).expect("static regex"))
}

impl AttachmentResolver {
  pub fn new(base_url: &str, hosts: BTreeMap<String, String>) -> Result<Self, ReviewError> {
    let site = parse_base(base_url)?;
    Ok(Self { site, hosts })
  }

  /// The URL a page's relative image sources resolve against: the page's own
  /// `base_uri` when the client reports one, otherwise the document path
  /// under the configured site base.
  pub fn page_base(&self, document: &str, base_uri: Option<&str>) -> Result<Url, ReviewError> {
    match base_uri {
      Some(uri) => parse_base(uri),
      None => self.site
        .join(document.trim_start_matches('/'))
        .map_err(|e| ReviewError::InvalidBaseUrl(format!("{document}: {e}"))),
    }
  }

  /// Absolute attachment URL for an answer containing `<img src="...">`, if any.
  pub fn attachment_url(&self, page: &Url, text: &str) -> Result<Option<String>, ReviewError> {
    let Some(caps) = img_src_regex().captures(text) else {
      return Ok(None);
    };
    let src = &caps[1];
    let resolved = page
      .join(src)
      .map_err(|_| ReviewError::UnsupportedAttachment(src.to_string()))?;

    let mut segments = resolved.path().trim_start_matches('/').splitn(2, '/');
    let prefix = segments.next().unwrap_or_default();
    let rest = segments.next().unwrap_or_default();
    match self.hosts.get(prefix) {
      Some(host) => Ok(Some(format!("{}/{}", host.trim_end_matches('/'), rest))),
      None => Err(ReviewError::UnsupportedAttachment(resolved.to_string())),
    }
  }
}

/// Build the queue for a review session. Queue ids must all exist.
#[instrument(level = "info", skip(store, resolver, page), fields(page = %page))]
pub fn build_review_queue(
  store: &PromptStore,
  mode: &ReviewQueueMode,
  resolver: &AttachmentResolver,
  page: &Url,
  shuffle: bool,
) -> Result<Vec<ReviewItem>, ReviewError> {
  let mut ids = match mode {
    ReviewQueueMode::List { prompt_ids } => prompt_ids.clone(),
    ReviewQueueMode::User => store.due_ids(),
  };
  if shuffle {
    ids.shuffle(&mut rand::thread_rng());
  }

  ids.into_iter()
    .map(|id| {
      let prompt = store.get(&id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
      let attachment = resolver.attachment_url(page, &prompt.content.back)?;
      let answer = if attachment.is_some() { String::new() } else { prompt.content.back.clone() };
      Ok::<_, ReviewError>(ReviewItem {
        question: prompt.content.front.clone(),
        answer,
        answer_attachments: attachment,
        id,
      })
    })
    .collect()
}

/// Apply outcomes exactly once each, in emission order. An outcome for an
/// unknown prompt is logged and skipped; the rest still apply.
#[instrument(level = "info", skip(store, outcomes), fields(count = outcomes.len()))]
pub fn apply_review_outcomes(store: &mut PromptStore, outcomes: &[ReviewOutcome]) -> ReviewSyncReport {
  let mut report = ReviewSyncReport::default();
  for outcome in outcomes {
    match store.sync_from_review(outcome) {
      Ok(()) => report.applied.push(outcome.id.clone()),
      Err(StoreError::NotFound(id)) => {
        warn!(target: "prompt_store", %id, "Review outcome for unknown prompt; skipped");
        report.missing.push(id);
      }
    }
  }
  debug!(target: "prompt_store", applied = report.applied.len(), missing = report.missing.len(), "Review outcomes applied");
  report
}

/// Upsell line shown once a review completes and more prompts are due.
pub fn due_message(count: usize) -> String {
  if count > 1 {
    format!("{} other prompts you saved on this page are ready for review.", count)
  } else {
    format!("{} other prompt you saved on this page is ready for review.", count)
  }
}
