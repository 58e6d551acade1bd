//! Anchor selectors: where a prompt's source text lives in a rendered document.
//!
//! These follow Hypothes.is's selector format. They are pure data; resolving
//! them against a live document is the client's business. The backend only
//! stores and returns them, so every field must survive a round trip untouched.

use serde::{Deserialize, Serialize};

/// One encoding of a prompt's anchor. A prompt usually carries several
/// redundant selectors which the resolver tries in stored order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
  RangeSelector(RangeSelector),
  TextPositionSelector(TextPositionSelector),
  TextQuoteSelector(TextQuoteSelector),
}

/// DOM-path-relative character offsets. Containers are XPath strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RangeSelector {
  pub start_offset: u64,
  pub end_offset: u64,
  pub start_container: String,
  pub end_container: String,
}

/// Index range within the flattened visible text of the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextPositionSelector {
  pub start: u64,
  pub end: u64,
}

/// Fuzzy quote match with surrounding context; the fallback after edits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextQuoteSelector {
  pub exact: String,
  pub prefix: String,
  pub suffix: String,
}
