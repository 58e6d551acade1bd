//! Persistence provider for prompt stores, keyed by document.
//!
//! Only get-all / set-all is offered. Last write wins; there is no
//! cross-session transaction.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::PersistError;
use crate::store::PromptStore;

#[derive(Clone, Debug)]
pub enum Persistence {
  /// Process-local; lost on restart.
  Memory(Arc<RwLock<HashMap<String, PromptStore>>>),
  /// One `<key>.json` file per document under the directory.
  JsonDir(PathBuf),
}

/// Map a document key to a file stem, one-to-one. ASCII alphanumerics and `-`
/// pass through; every other byte (`_` and `.` included) becomes `_XX` hex.
fn file_stem(key: &str) -> String {
  let mut stem = String::with_capacity(key.len());
  for b in key.bytes() {
    if b.is_ascii_alphanumeric() || b == b'-' {
      stem.push(b as char);
    } else {
      stem.push_str(&format!("_{:02X}", b));
    }
  }
  stem
}

impl Persistence {
  pub fn memory() -> Self {
    Persistence::Memory(Arc::new(RwLock::new(HashMap::new())))
  }

  /// Everything persisted for `key`, or `None` if nothing was ever stored.
  #[instrument(level = "debug", skip(self))]
  pub async fn get_all(&self, key: &str) -> Result<Option<PromptStore>, PersistError> {
    match self {
      Persistence::Memory(map) => Ok(map.read().await.get(key).cloned()),
      Persistence::JsonDir(dir) => {
        let path = dir.join(format!("{}.json", file_stem(key)));
        match tokio::fs::read_to_string(&path).await {
          Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
          Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
          Err(e) => Err(e.into()),
        }
      }
    }
  }

  /// Replace everything persisted for `key` with `store`.
  #[instrument(level = "debug", skip(self, store), fields(count = store.len()))]
  pub async fn set_all(&self, key: &str, store: &PromptStore) -> Result<(), PersistError> {
    match self {
      Persistence::Memory(map) => {
        map.write().await.insert(key.to_string(), store.clone());
      }
      Persistence::JsonDir(dir) => {
        tokio::fs::create_dir_all(dir).await?;
        let stem = file_stem(key);
        let path = dir.join(format!("{}.json", stem));
        let tmp = dir.join(format!("{}.json.tmp", stem));
        let body = serde_json::to_vec_pretty(store)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(target: "prompt_store", %key, path = %path.display(), "Persisted prompts");
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Prompt;

  fn sample() -> PromptStore {
    let mut s = PromptStore::new();
    s.create("p1", Prompt::user_created("Q", "A"));
    s.save("p1").unwrap();
    s
  }

  #[tokio::test]
  async fn memory_round_trip() {
    let p = Persistence::memory();
    assert_eq!(p.get_all("doc").await.unwrap(), None);
    p.set_all("doc", &sample()).await.unwrap();
    assert_eq!(p.get_all("doc").await.unwrap(), Some(sample()));
  }

  #[tokio::test]
  async fn json_dir_round_trip_and_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    let p = Persistence::JsonDir(tmp.path().join("store"));
    assert_eq!(p.get_all("shapeup/ch-1").await.unwrap(), None);

    p.set_all("shapeup/ch-1", &sample()).await.unwrap();
    assert!(tmp.path().join("store/shapeup_2Fch-1.json").exists());
    assert_eq!(p.get_all("shapeup/ch-1").await.unwrap(), Some(sample()));

    p.set_all("shapeup/ch-1", &PromptStore::new()).await.unwrap();
    assert_eq!(p.get_all("shapeup/ch-1").await.unwrap(), Some(PromptStore::new()));
  }

  #[tokio::test]
  async fn corrupt_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("doc.json"), "[[[").unwrap();
    let p = Persistence::JsonDir(tmp.path().to_path_buf());
    assert!(matches!(p.get_all("doc").await, Err(PersistError::Json(_))));
  }

  #[test]
  fn keys_are_escaped_one_to_one() {
    assert_eq!(file_stem("shapeup/ch-1"), "shapeup_2Fch-1");
    assert_eq!(file_stem("shapeup_ch-1"), "shapeup_5Fch-1");
    assert_eq!(file_stem("../x"), "_2E_2E_2Fx");
    assert_eq!(file_stem(".hidden"), "_2Ehidden");
    assert_eq!(file_stem("hidden"), "hidden");
    assert_eq!(file_stem("ims/été"), "ims_2F_C3_A9t_C3_A9");
  }

  #[tokio::test]
  async fn similar_keys_do_not_share_state() {
    let tmp = tempfile::tempdir().unwrap();
    let p = Persistence::JsonDir(tmp.path().to_path_buf());

    p.set_all("shapeup/ch-1", &sample()).await.unwrap();
    assert_eq!(p.get_all("shapeup_ch-1").await.unwrap(), None);

    p.set_all(".hidden", &PromptStore::new()).await.unwrap();
    assert_eq!(p.get_all("hidden").await.unwrap(), None);
    assert_eq!(p.get_all("shapeup/ch-1").await.unwrap(), Some(sample()));
  }
}
