//! JSON file policy store
//!
//! Each key is one `<key>.json` file in the store directory. Writes go to a
//! temporary sibling first and are renamed into place, so readers never
//! observe a half-written tree.

use crate::error::{StoreError, StoreResult};
use crate::policy::PolicyTree;
use crate::store::PolicyStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Policy store backed by JSON files in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File holding the tree for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Scratch file for one write; unique per process and call.
    fn tmp_path_for(&self, key: &str) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{key}.json.tmp.{}.{seq}", std::process::id()))
    }
}

#[async_trait]
impl PolicyStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<PolicyTree> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No saved policy, starting empty");
                return Ok(PolicyTree::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    async fn put(&self, key: &str, tree: &PolicyTree) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = self.tmp_path_for(key);
        let bytes = serde_json::to_vec_pretty(tree)?;
        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Io(e));
        }

        debug!(path = %path.display(), nodes = tree.len(), "Saved policy");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
