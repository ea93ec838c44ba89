//! In-process policy store

use crate::error::StoreResult;
use crate::policy::PolicyTree;
use crate::store::PolicyStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Policy store backed by a map; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    trees: RwLock<HashMap<String, PolicyTree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `tree` under `key`.
    pub fn with_tree(key: impl Into<String>, tree: PolicyTree) -> Self {
        let store = Self::new();
        store.write_trees().insert(key.into(), tree);
        store
    }

    fn write_trees(&self) -> RwLockWriteGuard<'_, HashMap<String, PolicyTree>> {
        self.trees.write().unwrap_or_else(|poisoned| {
            tracing::warn!("memory store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_trees(&self) -> RwLockReadGuard<'_, HashMap<String, PolicyTree>> {
        self.trees.read().unwrap_or_else(|poisoned| {
            tracing::warn!("memory store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<PolicyTree> {
        Ok(self.read_trees().get(key).cloned().unwrap_or_default())
    }

    async fn put(&self, key: &str, tree: &PolicyTree) -> StoreResult<()> {
        self.write_trees().insert(key.to_string(), tree.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::build_tree;

    #[tokio::test]
    async fn test_missing_key_is_empty_tree() {
        let store = MemoryStore::new();
        assert!(store.get("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        let tree = build_tree(["/a/b"], PolicyTree::new());
        store.put("k", &tree).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), tree);
        assert!(store.get("other").await.unwrap().is_empty());
    }
}
