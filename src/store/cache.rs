//! Read-through cache in front of a policy store
//!
//! The gate reads the policy on every request, so trees are cached per key.
//! A successful `put` replaces the cached entry before it returns; a failed
//! one evicts it. A read that raced a write never installs the tree it read
//! once the write has landed.

use crate::error::StoreResult;
use crate::policy::PolicyTree;
use crate::store::{PolicyStore, SharedPolicyStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Caching wrapper around another [`PolicyStore`]
pub struct CachedStore {
    inner: SharedPolicyStore,
    entries: RwLock<HashMap<String, Arc<PolicyTree>>>,
    /// Bumped on every write
    generation: AtomicU64,
}

impl CachedStore {
    pub fn new(inner: SharedPolicyStore) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Shared view of the tree under `key`, from cache when possible.
    pub async fn load(&self, key: &str) -> StoreResult<Arc<PolicyTree>> {
        let cached = self.read_entries().get(key).cloned();
        if let Some(tree) = cached {
            trace!(key, "Policy cache hit");
            return Ok(tree);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let tree = Arc::new(self.inner.get(key).await?);

        let mut entries = self.write_entries();
        if self.generation.load(Ordering::Acquire) == generation {
            entries.insert(key.to_string(), Arc::clone(&tree));
        }
        Ok(tree)
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        let mut entries = self.write_entries();
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<PolicyTree>>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("policy cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<PolicyTree>>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("policy cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl PolicyStore for CachedStore {
    async fn get(&self, key: &str) -> StoreResult<PolicyTree> {
        self.load(key).await.map(|tree| (*tree).clone())
    }

    async fn put(&self, key: &str, tree: &PolicyTree) -> StoreResult<()> {
        let result = self.inner.put(key, tree).await;

        let mut entries = self.write_entries();
        self.generation.fetch_add(1, Ordering::AcqRel);
        match &result {
            Ok(()) => {
                entries.insert(key.to_string(), Arc::new(tree.clone()));
            }
            Err(_) => {
                entries.remove(key);
            }
        }
        result
    }

    fn backend(&self) -> &'static str {
        self.inner.backend()
    }
}
