//! Policy store module
//!
//! Persists the operator's policy tree under a single key. The core only
//! needs get/put with read-your-writes on that key; concurrent writers are
//! not coordinated and the last write wins.

pub mod cache;
pub mod file;
pub mod memory;

pub use cache::CachedStore;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{ConfigError, StoreResult};
use crate::policy::PolicyTree;
// async_trait required for dyn-compatibility with Arc<dyn PolicyStore>
use async_trait::async_trait;
use std::sync::Arc;

/// Key-value persistence for policy trees
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Load the tree saved under `key`; an absent key is an empty tree.
    async fn get(&self, key: &str) -> StoreResult<PolicyTree>;

    /// Replace the tree saved under `key`.
    async fn put(&self, key: &str, tree: &PolicyTree) -> StoreResult<()>;

    /// Backend name (for logging)
    fn backend(&self) -> &'static str;
}

/// Shared store handle
pub type SharedPolicyStore = Arc<dyn PolicyStore>;

/// Create the configured store backend
pub fn create_store(config: &StoreConfig) -> Result<SharedPolicyStore, ConfigError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File => {
            let path = config.path.as_deref().ok_or_else(|| ConfigError::Missing {
                field: "store.path".to_string(),
            })?;
            Ok(Arc::new(FileStore::new(shellexpand::tilde(path).as_ref())))
        }
    }
}
