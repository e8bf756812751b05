//! Page registry: one card store per owner key, loaded on first access

use crate::cards::store::CardStore;
use crate::cards::types::PageSnapshot;
use crate::error::{Error, Result};
use crate::storage::share::{
    generate_owner_key, owner_of, share_url, validate_key, validate_owner_key,
};
use crate::storage::{load_shared, load_snapshot, PersistenceGateway};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Open pages keyed by owner key
pub struct PageRegistry {
    gateway: Arc<dyn PersistenceGateway>,
    public_origin: String,
    share_path: String,
    pages: RwLock<HashMap<String, Arc<CardStore>>>,
}

impl PageRegistry {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        public_origin: impl Into<String>,
        share_path: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            public_origin: public_origin.into(),
            share_path: share_path.into(),
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub fn gateway(&self) -> Arc<dyn PersistenceGateway> {
        self.gateway.clone()
    }

    /// Public URL under which the owner's page is shared
    pub fn share_url(&self, owner_key: &str) -> String {
        share_url(&self.public_origin, &self.share_path, owner_key)
    }

    /// Create a page under a freshly generated owner key.
    ///
    /// The page is not held open; it is stored on its first mutation.
    pub fn create(&self) -> CardStore {
        let owner_key = generate_owner_key();
        let link = self.share_url(&owner_key);
        CardStore::new(owner_key, link, self.gateway.clone())
    }

    /// Return the store for `owner_key`, loading its snapshot on first access.
    ///
    /// A missing snapshot starts an empty page. A failed read is returned
    /// and not cached, so the next call retries the load.
    pub async fn open(&self, owner_key: &str) -> Result<Arc<CardStore>> {
        validate_owner_key(owner_key)?;

        if let Some(store) = self.pages.read().await.get(owner_key) {
            return Ok(store.clone());
        }

        let mut pages = self.pages.write().await;
        if let Some(store) = pages.get(owner_key) {
            return Ok(store.clone());
        }

        let store = Arc::new(self.load(owner_key).await?);
        pages.insert(owner_key.to_string(), store.clone());
        Ok(store)
    }

    /// Current snapshot of `owner_key` without keeping the page open.
    ///
    /// Serves reads of pages that are not held in memory, so looking at a
    /// page never grows the registry.
    pub async fn snapshot(&self, owner_key: &str) -> Result<PageSnapshot> {
        validate_owner_key(owner_key)?;

        let cached = self.pages.read().await.get(owner_key).cloned();
        if let Some(store) = cached {
            return Ok(store.snapshot().await);
        }
        Ok(self.load(owner_key).await?.snapshot().await)
    }

    async fn load(&self, owner_key: &str) -> Result<CardStore> {
        let store = match load_snapshot(self.gateway.as_ref(), owner_key).await? {
            Some(mut snapshot) => {
                tracing::info!(
                    "Loaded page {} with {} cards",
                    owner_key,
                    snapshot.content.len()
                );
                if snapshot.user_id != owner_key {
                    tracing::warn!(
                        "Snapshot stored under {} claims owner {}; using the storage key",
                        owner_key,
                        snapshot.user_id
                    );
                    snapshot.user_id = owner_key.to_string();
                    snapshot.shareable_link = String::new();
                }
                if snapshot.shareable_link.is_empty() {
                    snapshot.shareable_link = self.share_url(owner_key);
                }
                CardStore::from_snapshot(snapshot, self.gateway.clone())
            }
            None => {
                tracing::debug!("No stored page for {}; starting empty", owner_key);
                CardStore::new(owner_key, self.share_url(owner_key), self.gateway.clone())
            }
        };
        Ok(store)
    }

    /// Read-only snapshot published under `share_key`
    pub async fn shared(&self, share_key: &str) -> Result<PageSnapshot> {
        if owner_of(share_key).is_none() {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a share key",
                share_key
            )));
        }
        validate_key(share_key)?;
        load_shared(self.gateway.as_ref(), share_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Shared page '{}' not found", share_key)))
    }

    /// Number of pages currently held in memory
    pub async fn open_count(&self) -> usize {
        self.pages.read().await.len()
    }
}
