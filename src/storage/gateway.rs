//! Persistence gateway interface and snapshot helpers
//!
//! A gateway is a plain key/value store of UTF-8 JSON strings with a
//! private and a public namespace. Every save writes the owner's private key
//! and the derived public share key together, so the shared view always
//! reflects the latest edit.

use crate::cards::types::PageSnapshot;
use crate::error::Result;
use crate::storage::share::share_key;
use async_trait::async_trait;

/// Key/value persistence backend.
///
/// Writes are upserts with last-write-wins semantics; there is no
/// versioning and no conflict detection.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store `blob` under `key`, replacing any previous value.
    async fn write(&self, key: &str, blob: &str, is_public: bool) -> Result<()>;

    /// Fetch the value stored under `key`, or `None` if absent.
    async fn read(&self, key: &str, is_public: bool) -> Result<Option<String>>;

    /// Backend name used in logs.
    fn name(&self) -> &str;
}

/// Write a snapshot under both the owner key and its share key.
pub async fn save_snapshot(
    gateway: &dyn PersistenceGateway,
    snapshot: &PageSnapshot,
) -> Result<()> {
    let blob = serde_json::to_string(snapshot)?;
    gateway.write(&snapshot.user_id, &blob, false).await?;
    gateway
        .write(&share_key(&snapshot.user_id), &blob, true)
        .await?;
    tracing::debug!(
        "Saved page {} ({} cards) via {}",
        snapshot.user_id,
        snapshot.content.len(),
        gateway.name()
    );
    Ok(())
}

/// Load the owner's private snapshot.
pub async fn load_snapshot(
    gateway: &dyn PersistenceGateway,
    owner_key: &str,
) -> Result<Option<PageSnapshot>> {
    match gateway.read(owner_key, false).await? {
        Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
        None => Ok(None),
    }
}

/// Load the public snapshot published under a share key.
pub async fn load_shared(
    gateway: &dyn PersistenceGateway,
    share_key: &str,
) -> Result<Option<PageSnapshot>> {
    match gateway.read(share_key, true).await? {
        Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
        None => Ok(None),
    }
}
