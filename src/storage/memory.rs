//! In-memory persistence gateway

use super::gateway::PersistenceGateway;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Gateway backed by two in-process maps (private and public namespaces)
#[derive(Default)]
pub struct MemoryGateway {
    private: Arc<RwLock<HashMap<String, String>>>,
    public: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryGateway {
    /// Create a new empty gateway
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, is_public: bool) -> &Arc<RwLock<HashMap<String, String>>> {
        if is_public {
            &self.public
        } else {
            &self.private
        }
    }

    /// Number of stored keys across both namespaces
    pub async fn len(&self) -> usize {
        self.private.read().await.len() + self.public.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn write(&self, key: &str, blob: &str, is_public: bool) -> Result<()> {
        self.namespace(is_public)
            .write()
            .await
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    async fn read(&self, key: &str, is_public: bool) -> Result<Option<String>> {
        Ok(self.namespace(is_public).read().await.get(key).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read() {
        let gateway = MemoryGateway::new();
        assert!(gateway.is_empty().await);

        gateway.write("k", "{\"a\":1}", false).await.unwrap();
        assert_eq!(
            gateway.read("k", false).await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(gateway.len().await, 1);
    }

    #[tokio::test]
    async fn test_overwrite_last_write_wins() {
        let gateway = MemoryGateway::new();
        gateway.write("k", "1", true).await.unwrap();
        gateway.write("k", "2", true).await.unwrap();
        assert_eq!(gateway.read("k", true).await.unwrap().as_deref(), Some("2"));
        assert_eq!(gateway.len().await, 1);
    }
}
