//! Persistence gateways for page snapshots
//!
//! Snapshots are stored as JSON strings under a private owner key and a
//! derived public share key. Three backends are provided: in-memory,
//! JSON files on disk, and a remote REST key/value API.

pub mod gateway;
pub mod share;

mod file;
mod handler;
mod memory;
mod rest;

pub use file::FileGateway;
pub use gateway::{load_shared, load_snapshot, save_snapshot, PersistenceGateway};
pub use handler::{storage_router, StorageState};
pub use memory::MemoryGateway;
pub use rest::RestGateway;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Open the gateway selected by the storage configuration
pub async fn open_gateway(
    config: &StorageConfig,
    timeout: Duration,
) -> Result<Arc<dyn PersistenceGateway>> {
    let gateway: Arc<dyn PersistenceGateway> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryGateway::new()),
        StorageBackend::File => Arc::new(FileGateway::new(config.base_dir.clone()).await?),
        StorageBackend::Rest => {
            let url = config.rest_url.as_deref().ok_or_else(|| {
                Error::Config("storage.rest_url is required for the rest backend".to_string())
            })?;
            Arc::new(RestGateway::new(url, timeout)?)
        }
    };
    tracing::info!("Using {} persistence gateway", gateway.name());
    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_memory() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        let gateway = open_gateway(&config, Duration::from_secs(1)).await.unwrap();
        assert_eq!(gateway.name(), "memory");
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            base_dir: dir.path().join("pages"),
            rest_url: None,
        };
        let gateway = open_gateway(&config, Duration::from_secs(1)).await.unwrap();
        assert_eq!(gateway.name(), "file");
        assert!(dir.path().join("pages/private").is_dir());
    }

    #[tokio::test]
    async fn test_open_rest_requires_url() {
        let config = StorageConfig {
            backend: StorageBackend::Rest,
            rest_url: None,
            ..Default::default()
        };
        assert!(matches!(
            open_gateway(&config, Duration::from_secs(1)).await,
            Err(Error::Config(_))
        ));
    }
}
