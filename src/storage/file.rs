//! File-backed persistence gateway
//!
//! Directory layout:
//! ```text
//! <base>/
//! ├── private/
//! │   └── <owner-key>.json
//! └── public/
//!     └── view_<owner-key>.json
//! ```

use super::gateway::PersistenceGateway;
use super::share::validate_key;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Gateway that stores each key as a JSON file
pub struct FileGateway {
    private_dir: PathBuf,
    public_dir: PathBuf,
}

impl FileGateway {
    /// Create a gateway rooted at `base_dir`, creating its directories
    pub async fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        let private_dir = base_dir.join("private");
        let public_dir = base_dir.join("public");

        tokio::fs::create_dir_all(&private_dir).await?;
        tokio::fs::create_dir_all(&public_dir).await?;

        Ok(Self {
            private_dir,
            public_dir,
        })
    }

    fn path_for(&self, key: &str, is_public: bool) -> Result<PathBuf> {
        validate_key(key)?;
        let dir: &Path = if is_public {
            &self.public_dir
        } else {
            &self.private_dir
        };
        Ok(dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn write(&self, key: &str, blob: &str, is_public: bool) -> Result<()> {
        let path = self.path_for(key, is_public)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn read(&self, key: &str, is_public: bool) -> Result<Option<String>> {
        let path = self.path_for(key, is_public)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn make_gateway() -> (FileGateway, TempDir) {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path().to_path_buf()).await.unwrap();
        (gateway, dir)
    }

    #[tokio::test]
    async fn test_write_read() {
        let (gateway, dir) = make_gateway().await;
        gateway.write("user_1", "{}", false).await.unwrap();
        gateway.write("view_user_1", "{}", true).await.unwrap();

        assert!(dir.path().join("private/user_1.json").exists());
        assert!(dir.path().join("public/view_user_1.json").exists());
        assert_eq!(
            gateway.read("user_1", false).await.unwrap().as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn test_read_missing() {
        let (gateway, _dir) = make_gateway().await;
        assert!(gateway.read("user_2", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let (gateway, _dir) = make_gateway().await;
        gateway.write("k", "first", true).await.unwrap();
        gateway.write("k", "second", true).await.unwrap();
        assert_eq!(
            gateway.read("k", true).await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (gateway, _dir) = make_gateway().await;
        assert!(gateway.write("../escape", "{}", false).await.is_err());
        assert!(gateway.read("a/b", true).await.is_err());
        assert!(gateway.read("", true).await.is_err());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let gateway = FileGateway::new(dir.path().to_path_buf()).await.unwrap();
            gateway.write("user_9", "persisted", false).await.unwrap();
        }
        let gateway = FileGateway::new(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(
            gateway.read("user_9", false).await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
