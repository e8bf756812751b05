//! REST persistence gateway
//!
//! Talks to a remote key/value API exposing
//! `GET/PUT {base}/api/v1/storage/:key?public=bool`, such as another Bento
//! server's storage router.

use super::gateway::PersistenceGateway;
use super::share::validate_key;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Gateway backed by a remote HTTP key/value API
pub struct RestGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl RestGateway {
    /// Create a gateway for the API rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid storage URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Storage URL '{}' cannot be a base",
                base_url
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/api/v1/storage/{key}` with `key` as one escaped path segment
    fn url(&self, key: &str) -> Result<Url> {
        validate_key(key)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!("Storage URL '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "v1", "storage", key]);
        Ok(url)
    }
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    async fn write(&self, key: &str, blob: &str, is_public: bool) -> Result<()> {
        let response = self
            .client
            .put(self.url(key)?)
            .query(&[("public", is_public)])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(blob.to_string())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to write '{}': {}", key, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Storage(format!(
                "Storage API rejected write of '{}': {}",
                key, status
            )));
        }
        Ok(())
    }

    async fn read(&self, key: &str, is_public: bool) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.url(key)?)
            .query(&[("public", is_public)])
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read '{}': {}", key, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to read '{}': {}", key, e)))?;
                Ok(Some(body))
            }
            status => Err(Error::Storage(format!(
                "Storage API rejected read of '{}': {}",
                key, status
            ))),
        }
    }

    fn name(&self) -> &str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{storage_router, MemoryGateway, StorageState};
    use crate::testing::serve;
    use std::sync::Arc;

    async fn make_gateway() -> (RestGateway, Arc<MemoryGateway>) {
        let backing = Arc::new(MemoryGateway::new());
        let base = serve(storage_router(StorageState {
            gateway: backing.clone(),
        }))
        .await;
        let gateway = RestGateway::new(&base, Duration::from_secs(5)).unwrap();
        (gateway, backing)
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (gateway, backing) = make_gateway().await;
        gateway.write("user_1", r#"{"a":1}"#, false).await.unwrap();

        assert_eq!(
            backing.read("user_1", false).await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert_eq!(
            gateway.read("user_1", false).await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[tokio::test]
    async fn test_public_namespace() {
        let (gateway, backing) = make_gateway().await;
        gateway.write("view_user_1", "{}", true).await.unwrap();

        assert!(backing.read("view_user_1", true).await.unwrap().is_some());
        assert!(gateway.read("view_user_1", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let (gateway, _backing) = make_gateway().await;
        assert!(gateway.read("nobody", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_write_is_error() {
        let (gateway, _backing) = make_gateway().await;
        let result = gateway.write("user_1", "not json", false).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_url_keeps_base_path() {
        let gateway = RestGateway::new("http://kv.example/bento/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            gateway.url("user_1").unwrap().as_str(),
            "http://kv.example/bento/api/v1/storage/user_1"
        );
    }

    #[tokio::test]
    async fn test_unsafe_keys_never_reach_the_server() {
        let (gateway, backing) = make_gateway().await;
        gateway.write("user_1", r#"{"a":1}"#, false).await.unwrap();

        for key in ["user_1#x", "a/b", "user_1?public=true", ""] {
            assert!(matches!(
                gateway.write(key, "{}", false).await,
                Err(Error::InvalidInput(_))
            ));
            assert!(matches!(
                gateway.read(key, false).await,
                Err(Error::InvalidInput(_))
            ));
        }
        assert_eq!(backing.len().await, 1);
        assert_eq!(
            backing.read("user_1", false).await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RestGateway::new("not a url", Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        let gateway = RestGateway::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            gateway.read("user_1", false).await,
            Err(Error::Storage(_))
        ));
    }
}
