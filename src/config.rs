//! Bento configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main Bento configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BentoConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistence gateway configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Enrichment provider configuration
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl BentoConfig {
    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Origin used when building shareable links
    pub public_origin: String,

    /// Path component of shareable links (the share key goes in the fragment)
    pub share_path: String,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18800,
            public_origin: "http://localhost:18800".to_string(),
            share_path: "/".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

/// Which persistence gateway backs the page registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
    Rest,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Gateway implementation
    pub backend: StorageBackend,

    /// Base directory for the file gateway
    pub base_dir: PathBuf,

    /// Base URL of a remote key/value API (rest backend only)
    pub rest_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base_dir = dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bento")
            .join("pages");

        Self {
            backend: StorageBackend::File,
            base_dir,
            rest_url: None,
        }
    }
}

/// Enrichment provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Debounce window between the last keystroke and the search request
    pub debounce_ms: u64,

    /// Env var holding a comma-separated pool of OMDb API keys
    pub omdb_api_keys_env: String,

    /// Additional OMDb API keys (tried after the env pool)
    pub omdb_api_keys: Vec<String>,

    /// Let link previews fetch loopback, private and link-local addresses
    pub allow_private_hosts: bool,

    pub omdb_url: String,
    pub itunes_url: String,
    pub bible_url: String,
    pub quran_url: String,
    pub openlibrary_url: String,
    pub covers_url: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            debounce_ms: 500,
            omdb_api_keys_env: "OMDB_API_KEYS".to_string(),
            omdb_api_keys: Vec::new(),
            allow_private_hosts: false,
            omdb_url: "https://www.omdbapi.com/".to_string(),
            itunes_url: "https://itunes.apple.com/search".to_string(),
            bible_url: "https://labs.bible.org/api/".to_string(),
            quran_url: "https://api.alquran.cloud/v1/search".to_string(),
            openlibrary_url: "https://openlibrary.org/search.json".to_string(),
            covers_url: "https://covers.openlibrary.org/b/id".to_string(),
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Resolve the OMDb key pool: env var entries first, then configured keys.
    pub fn resolve_omdb_keys(&self) -> Vec<String> {
        let from_env = std::env::var(&self.omdb_api_keys_env).unwrap_or_default();
        merge_keys(&from_env, &self.omdb_api_keys)
    }
}

fn merge_keys(env_value: &str, configured: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let candidates = env_value
        .split(',')
        .map(str::to_string)
        .chain(configured.iter().cloned());
    for key in candidates {
        let key = key.trim().to_string();
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
