//! Movie search against the OMDb API
//!
//! OMDb keys are rate limited, so a pool of keys is tried in order until one
//! produces an answer.

use super::types::MovieRecord;
use super::{fetch_json, SearchClient};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

const MAX_RESULTS: usize = 12;
const NOT_FOUND: &str = "Movie not found!";

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbItem>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbItem {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

impl From<OmdbItem> for MovieRecord {
    fn from(item: OmdbItem) -> Self {
        Self {
            title: item.title,
            poster: item.poster.filter(|p| p != "N/A" && !p.is_empty()),
            year: item.year,
            imdb_id: item.imdb_id,
        }
    }
}

enum KeyOutcome {
    Found(Vec<MovieRecord>),
    NoMatch,
}

pub struct MovieClient {
    client: reqwest::Client,
    base_url: String,
    api_keys: Vec<String>,
}

impl MovieClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_keys: Vec<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_keys,
        }
    }

    async fn search_with_key(&self, key: &str, query: &str) -> Result<KeyOutcome> {
        let request = self.client.get(&self.base_url).query(&[
            ("apikey", key),
            ("s", query),
            ("type", "movie"),
        ]);
        let body: OmdbResponse = fetch_json(request, "OMDb").await?;

        if body.response == "True" {
            let movies = body
                .search
                .into_iter()
                .take(MAX_RESULTS)
                .map(MovieRecord::from)
                .collect();
            return Ok(KeyOutcome::Found(movies));
        }

        match body.error.as_deref() {
            Some(NOT_FOUND) => Ok(KeyOutcome::NoMatch),
            Some(message) => Err(Error::Enrichment(format!("OMDb: {}", message))),
            None => Err(Error::Enrichment("OMDb returned no results".to_string())),
        }
    }
}

#[async_trait]
impl SearchClient for MovieClient {
    type Record = MovieRecord;

    async fn search(&self, query: &str) -> Result<Vec<MovieRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if self.api_keys.is_empty() {
            return Err(Error::Enrichment("No OMDb API keys configured".to_string()));
        }

        let mut last_error = None;
        for (idx, key) in self.api_keys.iter().enumerate() {
            match self.search_with_key(key, query).await {
                Ok(KeyOutcome::Found(movies)) => return Ok(movies),
                Ok(KeyOutcome::NoMatch) => return Ok(Vec::new()),
                Err(e) => {
                    tracing::debug!("OMDb key #{} failed: {}", idx + 1, e);
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        tracing::warn!(
            "All {} OMDb keys failed for {:?}: {}",
            self.api_keys.len(),
            query,
            reason
        );
        Err(Error::Enrichment(format!("Unable to search movies: {}", reason)))
    }

    fn name(&self) -> &str {
        "omdb"
    }
}
