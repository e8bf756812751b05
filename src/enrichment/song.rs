//! Song search against the iTunes Search API

use super::types::SongRecord;
use super::{fetch_json, SearchClient};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const LIMIT: &str = "20";

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesTrack {
    track_id: Option<u64>,
    track_name: Option<String>,
    #[serde(default)]
    artist_name: String,
    artwork_url100: Option<String>,
    preview_url: Option<String>,
    collection_name: Option<String>,
}

impl ItunesTrack {
    fn into_record(self) -> Option<SongRecord> {
        Some(SongRecord {
            title: self.track_name?,
            artist: self.artist_name,
            artwork: self.artwork_url100.map(|url| url.replace("100x100", "600x600")),
            preview: self.preview_url,
            track_id: self.track_id?,
            album: self.collection_name,
        })
    }
}

pub struct SongClient {
    client: reqwest::Client,
    base_url: String,
}

impl SongClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl SearchClient for SongClient {
    type Record = SongRecord;

    async fn search(&self, query: &str) -> Result<Vec<SongRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.client.get(&self.base_url).query(&[
            ("term", query),
            ("entity", "song"),
            ("limit", LIMIT),
        ]);
        let body: ItunesResponse = fetch_json(request, "iTunes").await?;

        // Non-track entries (no id or name) are dropped.
        Ok(body
            .results
            .into_iter()
            .filter_map(ItunesTrack::into_record)
            .collect())
    }

    fn name(&self) -> &str {
        "itunes"
    }
}
