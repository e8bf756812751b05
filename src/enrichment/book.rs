//! Book search against the Open Library search API

use super::types::BookRecord;
use super::{fetch_json, SearchClient};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const LIMIT: &str = "20";
const MAX_RESULTS: usize = 12;
const UNKNOWN_AUTHOR: &str = "Unknown Author";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author_name: Vec<String>,
    cover_i: Option<i64>,
    #[serde(default)]
    key: String,
    first_publish_year: Option<i32>,
}

pub struct BookClient {
    client: reqwest::Client,
    base_url: String,
    covers_url: String,
}

impl BookClient {
    pub fn new(client: reqwest::Client, base_url: &str, covers_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            covers_url: covers_url.trim_end_matches('/').to_string(),
        }
    }

    fn cover_url(&self, cover_id: i64) -> String {
        format!("{}/{}-L.jpg", self.covers_url, cover_id)
    }
}

#[async_trait]
impl SearchClient for BookClient {
    type Record = BookRecord;

    async fn search(&self, query: &str) -> Result<Vec<BookRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("limit", LIMIT)]);
        let body: SearchResponse = fetch_json(request, "Open Library").await?;

        // Only books with a cover can be rendered as a card.
        Ok(body
            .docs
            .into_iter()
            .filter_map(|doc| {
                let cover = self.cover_url(doc.cover_i?);
                Some(BookRecord {
                    title: doc.title,
                    author: doc
                        .author_name
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                    cover,
                    key: doc.key,
                    first_publish_year: doc.first_publish_year,
                })
            })
            .take(MAX_RESULTS)
            .collect())
    }

    fn name(&self) -> &str {
        "openlibrary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    async fn mock_openlibrary() -> String {
        let router = Router::new().route(
            "/search.json",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("limit").map(String::as_str), Some("20"));
                let mut docs = vec![
                    serde_json::json!({
                        "title": "Dune",
                        "author_name": ["Frank Herbert", "Someone Else"],
                        "cover_i": 11481354,
                        "key": "/works/OL893415W",
                        "first_publish_year": 1965
                    }),
                    serde_json::json!({
                        "title": "Coverless",
                        "key": "/works/OL1W"
                    }),
                    serde_json::json!({
                        "title": "Anonymous Work",
                        "cover_i": 42,
                        "key": "/works/OL2W"
                    }),
                ];
                for i in 0..15 {
                    docs.push(serde_json::json!({
                        "title": format!("Filler {}", i),
                        "author_name": ["A"],
                        "cover_i": 1000 + i,
                        "key": format!("/works/F{}", i)
                    }));
                }
                Json(serde_json::json!({"numFound": docs.len(), "docs": docs}))
            }),
        );
        serve(router).await
    }

    #[tokio::test]
    async fn test_search_normalizes_books() {
        let base = mock_openlibrary().await;
        let books = BookClient::new(
            client(),
            &format!("{}/search.json", base),
            "https://covers.openlibrary.org/b/id/",
        );

        let results = books.search("dune").await.unwrap();
        assert_eq!(results.len(), MAX_RESULTS);

        let dune = &results[0];
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.author, "Frank Herbert");
        assert_eq!(dune.cover, "https://covers.openlibrary.org/b/id/11481354-L.jpg");
        assert_eq!(dune.key, "/works/OL893415W");
        assert_eq!(dune.first_publish_year, Some(1965));

        // coverless docs are skipped, missing authors are defaulted
        assert_eq!(results[1].title, "Anonymous Work");
        assert_eq!(results[1].author, "Unknown Author");
        assert_eq!(results[1].first_publish_year, None);
    }

    #[tokio::test]
    async fn test_blank_query() {
        let books = BookClient::new(client(), "http://127.0.0.1:9/search.json", "https://c");
        assert!(books.search("").await.unwrap().is_empty());
    }
}
