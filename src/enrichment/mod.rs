//! Enrichment clients for movie, song, verse, book and link-preview lookups
//!
//! Each client turns a free-text query into normalized records. Empty or
//! whitespace queries resolve to an empty list without touching the
//! network; provider failures surface as [`Error::Enrichment`], distinct
//! from a successful search with zero matches.
//!
//! [`SearchSession`] layers keystroke debouncing and stale-response
//! suppression on top of any [`SearchClient`].

pub mod types;

mod book;
mod handler;
mod movie;
mod preview;
mod session;
mod song;
mod verse;

pub use book::BookClient;
pub use handler::{enrichment_router, EnrichmentState};
pub use movie::MovieClient;
pub use preview::PreviewClient;
pub use session::{SearchSession, SearchState};
pub use song::SongClient;
pub use types::*;
pub use verse::VerseClient;

use crate::cards::types::CardPayload;
use crate::config::EnrichmentConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// A provider search returning normalized records
#[async_trait]
pub trait SearchClient: Send + Sync + 'static {
    type Record: Clone + Send + Sync + 'static;

    /// Search the provider. Blank queries return `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<Self::Record>>;

    /// Provider name used in logs and errors
    fn name(&self) -> &str;
}

/// Build the shared HTTP client used by every provider
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bento/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Send a request and decode a JSON body, mapping every failure to
/// `Error::Enrichment`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Enrichment(format!("{} request failed: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Enrichment(format!("{} returned {}", provider, status)));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Enrichment(format!("Failed to parse {} response: {}", provider, e)))
}

/// All providers behind one facade, dispatching on the search kind
pub struct Enrichment {
    movie: MovieClient,
    song: SongClient,
    bible: VerseClient,
    quran: VerseClient,
    book: BookClient,
    preview: PreviewClient,
    debounce: Duration,
}

impl Enrichment {
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self> {
        let client = http_client(config.timeout())?;
        let keys = config.resolve_omdb_keys();
        if keys.is_empty() {
            tracing::warn!(
                "No OMDb API keys configured (set {}); movie search will fail",
                config.omdb_api_keys_env
            );
        }

        Ok(Self {
            movie: MovieClient::new(client.clone(), &config.omdb_url, keys),
            song: SongClient::new(client.clone(), &config.itunes_url),
            bible: VerseClient::new(client.clone(), &config.bible_url, VerseSource::Bible),
            quran: VerseClient::new(client.clone(), &config.quran_url, VerseSource::Quran),
            book: BookClient::new(client.clone(), &config.openlibrary_url, &config.covers_url),
            preview: PreviewClient::new(client, config.allow_private_hosts)?,
            debounce: config.debounce(),
        })
    }

    /// Run a search and wrap each record as a card payload
    pub async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        source: VerseSource,
    ) -> Result<Vec<CardPayload>> {
        tracing::debug!("Searching {} for {:?}", kind, query);
        let payloads = match kind {
            SearchKind::Movie => wrap(self.movie.search(query).await?, CardPayload::Movie),
            SearchKind::Song => wrap(self.song.search(query).await?, CardPayload::Song),
            SearchKind::Verse => {
                let client = match source {
                    VerseSource::Bible => &self.bible,
                    VerseSource::Quran => &self.quran,
                };
                wrap(client.search(query).await?, CardPayload::Verse)
            }
            SearchKind::Book => wrap(self.book.search(query).await?, CardPayload::Book),
        };
        Ok(payloads)
    }

    /// Fetch a link preview for `url`
    pub async fn preview(&self, url: &str) -> Result<LinkPreview> {
        self.preview.fetch(url).await
    }

    /// Debounced search session for one search interface
    pub fn session(
        self: &Arc<Self>,
        kind: SearchKind,
        source: VerseSource,
    ) -> SearchSession<KindSearch> {
        SearchSession::new(
            Arc::new(KindSearch {
                enrichment: self.clone(),
                kind,
                source,
            }),
            self.debounce,
        )
    }
}

fn wrap<T>(records: Vec<T>, f: fn(T) -> CardPayload) -> Vec<CardPayload> {
    records.into_iter().map(f).collect()
}

/// Search client bound to one kind (and verse source) of the facade
pub struct KindSearch {
    enrichment: Arc<Enrichment>,
    kind: SearchKind,
    source: VerseSource,
}

#[async_trait]
impl SearchClient for KindSearch {
    type Record = CardPayload;

    async fn search(&self, query: &str) -> Result<Vec<CardPayload>> {
        self.enrichment.search(self.kind, query, self.source).await
    }

    fn name(&self) -> &str {
        match self.kind {
            SearchKind::Movie => self.enrichment.movie.name(),
            SearchKind::Song => self.enrichment.song.name(),
            SearchKind::Verse => match self.source {
                VerseSource::Bible => self.enrichment.bible.name(),
                VerseSource::Quran => self.enrichment.quran.name(),
            },
            SearchKind::Book => self.enrichment.book.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    fn config_for(base: &str) -> EnrichmentConfig {
        EnrichmentConfig {
            omdb_api_keys: vec!["k1".to_string()],
            omdb_api_keys_env: "BENTO_TEST_UNSET_OMDB_KEYS".to_string(),
            omdb_url: format!("{}/omdb", base),
            itunes_url: format!("{}/itunes", base),
            bible_url: format!("{}/bible", base),
            quran_url: format!("{}/quran", base),
            openlibrary_url: format!("{}/books", base),
            covers_url: "https://covers.example/b/id".to_string(),
            debounce_ms: 10,
            ..Default::default()
        }
    }

    async fn mock_providers() -> String {
        let router = Router::new()
            .route(
                "/omdb",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(serde_json::json!({
                        "Response": "True",
                        "Search": [{
                            "Title": q.get("s").cloned().unwrap_or_default(),
                            "Year": "2010",
                            "imdbID": "tt1375666",
                            "Poster": "https://img/inception.jpg"
                        }]
                    }))
                }),
            )
            .route(
                "/bible",
                get(|| async {
                    Json(serde_json::json!([{
                        "bookname": "John",
                        "chapter": "3",
                        "verse": "16",
                        "text": "For God so loved the world"
                    }]))
                }),
            );
        serve(router).await
    }

    #[tokio::test]
    async fn test_facade_wraps_payloads() {
        let base = mock_providers().await;
        let enrichment = Enrichment::from_config(&config_for(&base)).unwrap();

        let results = enrichment
            .search(SearchKind::Movie, "Inception", VerseSource::Bible)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].derived_title(), Some("Inception"));

        let verses = enrichment
            .search(SearchKind::Verse, "John 3:16", VerseSource::Bible)
            .await
            .unwrap();
        assert_eq!(verses[0].derived_title(), Some("John 3:16"));
    }

    #[tokio::test]
    async fn test_facade_provider_failure() {
        let base = mock_providers().await;
        let enrichment = Enrichment::from_config(&config_for(&base)).unwrap();
        // no /itunes route on the mock
        let result = enrichment
            .search(SearchKind::Song, "anything", VerseSource::Bible)
            .await;
        assert!(matches!(result, Err(Error::Enrichment(_))));
    }

    #[tokio::test]
    async fn test_session_over_facade() {
        let base = mock_providers().await;
        let enrichment = Arc::new(Enrichment::from_config(&config_for(&base)).unwrap());
        let session = enrichment.session(SearchKind::Movie, VerseSource::Bible);
        let mut rx = session.subscribe();

        session.input("Dune");
        let state = loop {
            rx.changed().await.unwrap();
            let state = rx.borrow().clone();
            if matches!(state, SearchState::Results { .. }) {
                break state;
            }
        };
        match state {
            SearchState::Results { query, items } => {
                assert_eq!(query, "Dune");
                assert_eq!(items[0].derived_title(), Some("Dune"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }
}
