//! Scripture search: NET Bible passages and Quran full-text search

use super::types::{VerseRecord, VerseSource};
use super::{fetch_json, SearchClient};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const QURAN_MAX_RESULTS: usize = 10;

/// labs.bible.org returns chapter and verse as strings, but some mirrors
/// send numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeral {
    Text(String),
    Number(u64),
}

impl std::fmt::Display for Numeral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BiblePassage {
    bookname: String,
    chapter: Numeral,
    verse: Numeral,
    text: String,
}

#[derive(Debug, Deserialize)]
struct QuranResponse {
    data: QuranData,
}

#[derive(Debug, Deserialize)]
struct QuranData {
    #[serde(default)]
    matches: Vec<QuranMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuranMatch {
    text: String,
    number_in_surah: u32,
    surah: Surah,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Surah {
    number: u32,
    english_name: String,
}

/// Verse client bound to one scripture source
pub struct VerseClient {
    client: reqwest::Client,
    base_url: String,
    source: VerseSource,
}

impl VerseClient {
    pub fn new(client: reqwest::Client, base_url: &str, source: VerseSource) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            source,
        }
    }

    pub fn source(&self) -> VerseSource {
        self.source
    }

    async fn search_bible(&self, query: &str) -> Result<Vec<VerseRecord>> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[("passage", query), ("type", "json")]);
        let passages: Vec<BiblePassage> = fetch_json(request, "Bible API").await?;

        Ok(passages
            .into_iter()
            .map(|p| VerseRecord {
                text: p.text,
                reference: format!("{} {}:{}", p.bookname, p.chapter, p.verse),
                source: VerseSource::Bible.label().to_string(),
            })
            .collect())
    }

    async fn search_quran(&self, query: &str) -> Result<Vec<VerseRecord>> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid Quran API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Quran API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([query, "all", "en"]);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("Quran API request failed: {}", e)))?;

        // alquran.cloud answers 404 when nothing matches
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Error::Enrichment(format!(
                "Quran API returned {}",
                response.status()
            )));
        }
        let body: QuranResponse = response
            .json()
            .await
            .map_err(|e| Error::Enrichment(format!("Failed to parse Quran API response: {}", e)))?;

        Ok(body
            .data
            .matches
            .into_iter()
            .take(QURAN_MAX_RESULTS)
            .map(|m| VerseRecord {
                text: m.text,
                reference: format!(
                    "Surah {}:{} - {}",
                    m.surah.number, m.number_in_surah, m.surah.english_name
                ),
                source: VerseSource::Quran.label().to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl SearchClient for VerseClient {
    type Record = VerseRecord;

    async fn search(&self, query: &str) -> Result<Vec<VerseRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        match self.source {
            VerseSource::Bible => self.search_bible(query).await,
            VerseSource::Quran => self.search_quran(query).await,
        }
    }

    fn name(&self) -> &str {
        match self.source {
            VerseSource::Bible => "bible",
            VerseSource::Quran => "quran",
        }
    }
}
