//! Normalized enrichment records
//!
//! Provider responses are projected into these shapes before they reach a
//! card payload; raw provider JSON is never persisted.

use crate::cards::types::CardKind;
use serde::{Deserialize, Serialize};

/// Which search interface a card opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Movie,
    Song,
    Verse,
    Book,
}

impl SearchKind {
    /// Card kind populated by this search
    pub fn card_kind(&self) -> CardKind {
        match self {
            Self::Movie => CardKind::Movie,
            Self::Song => CardKind::Song,
            Self::Verse => CardKind::Verse,
            Self::Book => CardKind::Book,
        }
    }
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Song => write!(f, "song"),
            Self::Verse => write!(f, "verse"),
            Self::Book => write!(f, "book"),
        }
    }
}

impl std::str::FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "song" => Ok(Self::Song),
            "verse" => Ok(Self::Verse),
            "book" => Ok(Self::Book),
            other => Err(format!("unknown search kind: {}", other)),
        }
    }
}

/// Scripture provider selectable by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerseSource {
    #[default]
    Bible,
    Quran,
}

impl VerseSource {
    /// Label stored in `VerseRecord::source`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bible => "Bible",
            Self::Quran => "Quran",
        }
    }
}

impl std::fmt::Display for VerseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bible => write!(f, "bible"),
            Self::Quran => write!(f, "quran"),
        }
    }
}

impl std::str::FromStr for VerseSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bible" => Ok(Self::Bible),
            "quran" => Ok(Self::Quran),
            other => Err(format!("unknown verse source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub title: String,
    /// `None` when the provider had no poster
    pub poster: Option<String>,
    pub year: String,
    pub imdb_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
    /// 30-second preview clip
    pub preview: Option<String>,
    pub track_id: u64,
    pub album: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRecord {
    pub text: String,
    pub reference: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub cover: String,
    /// Open Library work key, e.g. `/works/OL45804W`
    pub key: String,
    pub first_publish_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// `data:image/...` URL from an upload, or a remote image URL
    pub src: String,
}
