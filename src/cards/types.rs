//! Card, profile and page snapshot wire types
//!
//! All types use camelCase JSON. A card's `type` is fixed at creation; the
//! payload, when present, always has the same kind as the card.

use crate::enrichment::types::{
    BookRecord, ImageRecord, LinkPreview, MovieRecord, SearchKind, SongRecord, VerseRecord,
};
use serde::{Deserialize, Serialize};

/// Closed set of card kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Link,
    Image,
    Text,
    Clock,
    Movie,
    Song,
    Verse,
    Book,
}

impl CardKind {
    pub const ALL: [CardKind; 8] = [
        Self::Link,
        Self::Image,
        Self::Text,
        Self::Clock,
        Self::Movie,
        Self::Song,
        Self::Verse,
        Self::Book,
    ];

    /// Search interface that populates this kind, if any
    pub fn search(&self) -> Option<SearchKind> {
        match self {
            Self::Movie => Some(SearchKind::Movie),
            Self::Song => Some(SearchKind::Song),
            Self::Verse => Some(SearchKind::Verse),
            Self::Book => Some(SearchKind::Book),
            Self::Link | Self::Image | Self::Text | Self::Clock => None,
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link => write!(f, "link"),
            Self::Image => write!(f, "image"),
            Self::Text => write!(f, "text"),
            Self::Clock => write!(f, "clock"),
            Self::Movie => write!(f, "movie"),
            Self::Song => write!(f, "song"),
            Self::Verse => write!(f, "verse"),
            Self::Book => write!(f, "book"),
        }
    }
}

impl std::str::FromStr for CardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|k| k.to_string() == s)
            .copied()
            .ok_or_else(|| format!("unknown card type: {}", s))
    }
}

/// Grid footprint of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSize {
    #[default]
    Medium,
    Wide,
    Tall,
    Large,
}

/// Audio player variant used by song cards at a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSize {
    Tiny,
    Small,
    Full,
}

/// Column and row span on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpan {
    pub cols: u8,
    pub rows: u8,
}

impl CardSize {
    /// Next size in the resize cycle (medium → wide → tall → large → medium)
    pub fn next(&self) -> Self {
        match self {
            Self::Medium => Self::Wide,
            Self::Wide => Self::Tall,
            Self::Tall => Self::Large,
            Self::Large => Self::Medium,
        }
    }

    pub fn span(&self) -> GridSpan {
        match self {
            Self::Medium => GridSpan { cols: 1, rows: 1 },
            Self::Wide => GridSpan { cols: 2, rows: 1 },
            Self::Tall => GridSpan { cols: 1, rows: 2 },
            Self::Large => GridSpan { cols: 2, rows: 2 },
        }
    }

    pub fn player(&self) -> PlayerSize {
        match self {
            Self::Medium => PlayerSize::Tiny,
            Self::Wide | Self::Tall => PlayerSize::Small,
            Self::Large => PlayerSize::Full,
        }
    }
}

impl std::fmt::Display for CardSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Medium => write!(f, "medium"),
            Self::Wide => write!(f, "wide"),
            Self::Tall => write!(f, "tall"),
            Self::Large => write!(f, "large"),
        }
    }
}

impl std::str::FromStr for CardSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "medium" => Ok(Self::Medium),
            "wide" => Ok(Self::Wide),
            "tall" => Ok(Self::Tall),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown card size: {}", other)),
        }
    }
}

/// Type-specific enrichment attached to a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CardPayload {
    Link(LinkPreview),
    Image(ImageRecord),
    Movie(MovieRecord),
    Song(SongRecord),
    Verse(VerseRecord),
    Book(BookRecord),
}

impl CardPayload {
    /// Card kind this payload belongs to
    pub fn kind(&self) -> CardKind {
        match self {
            Self::Link(_) => CardKind::Link,
            Self::Image(_) => CardKind::Image,
            Self::Movie(_) => CardKind::Movie,
            Self::Song(_) => CardKind::Song,
            Self::Verse(_) => CardKind::Verse,
            Self::Book(_) => CardKind::Book,
        }
    }

    /// Title a card takes when this payload is selected.
    ///
    /// Verses are titled by their reference; images keep the card's title.
    pub fn derived_title(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => Some(&m.title),
            Self::Song(s) => Some(&s.title),
            Self::Verse(v) => Some(&v.reference),
            Self::Book(b) => Some(&b.title),
            Self::Link(l) => l.title.as_deref(),
            Self::Image(_) => None,
        }
    }
}

/// One grid tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    #[serde(default)]
    pub size: CardSize,
    /// URL for links, note text for text cards; unused for clocks
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<CardPayload>,
}

impl Card {
    /// Create an empty card with a fresh id and the default size
    pub fn new(kind: CardKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            size: CardSize::default(),
            value: String::new(),
            title: String::new(),
            payload: None,
        }
    }
}

/// Partial card update; the card type is deliberately absent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    pub value: Option<String>,
    pub title: Option<String>,
    pub size: Option<CardSize>,
}

/// Screen position of the floating profile badge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Page owner's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub profession: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_position")]
    pub position: Position,
}

fn default_position() -> Position {
    Position { x: 40.0, y: 40.0 }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Your Name".to_string(),
            profession: "Creative Technologist & Designer".to_string(),
            image: None,
            position: default_position(),
        }
    }
}

/// Partial profile update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub profession: Option<String>,
    pub image: Option<String>,
    pub position: Option<Position>,
    pub visible: Option<bool>,
}

/// Full persisted page state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub user_id: String,
    pub content: Vec<Card>,
    pub shareable_link: String,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default = "default_true")]
    pub show_profile: bool,
}

/// Whether `url` is an absolute http(s) URL
pub fn is_web_url(url: &str) -> bool {
    reqwest::Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Whether `src` can be shown as an image: a `data:image/` URL or a web URL
pub fn is_image_source(src: &str) -> bool {
    src.starts_with("data:image/") || is_web_url(src)
}

fn default_true() -> bool {
    true
}
