//! Read models for rendering a page
//!
//! Rendering dispatches once on the card kind and payload and produces a
//! serializable view per card. The same snapshot renders in two modes: the
//! owner's edit view (editable text, search prompts on empty cards) and the
//! read-only shared view.

use crate::cards::types::*;
use crate::enrichment::types::LinkPreview;
use chrono::NaiveTime;
use reqwest::Url;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Edit,
    Shared,
}

/// Embeddable player recognised from a link URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Embed {
    Youtube { id: String },
    Twitter,
    Instagram,
}

/// Rendered content of one card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CardBody {
    Text {
        text: String,
        editable: bool,
    },
    Link {
        href: Option<String>,
        title: String,
        caption: Option<String>,
        description: Option<String>,
        image: Option<String>,
        embed: Option<Embed>,
    },
    Image {
        src: String,
    },
    Clock {
        time: String,
        label: String,
    },
    Movie {
        title: String,
        year: String,
        poster: Option<String>,
    },
    Song {
        title: String,
        artist: String,
        artwork: Option<String>,
        album: Option<String>,
        preview: Option<String>,
        player: PlayerSize,
    },
    Verse {
        text: String,
        reference: String,
        source: String,
    },
    Book {
        title: String,
        author: String,
        cover: String,
        year: Option<i32>,
        href: String,
    },
    /// Card without content yet
    Placeholder {
        prompt: String,
        action: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub size: CardSize,
    pub span: GridSpan,
    pub body: CardBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub mode: ViewMode,
    /// Present only when the profile is shown
    pub profile: Option<Profile>,
    pub cards: Vec<CardView>,
    /// Only exposed to the owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shareable_link: Option<String>,
}

/// Render a full page snapshot
pub fn render_page(snapshot: &PageSnapshot, mode: ViewMode) -> PageView {
    let now = chrono::Local::now().time();
    PageView {
        mode,
        profile: if snapshot.show_profile {
            snapshot.profile.clone()
        } else {
            None
        },
        cards: snapshot
            .content
            .iter()
            .map(|card| render_card_at(card, mode, now))
            .collect(),
        shareable_link: match mode {
            ViewMode::Edit => Some(snapshot.shareable_link.clone()),
            ViewMode::Shared => None,
        },
    }
}

pub fn render_card(card: &Card, mode: ViewMode) -> CardView {
    render_card_at(card, mode, chrono::Local::now().time())
}

/// Render a card with the clock showing `now`
pub fn render_card_at(card: &Card, mode: ViewMode, now: NaiveTime) -> CardView {
    // A payload of the wrong kind is ignored
    let payload = card.payload.as_ref().filter(|p| p.kind() == card.kind);

    let body = match (card.kind, payload) {
        (_, Some(CardPayload::Movie(m))) => CardBody::Movie {
            title: m.title.clone(),
            year: m.year.clone(),
            poster: m.poster.clone(),
        },
        (_, Some(CardPayload::Song(s))) => CardBody::Song {
            title: s.title.clone(),
            artist: s.artist.clone(),
            artwork: s.artwork.clone(),
            album: s.album.clone(),
            preview: s.preview.clone(),
            player: card.size.player(),
        },
        (_, Some(CardPayload::Verse(v))) => CardBody::Verse {
            text: v.text.clone(),
            reference: v.reference.clone(),
            source: v.source.clone(),
        },
        (_, Some(CardPayload::Book(b))) => CardBody::Book {
            title: b.title.clone(),
            author: b.author.clone(),
            cover: b.cover.clone(),
            year: b.first_publish_year,
            href: format!("https://openlibrary.org{}", b.key),
        },
        (_, Some(CardPayload::Image(img))) if is_image_source(&img.src) => CardBody::Image {
            src: img.src.clone(),
        },
        (CardKind::Link, preview) => render_link(card, preview),
        (CardKind::Text, _) => CardBody::Text {
            text: card.value.clone(),
            editable: mode == ViewMode::Edit,
        },
        (CardKind::Clock, _) => CardBody::Clock {
            time: now.format("%H:%M").to_string(),
            label: "Local Time".to_string(),
        },
        (CardKind::Image, _) => CardBody::Placeholder {
            prompt: "No image uploaded".to_string(),
            action: edit_action(mode, "Upload Image"),
        },
        (kind, _) => CardBody::Placeholder {
            prompt: format!("No {} selected", kind),
            action: edit_action(mode, search_action(kind)),
        },
    };

    CardView {
        id: card.id.clone(),
        kind: card.kind,
        size: card.size,
        span: card.size.span(),
        body,
    }
}

fn render_link(card: &Card, payload: Option<&CardPayload>) -> CardBody {
    let preview: Option<&LinkPreview> = match payload {
        Some(CardPayload::Link(p)) => Some(p),
        _ => None,
    };
    let value = card.value.trim();
    let href = Some(value)
        .filter(|v| is_web_url(v))
        .map(str::to_string);

    let title = if !card.title.is_empty() {
        card.title.clone()
    } else {
        preview
            .and_then(|p| p.title.clone())
            .unwrap_or_else(|| "Untitled Link".to_string())
    };

    CardBody::Link {
        embed: href.as_deref().and_then(detect_embed),
        caption: Some(value.to_string()).filter(|v| !v.is_empty()),
        href,
        title,
        description: preview.and_then(|p| p.description.clone()),
        image: preview
            .and_then(|p| p.image.clone())
            .filter(|src| is_image_source(src)),
    }
}

fn edit_action(mode: ViewMode, label: &str) -> Option<String> {
    match mode {
        ViewMode::Edit => Some(label.to_string()),
        ViewMode::Shared => None,
    }
}

fn search_action(kind: CardKind) -> &'static str {
    match kind {
        CardKind::Movie => "Search Movies",
        CardKind::Song => "Search Songs",
        CardKind::Verse => "Search Verses",
        CardKind::Book => "Search Books",
        _ => "Edit",
    }
}

/// Recognise YouTube, Twitter/X and Instagram links
pub fn detect_embed(url: &str) -> Option<Embed> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.").to_ascii_lowercase();
    let is = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

    if is("youtube.com") && parsed.path() == "/watch" {
        let id = parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())?;
        return Some(Embed::Youtube { id });
    }
    if host == "youtu.be" {
        let id = parsed
            .path_segments()
            .and_then(|mut s| s.next_back())
            .filter(|s| !s.is_empty())?;
        return Some(Embed::Youtube { id: id.to_string() });
    }
    if is("twitter.com") || is("x.com") {
        return Some(Embed::Twitter);
    }
    if is("instagram.com") {
        return Some(Embed::Instagram);
    }
    None
}
