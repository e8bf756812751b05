//! Card store: the ordered card list and profile of one page
//!
//! Every mutation rewrites the full snapshot through the persistence gateway
//! under both the owner key and the share key. Write failures are logged and
//! swallowed; local state is never rolled back.

use crate::cards::types::*;
use crate::enrichment::types::{ImageRecord, SearchKind};
use crate::error::{Error, Result};
use crate::storage::{save_snapshot, share::share_key, PersistenceGateway};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of an add-intent
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedCard {
    pub card: Card,
    /// Search interface to open for the new card, which is now the active target
    pub search: Option<SearchKind>,
}

struct PageState {
    cards: Vec<Card>,
    profile: Option<Profile>,
    show_profile: bool,
    active_target: Option<String>,
}

impl PageState {
    fn position(&self, id: &str) -> Result<usize> {
        self.cards
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("Card '{}' not found", id)))
    }
}

/// Owned store for a single page
pub struct CardStore {
    owner_key: String,
    shareable_link: String,
    state: Arc<RwLock<PageState>>,
    gateway: Arc<dyn PersistenceGateway>,
}

impl CardStore {
    /// Create an empty page with the default profile
    pub fn new(
        owner_key: impl Into<String>,
        shareable_link: impl Into<String>,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            owner_key: owner_key.into(),
            shareable_link: shareable_link.into(),
            state: Arc::new(RwLock::new(PageState {
                cards: Vec::new(),
                profile: Some(Profile::default()),
                show_profile: true,
                active_target: None,
            })),
            gateway,
        }
    }

    /// Rebuild a store from a persisted snapshot.
    ///
    /// Cards with duplicate ids keep their first occurrence.
    pub fn from_snapshot(snapshot: PageSnapshot, gateway: Arc<dyn PersistenceGateway>) -> Self {
        let mut seen = HashSet::new();
        let total = snapshot.content.len();
        let cards: Vec<Card> = snapshot
            .content
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        if cards.len() != total {
            tracing::warn!(
                "Dropped {} duplicate card ids while loading page {}",
                total - cards.len(),
                snapshot.user_id
            );
        }

        Self {
            owner_key: snapshot.user_id,
            shareable_link: snapshot.shareable_link,
            state: Arc::new(RwLock::new(PageState {
                cards,
                profile: snapshot.profile,
                show_profile: snapshot.show_profile,
                active_target: None,
            })),
            gateway,
        }
    }

    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    pub fn share_key(&self) -> String {
        share_key(&self.owner_key)
    }

    pub fn shareable_link(&self) -> &str {
        &self.shareable_link
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cards in display order
    pub async fn cards(&self) -> Vec<Card> {
        self.state.read().await.cards.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Card> {
        self.state
            .read()
            .await
            .cards
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        let state = self.state.read().await;
        self.build_snapshot(&state)
    }

    /// Card id that a search selection will be applied to
    pub async fn active_target(&self) -> Option<String> {
        self.state.read().await.active_target.clone()
    }

    // =========================================================================
    // Card mutations
    // =========================================================================

    /// Append an empty card of `kind` to the end of the list.
    ///
    /// Enrichable kinds also become the active search target.
    pub async fn add(&self, kind: CardKind) -> AddedCard {
        let mut state = self.state.write().await;
        let card = Card::new(kind);
        let search = kind.search();
        if search.is_some() {
            state.active_target = Some(card.id.clone());
        }
        state.cards.push(card.clone());
        tracing::debug!("Added {} card {} to page {}", kind, card.id, self.owner_key);

        self.persist(&state).await;
        AddedCard { card, search }
    }

    /// Merge `patch` into the card with `id`
    pub async fn update(&self, id: &str, patch: CardPatch) -> Result<Card> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;
        let card = &mut state.cards[idx];

        if let Some(value) = patch.value {
            card.value = value;
        }
        if let Some(title) = patch.title {
            card.title = title;
        }
        if let Some(size) = patch.size {
            card.size = size;
        }

        let updated = card.clone();
        self.persist(&state).await;
        Ok(updated)
    }

    /// Delete the card with `id`. Returns whether a card was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        let before = state.cards.len();
        state.cards.retain(|c| c.id != id);
        if state.cards.len() == before {
            return false;
        }
        if state.active_target.as_deref() == Some(id) {
            state.active_target = None;
        }

        self.persist(&state).await;
        true
    }

    /// Replace the display order. `ids` must be a permutation of the current ids.
    pub async fn reorder(&self, ids: &[String]) -> Result<()> {
        let mut state = self.state.write().await;

        let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if unique.len() != ids.len() {
            return Err(Error::InvalidInput("Reorder contains duplicate ids".to_string()));
        }
        if ids.len() != state.cards.len() {
            return Err(Error::InvalidInput(format!(
                "Reorder lists {} ids but the page has {} cards",
                ids.len(),
                state.cards.len()
            )));
        }

        let mut by_id: HashMap<String, Card> = state
            .cards
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect();
        let mut reordered = Vec::with_capacity(ids.len());
        for id in ids {
            let card = by_id
                .remove(id)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown card id '{}'", id)))?;
            reordered.push(card);
        }

        state.cards = reordered;
        self.persist(&state).await;
        Ok(())
    }

    pub async fn set_size(&self, id: &str, size: CardSize) -> Result<Card> {
        self.update(
            id,
            CardPatch {
                size: Some(size),
                ..Default::default()
            },
        )
        .await
    }

    /// Advance the card to the next size in the cycle
    pub async fn cycle_size(&self, id: &str) -> Result<Card> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;
        let card = &mut state.cards[idx];
        card.size = card.size.next();

        let updated = card.clone();
        self.persist(&state).await;
        Ok(updated)
    }

    /// Attach an uploaded or remote image to an image card
    pub async fn attach_image(&self, id: &str, src: &str) -> Result<Card> {
        if !is_image_source(src) {
            return Err(Error::InvalidInput(
                "Image must be a data:image/ URL or an http(s) URL".to_string(),
            ));
        }
        self.assign_payload(
            id,
            CardPayload::Image(ImageRecord {
                src: src.to_string(),
            }),
        )
        .await
    }

    // =========================================================================
    // Search targeting and selection
    // =========================================================================

    /// Make an existing enrichable card the active search target
    pub async fn open_search(&self, id: &str) -> Result<SearchKind> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;
        let kind = state.cards[idx].kind;
        let search = kind.search().ok_or_else(|| {
            Error::InvalidInput(format!("{} cards have no search interface", kind))
        })?;
        state.active_target = Some(id.to_string());
        Ok(search)
    }

    /// Dismiss the search interface without selecting anything
    pub async fn close_search(&self) {
        self.state.write().await.active_target = None;
    }

    /// Apply a candidate to the active target and clear the target
    pub async fn select(&self, candidate: CardPayload) -> Result<Card> {
        let target = self
            .active_target()
            .await
            .ok_or_else(|| Error::NotFound("No active search target".to_string()))?;
        self.select_for(&target, candidate).await
    }

    /// Apply a candidate to the card with `id`
    pub async fn select_for(&self, id: &str, candidate: CardPayload) -> Result<Card> {
        let card = self.assign_payload(id, candidate).await?;
        let mut state = self.state.write().await;
        if state.active_target.as_deref() == Some(id) {
            state.active_target = None;
        }
        Ok(card)
    }

    async fn assign_payload(&self, id: &str, payload: CardPayload) -> Result<Card> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;
        let card = &mut state.cards[idx];

        if payload.kind() != card.kind {
            return Err(Error::InvalidInput(format!(
                "Cannot attach a {} payload to a {} card",
                payload.kind(),
                card.kind
            )));
        }
        if let CardPayload::Image(image) = &payload {
            if !is_image_source(&image.src) {
                return Err(Error::InvalidInput(
                    "Image must be a data:image/ URL or an http(s) URL".to_string(),
                ));
            }
        }

        if let Some(title) = payload.derived_title() {
            card.title = title.to_string();
        }
        if let CardPayload::Link(preview) = &payload {
            if card.value.is_empty() {
                card.value = preview.url.clone();
            }
        }
        card.payload = Some(payload);

        let updated = card.clone();
        self.persist(&state).await;
        Ok(updated)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn profile(&self) -> Option<Profile> {
        self.state.read().await.profile.clone()
    }

    pub async fn set_profile(&self, profile: Profile) {
        let mut state = self.state.write().await;
        state.profile = Some(profile);
        self.persist(&state).await;
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> Profile {
        let mut state = self.state.write().await;
        let mut profile = state.profile.take().unwrap_or_default();
        if let Some(name) = patch.name {
            profile.name = name;
        }
        if let Some(profession) = patch.profession {
            profile.profession = profession;
        }
        if let Some(image) = patch.image {
            profile.image = if image.is_empty() { None } else { Some(image) };
        }
        if let Some(position) = patch.position {
            profile.position = position;
        }
        if let Some(visible) = patch.visible {
            state.show_profile = visible;
        }
        state.profile = Some(profile.clone());

        self.persist(&state).await;
        profile
    }

    pub async fn move_profile(&self, x: f64, y: f64) -> Profile {
        self.update_profile(ProfilePatch {
            position: Some(Position { x, y }),
            ..Default::default()
        })
        .await
    }

    pub async fn set_profile_visible(&self, visible: bool) {
        let mut state = self.state.write().await;
        state.show_profile = visible;
        self.persist(&state).await;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn build_snapshot(&self, state: &PageState) -> PageSnapshot {
        PageSnapshot {
            user_id: self.owner_key.clone(),
            content: state.cards.clone(),
            shareable_link: self.shareable_link.clone(),
            profile: state.profile.clone(),
            show_profile: state.show_profile,
        }
    }

    /// Write the full snapshot. Called with the state lock held so writes
    /// land in mutation order.
    async fn persist(&self, state: &PageState) {
        let snapshot = self.build_snapshot(state);
        if let Err(e) = save_snapshot(self.gateway.as_ref(), &snapshot).await {
            tracing::warn!("Failed to persist page {}: {}", self.owner_key, e);
        }
    }
}
