//! HTTP handlers for page editing and the shared view
//!
//! - POST   /api/v1/pages                          — create a page with a fresh owner key
//! - GET    /api/v1/pages/:owner                   — current snapshot
//! - GET    /api/v1/pages/:owner/view              — rendered edit view
//! - POST   /api/v1/pages/:owner/cards             — add card
//! - PATCH  /api/v1/pages/:owner/cards/:id         — update value/title/size
//! - DELETE /api/v1/pages/:owner/cards/:id         — remove card
//! - PUT    /api/v1/pages/:owner/cards/:id/size    — set size
//! - POST   /api/v1/pages/:owner/cards/:id/cycle-size — next size
//! - POST   /api/v1/pages/:owner/cards/:id/select  — apply a search candidate
//! - POST   /api/v1/pages/:owner/cards/:id/image   — attach an image
//! - PUT    /api/v1/pages/:owner/order             — reorder
//! - PUT    /api/v1/pages/:owner/profile           — replace profile
//! - PATCH  /api/v1/pages/:owner/profile           — edit, move, show/hide profile
//! - POST   /api/v1/pages/:owner/cards/:id/search  — make the card the search target
//! - GET    /api/v1/pages/:owner/search            — current search target
//! - DELETE /api/v1/pages/:owner/search            — dismiss the search interface
//! - POST   /api/v1/pages/:owner/search/select     — apply a candidate to the search target
//! - GET    /api/v1/pages/:owner/share             — share key and link
//! - GET    /api/v1/shared/:share_key              — rendered read-only page

use crate::api::{ApiError, ApiJson};
use crate::cards::registry::PageRegistry;
use crate::cards::store::{AddedCard, CardStore};
use crate::cards::types::*;
use crate::enrichment::types::SearchKind;
use crate::storage::share::share_key;
use crate::view::{render_page, PageView, ViewMode};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for page handlers
#[derive(Clone)]
pub struct CardsState {
    pub registry: Arc<PageRegistry>,
}

/// Create the pages + shared view router
pub fn cards_router(state: CardsState) -> Router {
    Router::new()
        .route("/api/v1/pages", post(create_page))
        .route("/api/v1/pages/:owner", get(get_page))
        .route("/api/v1/pages/:owner/view", get(view_page))
        .route("/api/v1/pages/:owner/cards", post(add_card))
        .route(
            "/api/v1/pages/:owner/cards/:id",
            axum::routing::patch(update_card).delete(remove_card),
        )
        .route("/api/v1/pages/:owner/cards/:id/size", put(set_size))
        .route("/api/v1/pages/:owner/cards/:id/cycle-size", post(cycle_size))
        .route("/api/v1/pages/:owner/cards/:id/select", post(select_candidate))
        .route("/api/v1/pages/:owner/cards/:id/image", post(attach_image))
        .route("/api/v1/pages/:owner/cards/:id/search", post(open_search))
        .route(
            "/api/v1/pages/:owner/search",
            get(search_target).delete(close_search),
        )
        .route("/api/v1/pages/:owner/search/select", post(select_on_target))
        .route("/api/v1/pages/:owner/order", put(reorder))
        .route(
            "/api/v1/pages/:owner/profile",
            put(replace_profile).patch(update_profile),
        )
        .route("/api/v1/pages/:owner/share", get(share_info))
        .route("/api/v1/shared/:share_key", get(shared_page))
        .with_state(state)
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
struct AddCardRequest {
    #[serde(rename = "type")]
    kind: CardKind,
}

#[derive(Debug, Deserialize)]
struct SetSizeRequest {
    size: CardSize,
}

#[derive(Debug, Deserialize)]
struct AttachImageRequest {
    src: String,
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareInfo {
    owner_key: String,
    share_key: String,
    shareable_link: String,
}

impl ShareInfo {
    fn of(store: &CardStore) -> Self {
        Self {
            owner_key: store.owner_key().to_string(),
            share_key: store.share_key(),
            shareable_link: store.shareable_link().to_string(),
        }
    }

    fn from_snapshot(snapshot: PageSnapshot) -> Self {
        Self {
            share_key: share_key(&snapshot.user_id),
            owner_key: snapshot.user_id,
            shareable_link: snapshot.shareable_link,
        }
    }
}

/// Card the search interface is open for
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTarget {
    card_id: Option<String>,
    search: Option<SearchKind>,
}

async fn open(state: &CardsState, owner: &str) -> Result<Arc<CardStore>, ApiError> {
    state.registry.open(owner).await.map_err(|e| {
        tracing::warn!("Failed to open page {}: {}", owner, e);
        ApiError::from(e)
    })
}

async fn snapshot(state: &CardsState, owner: &str) -> Result<PageSnapshot, ApiError> {
    state.registry.snapshot(owner).await.map_err(|e| {
        tracing::warn!("Failed to read page {}: {}", owner, e);
        ApiError::from(e)
    })
}

// =============================================================================
// Page handlers
// =============================================================================

/// POST /api/v1/pages
async fn create_page(State(state): State<CardsState>) -> impl IntoResponse {
    let store = state.registry.create();
    tracing::info!("Created page {}", store.owner_key());
    (StatusCode::CREATED, Json(ShareInfo::of(&store)))
}

/// GET /api/v1/pages/:owner
async fn get_page(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
) -> Result<Json<PageSnapshot>, ApiError> {
    Ok(Json(snapshot(&state, &owner).await?))
}

/// GET /api/v1/pages/:owner/view
async fn view_page(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
) -> Result<Json<PageView>, ApiError> {
    let snapshot = snapshot(&state, &owner).await?;
    Ok(Json(render_page(&snapshot, ViewMode::Edit)))
}

/// GET /api/v1/pages/:owner/share
async fn share_info(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
) -> Result<Json<ShareInfo>, ApiError> {
    Ok(Json(ShareInfo::from_snapshot(snapshot(&state, &owner).await?)))
}

/// GET /api/v1/shared/:share_key
async fn shared_page(
    State(state): State<CardsState>,
    Path(share_key): Path<String>,
) -> Result<Json<PageView>, ApiError> {
    let snapshot = state.registry.shared(&share_key).await?;
    Ok(Json(render_page(&snapshot, ViewMode::Shared)))
}

// =============================================================================
// Card handlers
// =============================================================================

/// POST /api/v1/pages/:owner/cards
async fn add_card(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
    ApiJson(request): ApiJson<AddCardRequest>,
) -> Result<(StatusCode, Json<AddedCard>), ApiError> {
    let store = open(&state, &owner).await?;
    Ok((StatusCode::CREATED, Json(store.add(request.kind).await)))
}

/// PATCH /api/v1/pages/:owner/cards/:id
async fn update_card(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
    ApiJson(patch): ApiJson<CardPatch>,
) -> Result<Json<Card>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.update(&id, patch).await?))
}

/// DELETE /api/v1/pages/:owner/cards/:id
async fn remove_card(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let store = open(&state, &owner).await?;
    store.remove(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/pages/:owner/cards/:id/size
async fn set_size(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
    ApiJson(request): ApiJson<SetSizeRequest>,
) -> Result<Json<Card>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.set_size(&id, request.size).await?))
}

/// POST /api/v1/pages/:owner/cards/:id/cycle-size
async fn cycle_size(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Json<Card>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.cycle_size(&id).await?))
}

/// POST /api/v1/pages/:owner/cards/:id/select
async fn select_candidate(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
    ApiJson(candidate): ApiJson<CardPayload>,
) -> Result<Json<Card>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.select_for(&id, candidate).await?))
}

/// POST /api/v1/pages/:owner/cards/:id/image
async fn attach_image(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
    ApiJson(request): ApiJson<AttachImageRequest>,
) -> Result<Json<Card>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.attach_image(&id, &request.src).await?))
}

/// PUT /api/v1/pages/:owner/order
async fn reorder(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let store = open(&state, &owner).await?;
    store.reorder(&request.ids).await?;
    Ok(Json(store.cards().await))
}

// =============================================================================
// Search target handlers
// =============================================================================

/// POST /api/v1/pages/:owner/cards/:id/search
async fn open_search(
    State(state): State<CardsState>,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Json<SearchTarget>, ApiError> {
    let store = open(&state, &owner).await?;
    let search = store.open_search(&id).await?;
    Ok(Json(SearchTarget {
        card_id: Some(id),
        search: Some(search),
    }))
}

/// GET /api/v1/pages/:owner/search
async fn search_target(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
) -> Result<Json<SearchTarget>, ApiError> {
    let store = open(&state, &owner).await?;
    let card = match store.active_target().await {
        Some(id) => store.get(&id).await,
        None => None,
    };
    Ok(Json(SearchTarget {
        search: card.as_ref().and_then(|c| c.kind.search()),
        card_id: card.map(|c| c.id),
    }))
}

/// DELETE /api/v1/pages/:owner/search
async fn close_search(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
) -> Result<StatusCode, ApiError> {
    let store = open(&state, &owner).await?;
    store.close_search().await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/pages/:owner/search/select
async fn select_on_target(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
    ApiJson(candidate): ApiJson<CardPayload>,
) -> Result<Json<Card>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.select(candidate).await?))
}

// =============================================================================
// Profile handlers
// =============================================================================

/// PUT /api/v1/pages/:owner/profile
async fn replace_profile(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
    ApiJson(profile): ApiJson<Profile>,
) -> Result<Json<Profile>, ApiError> {
    let store = open(&state, &owner).await?;
    store.set_profile(profile.clone()).await;
    Ok(Json(profile))
}

/// PATCH /api/v1/pages/:owner/profile
async fn update_profile(
    State(state): State<CardsState>,
    Path(owner): Path<String>,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<Profile>, ApiError> {
    let store = open(&state, &owner).await?;
    Ok(Json(store.update_profile(patch).await))
}
