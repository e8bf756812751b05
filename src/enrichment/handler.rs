//! HTTP handlers for provider search and link previews
//!
//! - GET /api/v1/search/:kind?q=&source= — search movies, songs, verses or books
//! - GET /api/v1/preview?url=            — Open Graph preview of a link

use super::types::{SearchKind, VerseSource};
use super::Enrichment;
use crate::api::{ApiError, ApiQuery};
use crate::cards::types::CardPayload;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for enrichment handlers
#[derive(Clone)]
pub struct EnrichmentState {
    pub enrichment: Arc<Enrichment>,
}

/// Create the search + preview router
pub fn enrichment_router(state: EnrichmentState) -> Router {
    Router::new()
        .route("/api/v1/search/:kind", get(search))
        .route("/api/v1/preview", get(preview))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    source: VerseSource,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    kind: SearchKind,
    query: String,
    results: Vec<CardPayload>,
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    url: String,
}

/// GET /api/v1/search/:kind
async fn search(
    State(state): State<EnrichmentState>,
    Path(kind): Path<String>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let kind: SearchKind = kind.parse().map_err(ApiError::bad_request)?;
    let results = state
        .enrichment
        .search(kind, &params.q, params.source)
        .await
        .map_err(|e| {
            tracing::warn!("{} search for {:?} failed: {}", kind, params.q, e);
            ApiError::from(e)
        })?;

    Ok(Json(SearchResponse {
        kind,
        query: params.q,
        results,
    }))
}

/// GET /api/v1/preview
async fn preview(
    State(state): State<EnrichmentState>,
    ApiQuery(params): ApiQuery<PreviewQuery>,
) -> Result<Json<super::types::LinkPreview>, ApiError> {
    let preview = state.enrichment.preview(&params.url).await?;
    Ok(Json(preview))
}
