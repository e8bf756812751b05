//! HTTP handlers for the raw key/value storage API
//!
//! - GET  /api/v1/storage/:key?public=bool — stored JSON blob
//! - PUT  /api/v1/storage/:key?public=bool — upsert JSON blob

use super::gateway::PersistenceGateway;
use super::share::validate_key;
use crate::api::{ApiError, ApiQuery};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for storage handlers
#[derive(Clone)]
pub struct StorageState {
    pub gateway: Arc<dyn PersistenceGateway>,
}

/// Create the storage router
pub fn storage_router(state: StorageState) -> Router {
    Router::new()
        .route("/api/v1/storage/:key", get(read_value).put(write_value))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct StorageQuery {
    #[serde(default)]
    public: bool,
}

/// GET /api/v1/storage/:key
async fn read_value(
    State(state): State<StorageState>,
    Path(key): Path<String>,
    ApiQuery(params): ApiQuery<StorageQuery>,
) -> Response {
    if let Err(e) = validate_key(&key) {
        return ApiError::from_error(&e).into_response();
    }
    match state.gateway.read(&key, params.public).await {
        Ok(Some(blob)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            blob,
        )
            .into_response(),
        Ok(None) => ApiError::not_found(format!("Key '{}' not found", key)).into_response(),
        Err(e) => {
            tracing::warn!("Storage read of '{}' failed: {}", key, e);
            ApiError::from_error(&e).into_response()
        }
    }
}

/// PUT /api/v1/storage/:key
async fn write_value(
    State(state): State<StorageState>,
    Path(key): Path<String>,
    ApiQuery(params): ApiQuery<StorageQuery>,
    body: String,
) -> Response {
    if let Err(e) = validate_key(&key) {
        return ApiError::from_error(&e).into_response();
    }
    if serde_json::from_str::<serde_json::Value>(&body).is_err() {
        return ApiError::bad_request("Body must be a JSON document").into_response();
    }
    match state.gateway.write(&key, &body, params.public).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!("Storage write of '{}' failed: {}", key, e);
            ApiError::from_error(&e).into_response()
        }
    }
}
