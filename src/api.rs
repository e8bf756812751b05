//! Unified API router for Bento
//!
//! Merges all module routers into a single axum `Router` with CORS,
//! request tracing, and a shared error envelope.
//!
//! ## Endpoint Map
//!
//! | Prefix                   | Module     | Description                          |
//! |--------------------------|------------|--------------------------------------|
//! | `/health`                | api        | Liveness probe                       |
//! | `/api/v1/pages/*`        | cards      | Card and profile editing, share link |
//! | `/api/v1/shared/*`       | cards      | Read-only shared page                |
//! | `/api/v1/search/*`       | enrichment | Movie, song, verse and book search   |
//! | `/api/v1/preview`        | enrichment | Link preview                         |
//! | `/api/v1/storage/*`      | storage    | Raw key/value snapshot access        |

use crate::cards::{cards_router, CardsState, PageRegistry};
use crate::config::BentoConfig;
use crate::enrichment::{enrichment_router, Enrichment, EnrichmentState};
use crate::error::{Error, Result};
use crate::storage::{open_gateway, storage_router, StorageState};
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::{header, request::Parts, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// Error envelope
// =============================================================================

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn search_failed(message: impl Into<String>) -> Self {
        Self::new("SEARCH_FAILED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Map a crate error onto the matching envelope
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::NotFound(msg) => Self::not_found(msg.clone()),
            Error::InvalidInput(msg) => Self::bad_request(msg.clone()),
            Error::Serialization(e) => Self::bad_request(e.to_string()),
            Error::Enrichment(msg) => Self::search_failed(msg.clone()),
            Error::Http(e) => Self::search_failed(e.to_string()),
            other => Self::internal(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "SEARCH_FAILED" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// `Json` body extractor whose rejections use the error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, ApiError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query` extractor whose rejections use the error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, ApiError> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

// =============================================================================
// Application
// =============================================================================

/// Build the complete Bento HTTP application
///
/// Merges all module routers, adds CORS and tracing middleware, and returns
/// a single `Router` ready to be served by `axum::serve`.
pub fn build_app(
    cards_state: CardsState,
    enrichment_state: EnrichmentState,
    storage_state: StorageState,
    cors_origins: &[String],
) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .merge(cards_router(cards_state))
        .merge(enrichment_router(enrichment_state))
        .merge(storage_router(storage_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Wire gateway, registry and enrichment clients from configuration
pub async fn app_from_config(config: &BentoConfig) -> Result<Router> {
    let timeout = config.enrichment.timeout();
    let gateway = open_gateway(&config.storage, timeout).await?;
    let registry = Arc::new(PageRegistry::new(
        gateway.clone(),
        config.server.public_origin.clone(),
        config.server.share_path.clone(),
    ));
    let enrichment = Arc::new(Enrichment::from_config(&config.enrichment)?);

    Ok(build_app(
        CardsState { registry },
        EnrichmentState { enrichment },
        StorageState { gateway },
        &config.server.cors_origins,
    ))
}

/// Serve the application until Ctrl+C
pub async fn serve(config: &BentoConfig) -> Result<()> {
    let app = app_from_config(config).await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Bento listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down...");
        })
        .await?;
    Ok(())
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let resp = health_check().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_build_cors_empty_origins() {
        let _cors = build_cors(&[]);
    }

    #[test]
    fn test_build_cors_with_origins() {
        let _cors = build_cors(&[
            "http://localhost:5173".to_string(),
            "https://bento.example.com".to_string(),
        ]);
    }

    #[test]
    fn test_api_error_mapping() {
        let err = ApiError::from_error(&Error::NotFound("Card 'x' not found".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"code\":\"NOT_FOUND\""));

        let err = ApiError::from_error(&Error::Enrichment("timeout".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error.code, "SEARCH_FAILED");

        let err = ApiError::from_error(&Error::InvalidInput("bad size".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from_error(&Error::Storage("disk".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error.code, "INTERNAL_ERROR");
    }

    #[derive(Debug, serde::Deserialize)]
    struct SizeBody {
        size: crate::cards::CardSize,
    }

    fn extractor_app() -> Router {
        Router::new()
            .route(
                "/json",
                axum::routing::post(|ApiJson(body): ApiJson<SizeBody>| async move {
                    body.size.to_string()
                }),
            )
            .route(
                "/query",
                get(|ApiQuery(q): ApiQuery<SizeBody>| async move { q.size.to_string() }),
            )
    }

    async fn error_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_rejections_use_envelope() {
        let app = extractor_app();
        for body in [r#"{"size":"huge"}"#, "not json", "{}"] {
            let resp = app
                .clone()
                .oneshot(
                    Request::post("/json")
                        .header("content-type", "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let json = error_body(resp).await;
            assert_eq!(json["error"]["code"], "BAD_REQUEST");
            assert!(json["error"]["message"].is_string());
        }

        // missing content type
        let resp = app
            .clone()
            .oneshot(
                Request::post("/json")
                    .body(Body::from(r#"{"size":"wide"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(resp).await["error"]["code"], "BAD_REQUEST");

        let resp = app
            .oneshot(
                Request::post("/json")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"size":"wide"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_rejections_use_envelope() {
        let resp = extractor_app()
            .oneshot(Request::get("/query").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(resp).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_app_from_config_serves_health() {
        let mut config = BentoConfig::default();
        config.storage.backend = StorageBackend::Memory;
        let app = app_from_config(&config).await.unwrap();

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_app_routes_are_merged() {
        let mut config = BentoConfig::default();
        config.storage.backend = StorageBackend::Memory;
        let app = app_from_config(&config).await.unwrap();

        let resp = app
            .clone()
            .oneshot(
                Request::get("/api/v1/pages/user_merged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::get("/api/v1/storage/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
