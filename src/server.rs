use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use maud::Markup;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{
    pages, AppConfig, CaptureError, CaptureOutcome, CaptureService, CaptureStore, MetaInspector,
    MetaReport,
};

pub struct AppState {
    pub config: AppConfig,
    pub store: CaptureStore,
    pub captures: CaptureService,
    pub inspector: MetaInspector,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = CaptureStore::new(config.data_file.clone());
        let captures = CaptureService::new(config.clone(), store.clone());
        Self {
            config,
            store,
            captures,
            inspector: MetaInspector::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UrlRequest {
    #[serde(default)]
    url: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let images_dir = state.config.images_dir.clone();

    Router::new()
        .route("/", get(index))
        .route("/api/capture", post(capture))
        .route("/api/check-meta", post(check_meta))
        .route("/short/{id}", get(short_link))
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let router = build_router(state);

    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn index() -> Markup {
    pages::index_page()
}

async fn capture(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<UrlRequest>,
) -> Result<Json<CaptureOutcome>, CaptureError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let outcome = state.captures.capture(&request.url, host).await?;
    Ok(Json(outcome))
}

async fn check_meta(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UrlRequest>,
) -> Response {
    if request.url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Please provide a URL",
                "statusCode": 0,
            })),
        )
            .into_response();
    }

    match state.inspector.inspect(&request.url).await {
        Ok(report) => Json::<MetaReport>(report).into_response(),
        Err(CaptureError::UpstreamFetch { status, message }) => {
            warn!(status = ?status, error = %message, "Meta inspection fetch failed");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Could not fetch the requested page",
                    "statusCode": status.unwrap_or(0),
                })),
            )
                .into_response()
        }
        Err(CaptureError::Validation(message)) => {
            warn!(error = %message, "Meta inspection URL rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Please provide a valid URL",
                    "statusCode": 0,
                })),
            )
                .into_response()
        }
        Err(other) => other.into_response(),
    }
}

async fn short_link(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.find(&id) {
        Some(record) => pages::short_link_page(&record, &state.config.public_domain).into_response(),
        None => (StatusCode::NOT_FOUND, pages::not_found_page()).into_response(),
    }
}
