//! Key-holding proxy: browsers post the photo here and never see the API key.

use crate::core::analyzer::PrescriptionAnalyzer;
use crate::core::photo::{data_uri_mime, strip_data_uri, JPEG_MIME};
use crate::domain::ports::GenerativeModel;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const HEALTH_MESSAGE: &str = "Aushadh-AI Proxy is running!";
pub const PROCESS_PATH: &str = "/api/process-prescription";

const MISSING_IMAGE: &str = "Image data is required.";
const TOO_LARGE: &str = "Image is too large.";
const PROCESSING_FAILED: &str = "Processing failed on the server.";
const RATE_LIMITED: &str = "High traffic. Please wait a moment.";

pub struct ProxyState<M: GenerativeModel> {
    analyzer: Arc<PrescriptionAnalyzer<M>>,
}

impl<M: GenerativeModel> ProxyState<M> {
    pub fn new(analyzer: PrescriptionAnalyzer<M>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

impl<M: GenerativeModel> Clone for ProxyState<M> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// Base64 photo, with or without a `data:` prefix.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn router<M: GenerativeModel + 'static>(state: ProxyState<M>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(health))
        .route(PROCESS_PATH, post(process_prescription::<M>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

async fn process_prescription<M: GenerativeModel + 'static>(
    State(state): State<ProxyState<M>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Response {
    let image = match payload {
        Ok(Json(request)) => request.image.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                return error_response(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE);
            }
            return error_response(StatusCode::BAD_REQUEST, MISSING_IMAGE);
        }
    };

    if image.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, MISSING_IMAGE);
    }

    let mime_type = data_uri_mime(&image).unwrap_or(JPEG_MIME).to_string();
    let data = strip_data_uri(&image);

    match state.analyzer.analyze_raw(data, &mime_type).await {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) if e.is_rate_limited() => {
            tracing::warn!("Model rate limited the proxy: {}", e);
            error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED)
        }
        Err(e) => {
            tracing::error!("Prescription processing failed: {} ({:?})", e, e.category());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED)
        }
    }
}

/// Serves until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    tracing::info!("Proxy listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down proxy");
        })
        .await
}
