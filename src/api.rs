//! HTTP surface for Ringkas.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /upload-and-summarize` – Accept a multipart document upload (field
//!   `documentFile`, optional `language`), extract its text, and return a
//!   markdown summary as `{"summary": ...}`.
//! - `POST /download-pdf` – Accept `{"summary": markdown}` and respond with a
//!   rendered PDF attachment named `hasil.pdf`.
//! - `GET /metrics` – Observe summary/render counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by
//!   tools/hosts.
//!
//! Anything else falls through to the static `public/` frontend. Uploaded
//! files are parked in the ephemeral store for the duration of the request and
//! removed on every outcome before the response is built.

use crate::config::get_config;
use crate::metrics::MetricsSnapshot;
use crate::processing::{PipelineError, SummaryApi};
use crate::upload::UploadStore;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Upload size ceiling. Axum's 2 MiB default would reject ordinary documents;
/// scanned PDFs regularly run into the tens of megabytes.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state handed to every handler.
pub struct AppState<S> {
    service: Arc<S>,
    uploads: Arc<UploadStore>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            uploads: self.uploads.clone(),
        }
    }
}

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>, uploads: Arc<UploadStore>) -> Router
where
    S: SummaryApi + 'static,
{
    Router::new()
        .route("/upload-and-summarize", post(upload_and_summarize::<S>))
        .route("/download-pdf", post(download_pdf::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .fallback_service(ServeDir::new("public"))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service, uploads })
}

/// Success response for the `POST /upload-and-summarize` endpoint.
#[derive(Serialize)]
struct SummaryResponse {
    /// Generated markdown summary.
    summary: String,
}

/// Summarize an uploaded document.
///
/// The upload is written to the ephemeral store, the pipeline runs against the
/// stored path, and the file is removed before the response goes out,
/// whichever way the pipeline resolves.
async fn upload_and_summarize<S>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummaryApi,
{
    let mut document: Option<(Vec<u8>, String)> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::validation(format!("Malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "documentFile" {
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(|err| {
                AppError::validation(format!("Failed to read uploaded file: {err}"))
            })?;
            document = Some((bytes.to_vec(), mime));
        } else if name == "language" {
            language = field
                .text()
                .await
                .ok()
                .filter(|value| !value.trim().is_empty());
        }
    }

    let Some((bytes, mime)) = document else {
        return Err(AppError::validation("No file uploaded."));
    };
    let language = language.unwrap_or_else(|| get_config().default_language.clone());

    let mut upload = state
        .uploads
        .save(&bytes)
        .await
        .map_err(|err| AppError::internal(err.to_string()))?;
    let outcome = state
        .service
        .summarize_document(upload.path(), &mime, &language)
        .await;
    upload.remove().await;

    let summary = outcome?;
    tracing::info!(mime = %mime, language = %language, "Document summarized");
    Ok(Json(SummaryResponse { summary }))
}

/// Request body for the `POST /download-pdf` endpoint.
#[derive(Deserialize)]
struct RenderRequest {
    /// Markdown summary to render; missing or blank input fails validation.
    #[serde(default)]
    summary: Option<String>,
}

/// Render a submitted markdown summary to a downloadable PDF.
async fn download_pdf<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, AppError>
where
    S: SummaryApi,
{
    let summary = request.summary.unwrap_or_default();
    let bytes = state.service.render_summary(&summary).await?;

    tracing::info!(bytes = bytes.len(), "PDF artifact delivered");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"hasil.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Return a concise metrics snapshot with pipeline counters.
async fn get_metrics<S>(State(state): State<AppState<S>>) -> Json<MetricsSnapshot>
where
    S: SummaryApi,
{
    Json(state.service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_and_summarize",
                method: "POST",
                path: "/upload-and-summarize",
                description: "Upload a PDF or DOCX document as multipart field `documentFile` (optional `language` field) and receive { \"summary\": markdown }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "download_pdf",
                method: "POST",
                path: "/download-pdf",
                description: "Render a markdown summary to an A4 PDF returned as an attachment named hasil.pdf.",
                request_example: Some(json!({ "summary": "# Ringkasan\n- poin utama" })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization and render counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

/// Error adapter translating pipeline failures into HTTP responses.
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(error: PipelineError) -> Self {
        if error.is_validation() {
            tracing::warn!(error = %error, "Request rejected");
            Self::validation(error.to_string())
        } else {
            tracing::error!(error = %error, "Request failed");
            Self::internal(error.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}
