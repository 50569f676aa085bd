//! Pipeline orchestration: extraction, summarization, and rendering.
//!
//! [`SummaryService`] owns the long-lived collaborators (generation client,
//! rendering engine, metrics registry) so the HTTP surface works against a
//! single shared handle. Construct the service once near process start and
//! share it through an `Arc`. The [`SummaryApi`] trait is the seam the router
//! and the tests program against.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::extract::{self, ExtractError};
use crate::metrics::{MetricsSnapshot, UsageMetrics};
use crate::render::{ChromiumEngine, RenderEngine, RenderError, Renderer};
use crate::summarize::{GeminiClient, GenerationClient, SummarizeError, Summarizer};

/// Errors emitted by the document pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extraction failed or rejected the uploaded document.
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    /// The generation service failed to produce a summary.
    #[error(transparent)]
    Generation(#[from] SummarizeError),
    /// The summary could not be rendered to a PDF artifact.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Whether the failure is user-correctable bad input rather than a
    /// processing error; drives the 400-versus-500 split at the HTTP boundary.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Extraction(
                ExtractError::UnsupportedType(_)
                    | ExtractError::LegacyWordDocument
                    | ExtractError::NoExtractableText
            ) | Self::Render(RenderError::EmptyMarkdown)
        )
    }
}

/// Interface implemented by the document pipeline.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Extract text from the uploaded file and summarize it in `language`.
    async fn summarize_document(
        &self,
        path: &Path,
        mime: &str,
        language: &str,
    ) -> Result<String, PipelineError>;

    /// Render a markdown summary to PDF bytes.
    async fn render_summary(&self, markdown: &str) -> Result<Vec<u8>, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Production pipeline wiring extraction, Gemini summarization, and Chromium
/// rendering together.
pub struct SummaryService {
    summarizer: Summarizer,
    renderer: Renderer,
    metrics: Arc<UsageMetrics>,
}

impl SummaryService {
    /// Build the production service from process configuration.
    pub fn new() -> Self {
        Self::with_components(
            Box::new(GeminiClient::from_config()),
            Box::new(ChromiumEngine::new()),
        )
    }

    /// Assemble a service from explicit collaborators.
    ///
    /// Tests use this to swap in scripted generation clients and fake
    /// rendering engines.
    pub fn with_components(
        client: Box<dyn GenerationClient>,
        engine: Box<dyn RenderEngine>,
    ) -> Self {
        Self {
            summarizer: Summarizer::new(client),
            renderer: Renderer::new(engine),
            metrics: Arc::new(UsageMetrics::new()),
        }
    }
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryApi for SummaryService {
    async fn summarize_document(
        &self,
        path: &Path,
        mime: &str,
        language: &str,
    ) -> Result<String, PipelineError> {
        let text = extract::extract(path, mime).await?;
        tracing::debug!(chars = text.len(), language, "Submitting document for summarization");
        let summary = self.summarizer.summarize(&text, language).await?;
        self.metrics.record_summary();
        Ok(summary)
    }

    async fn render_summary(&self, markdown: &str) -> Result<Vec<u8>, PipelineError> {
        let bytes = self.renderer.render(markdown).await?;
        self.metrics.record_render();
        Ok(bytes)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
