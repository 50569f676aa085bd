//! Markdown summary generation via the Gemini generation service.
//!
//! The client mirrors the HTTP adapters elsewhere in the crate: a thin
//! `reqwest` wrapper behind a trait so the retry loop and the pipeline can be
//! tested against scripted fakes. Transient 503 responses are retried a fixed
//! number of times with a fixed delay; every other failure is terminal on the
//! first occurrence.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::get_config;

const DEFAULT_GENERATION_URL: &str = "https://generativelanguage.googleapis.com";
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors surfaced by a single generation-service call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Service reported temporary unavailability (HTTP 503).
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),
    /// Service rejected the request with a non-transient error status.
    #[error("Generation service returned {status}: {body}")]
    Rejected {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Service answered successfully but the response exposed no text.
    #[error("Failed to get a valid response from the AI model: {0}")]
    InvalidResponse(String),
    /// HTTP layer failed before receiving a response.
    #[error("Failed to reach generation service: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GenerationError {
    /// Whether this failure is a transient upstream condition worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Interface implemented by generation-service backends.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produce markdown for the assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Construct a client from the process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        let http = Client::builder()
            .user_agent("ringkas/0.1")
            .timeout(GENERATION_TIMEOUT)
            .build()
            .expect("Failed to construct reqwest::Client for generation");
        Self {
            http,
            base_url: config
                .generation_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GENERATION_URL.to_string()),
            model: config.generation_model.clone(),
            api_key: config.generation_api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Unavailable(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Rejected { status, body });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            GenerationError::InvalidResponse(format!("undecodable response body: {error}"))
        })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(
                "response contained no text parts".into(),
            ));
        }

        Ok(text)
    }
}

/// Bounded-retry policy applied to transient generation failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts permitted, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts. Deliberately not exponential: the goal is
    /// to ride out short upstream unavailability, not to shed load.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Errors produced by the full summarize-with-retry sequence.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Every permitted attempt hit a transient unavailability.
    #[error("Generation service unavailable after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts actually issued.
        attempts: u32,
        /// Message of the final transient failure.
        last_error: String,
    },
    /// A non-transient failure aborted the sequence.
    #[error(transparent)]
    Generation(GenerationError),
}

/// Drives prompt construction and the bounded retry loop around a client.
pub struct Summarizer {
    client: Box<dyn GenerationClient>,
    policy: RetryPolicy,
}

impl Summarizer {
    /// Build a summarizer with the default production policy.
    pub fn new(client: Box<dyn GenerationClient>) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    /// Build a summarizer with an explicit retry policy.
    pub fn with_policy(client: Box<dyn GenerationClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Generate a markdown summary of `text` in `language`.
    ///
    /// Attempts are strictly sequential. Only transient unavailability is
    /// retried, and never on the final permitted attempt; any other failure
    /// propagates immediately.
    pub async fn summarize(&self, text: &str, language: &str) -> Result<String, SummarizeError> {
        let prompt = build_prompt(text, language);
        let mut last_unavailable = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.client.generate(&prompt).await {
                Ok(markdown) => {
                    tracing::info!(attempt, language, "Summary generated");
                    return Ok(markdown);
                }
                Err(error) if error.is_transient() && attempt < self.policy.max_attempts => {
                    tracing::warn!(
                        attempt,
                        delay_secs = self.policy.retry_delay.as_secs(),
                        error = %error,
                        "Generation service unavailable; retrying"
                    );
                    last_unavailable = Some(error);
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(error) if error.is_transient() => {
                    // final permitted attempt: promote instead of retrying
                    return Err(SummarizeError::RetriesExhausted {
                        attempts: attempt,
                        last_error: error.to_string(),
                    });
                }
                Err(error) => return Err(SummarizeError::Generation(error)),
            }
        }

        Err(SummarizeError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            last_error: last_unavailable
                .map(|error| error.to_string())
                .unwrap_or_else(|| "no attempts permitted".to_string()),
        })
    }
}

/// Assemble the fixed instruction template around the document text.
pub fn build_prompt(text: &str, language: &str) -> String {
    format!(
        "Please summarize the following document in {language} with explanations of important topics I need to know.\n\
         Use markdown for headings, bullet points, and important notes. Keep it concise.\n\
         ---\n\
         {text}\n\
         ---"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    fn zero_delay_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
        }
    }

    struct ScriptedClient {
        calls: Arc<AtomicUsize>,
        outcomes: Mutex<VecDeque<Result<String, GenerationError>>>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<Result<String, GenerationError>>) -> (Box<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let client = Box::new(Self {
                calls: calls.clone(),
                outcomes: Mutex::new(outcomes.into()),
            });
            (client, calls)
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .await
                .pop_front()
                .expect("scripted outcome available")
        }
    }

    fn unavailable() -> GenerationError {
        GenerationError::Unavailable("overloaded".into())
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let (client, calls) = ScriptedClient::new(vec![
            Err(unavailable()),
            Err(unavailable()),
            Ok("# Ringkasan".into()),
        ]);
        let summarizer = Summarizer::with_policy(client, zero_delay_policy());

        let summary = summarizer
            .summarize("document", "Indonesian")
            .await
            .expect("summary");
        assert_eq!(summary, "# Ringkasan");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_failures_exhaust_after_three_attempts() {
        let (client, calls) = ScriptedClient::new(vec![
            Err(unavailable()),
            Err(unavailable()),
            Err(unavailable()),
        ]);
        let summarizer = Summarizer::with_policy(client, zero_delay_policy());

        let error = summarizer
            .summarize("document", "Indonesian")
            .await
            .expect_err("exhausted");
        assert!(matches!(
            error,
            SummarizeError::RetriesExhausted { attempts: 3, .. }
        ));
        // no fourth attempt after the budget is spent
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_failure_aborts_without_retry() {
        let (client, calls) = ScriptedClient::new(vec![Err(GenerationError::Rejected {
            status: StatusCode::BAD_REQUEST,
            body: "bad prompt".into(),
        })]);
        let summarizer = Summarizer::with_policy(client, zero_delay_policy());

        let error = summarizer
            .summarize("document", "Indonesian")
            .await
            .expect_err("terminal");
        assert!(matches!(error, SummarizeError::Generation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prompt_embeds_language_and_document() {
        let prompt = build_prompt("the document body", "English");
        assert!(prompt.contains("in English"));
        assert!(prompt.contains("the document body"));
        assert!(prompt.contains("Keep it concise"));
    }

    fn test_client(server: &MockServer) -> GeminiClient {
        GeminiClient {
            http: Client::builder()
                .user_agent("ringkas-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            model: "gemini-2.5-flash".into(),
            api_key: "test-key".into(),
        }
    }

    #[tokio::test]
    async fn gemini_client_extracts_candidate_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent")
                    .header("x-goog-api-key", "test-key");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "## Ringkasan\n- poin" }] }
                    }]
                }));
            })
            .await;

        let text = test_client(&server)
            .generate("Summarize")
            .await
            .expect("text");
        mock.assert();
        assert_eq!(text, "## Ringkasan\n- poin");
    }

    #[tokio::test]
    async fn gemini_client_maps_503_to_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503).body("model overloaded");
            })
            .await;

        let error = test_client(&server)
            .generate("Summarize")
            .await
            .expect_err("unavailable");
        assert!(error.is_transient());
        assert!(matches!(error, GenerationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn gemini_client_maps_other_statuses_to_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).body("quota exceeded");
            })
            .await;

        let error = test_client(&server)
            .generate("Summarize")
            .await
            .expect_err("rejected");
        assert!(!error.is_transient());
        assert!(
            matches!(error, GenerationError::Rejected { status, .. } if status == StatusCode::TOO_MANY_REQUESTS)
        );
    }

    #[tokio::test]
    async fn gemini_client_rejects_textless_success_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let error = test_client(&server)
            .generate("Summarize")
            .await
            .expect_err("invalid shape");
        assert!(matches!(error, GenerationError::InvalidResponse(_)));
    }
}
