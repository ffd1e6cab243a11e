//! Gemini `generateContent` client.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::GeminiConfig;

use super::error::{ApiErrorResponse, InsightsError};

const CACHE_TTL: Duration = Duration::from_secs(600);
const CACHE_CAPACITY: u64 = 256;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which narrative is being generated; each has its own model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    /// Sales and inventory recommendations.
    Sales,
    /// Summary of customer feedback.
    Feedback,
}

/// Client for narrative insights.
///
/// Cheap to clone. When no API key is configured every call returns
/// [`InsightsError::Disabled`] without touching the network.
#[derive(Clone)]
pub struct InsightsClient {
    inner: Arc<InsightsClientInner>,
}

struct InsightsClientInner {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    feedback_model: String,
    cache: Cache<String, String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl InsightsClient {
    /// Create a new insights client.
    #[must_use]
    pub fn new(config: &GeminiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(InsightsClientInner {
                client: reqwest::Client::new(),
                api_key: config.api_key.clone(),
                api_base: config.api_base.trim_end_matches('/').to_owned(),
                model: config.model.clone(),
                feedback_model: config.feedback_model.clone(),
                cache,
            }),
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.api_key.is_some()
    }

    fn model(&self, kind: InsightKind) -> &str {
        match kind {
            InsightKind::Sales => &self.inner.model,
            InsightKind::Feedback => &self.inner.feedback_model,
        }
    }

    /// Generate text for a prompt.
    ///
    /// # Errors
    ///
    /// Returns `InsightsError::Disabled` without an API key, and an HTTP,
    /// API, parse or empty-response error when the call fails.
    #[instrument(skip(self, prompt), fields(model = %self.model(kind)))]
    pub async fn generate(&self, kind: InsightKind, prompt: &str) -> Result<String, InsightsError> {
        let Some(api_key) = self.inner.api_key.as_ref() else {
            return Err(InsightsError::Disabled);
        };

        let model = self.model(kind);
        let cache_key = format!("{model}\n{prompt}");
        if let Some(text) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for insights");
            return Ok(text);
        }

        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .inner
            .client
            .post(format!("{}/models/{model}:generateContent", self.inner.api_base))
            .header("x-goog-api-key", api_key.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            return Err(InsightsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = extract_text(&body)?;
        self.inner.cache.insert(cache_key, text.clone()).await;
        Ok(text)
    }

    /// Generate text, or return `fallback` when anything goes wrong.
    pub async fn generate_or(&self, kind: InsightKind, prompt: &str, fallback: &str) -> String {
        match self.generate(kind, prompt).await {
            Ok(text) => text,
            Err(InsightsError::Disabled) => {
                debug!("Insights disabled, using placeholder");
                fallback.to_owned()
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?kind, "Insight generation failed");
                fallback.to_owned()
            }
        }
    }
}

/// Join the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, InsightsError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| InsightsError::Parse(format!("Failed to parse response: {e}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InsightsError::EmptyResponse);
    }
    Ok(text)
}
