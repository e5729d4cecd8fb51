//! Remote encoder speaking the OpenAI-compatible `/embeddings` protocol
//! (text-embeddings-inference, vLLM, Ollama and hosted APIs all expose it).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Embedder, EmbeddingError};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const PROBE_TEXT: &str = "embedding dimension probe";

#[derive(Debug, Clone)]
pub struct RemoteEmbedderConfig {
    /// Full endpoint URL, e.g. `http://localhost:8081/v1/embeddings`.
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Expected dimension. When set, a server returning anything else is rejected at connect.
    pub dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct RemoteEmbedder {
    client: Client,
    config: RemoteEmbedderConfig,
    dimension: usize,
}

impl RemoteEmbedder {
    /// Builds the client and embeds a probe string to learn the model's dimension.
    /// Fails when the service is unreachable or answers with something unusable.
    pub async fn connect(config: RemoteEmbedderConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut embedder = Self {
            client,
            config,
            dimension: 0,
        };

        let probe = embedder.request(PROBE_TEXT).await?;
        if probe.is_empty() {
            return Err(EmbeddingError::Unusable(
                "embedding service returned an empty vector".to_string(),
            ));
        }
        if let Some(expected) = embedder.config.dimension {
            if expected != probe.len() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: probe.len(),
                });
            }
        }
        embedder.dimension = probe.len();

        info!(
            "Remote embedder ready (model: {}, dimension: {})",
            embedder.config.model, embedder.dimension
        );
        Ok(embedder)
    }

    /// POSTs one input, retrying 429 and 5xx responses with exponential backoff.
    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: [text],
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = retry_delay(attempt);
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.config.url).json(&body);
            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            let text = response.text().await?;

            if !status.is_success() {
                let message = serde_json::from_str::<ApiError>(&text)
                    .map(|e| e.error.message)
                    .unwrap_or(text);
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let vector = parse_response(&text)?;
            debug!("Embedding call succeeded: dimension={}", vector.len());
            return Ok(vector);
        }

        Err(last_error.unwrap_or_else(|| {
            EmbeddingError::Unusable(format!("no response after {MAX_RETRIES} attempts"))
        }))
    }
}

/// Backoff before retry `attempt` (1-based): 500ms, then doubling.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(500 * (1 << (attempt - 1)))
}

fn parse_response(body: &str) -> Result<Vec<f32>, EmbeddingError> {
    let response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EmbeddingError::InvalidResponse(format!("malformed body: {e}")))?;
    response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| EmbeddingError::InvalidResponse("response has no data".to_string()))
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn version(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request(text).await
    }
}
