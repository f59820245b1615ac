//! Ollama-backed embedding and generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};

use crate::{config::AssistantConfig, error::RagError};

use super::{Embedder, Generator};

fn build_client(timeout: Duration) -> Result<Client, RagError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn post_json<Req, Resp>(client: &Client, url: &str, body: &Req) -> Result<Resp, RagError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to connect to Ollama server"))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        warn!(%status, error = %error_text, "Ollama request failed");
        return Err(RagError::ServerError(format!(
            "Ollama returned {status}: {error_text}"
        )));
    }

    let parsed: Resp = response
        .json()
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to parse Ollama response"))?;
    Ok(parsed)
}

/// Embeddings through Ollama's `/api/embed` endpoint.
#[derive(Debug)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let embedder = Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
        };

        info!(base_url = %embedder.base_url, model = %embedder.model, "Initialized Ollama embedder");
        Ok(embedder)
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self, RagError> {
        Self::new(
            config.base_url.clone(),
            config.embedding_model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let url = format!("{}/api/embed", self.base_url);
        let response: EmbedResponse = post_json(&self.client, &url, &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingCount {
                expected: texts.len(),
                got: response.embeddings.len(),
            });
        }

        debug!(
            dimensions = response.embeddings.first().map_or(0, Vec::len),
            "Received embeddings from Ollama"
        );
        Ok(response.embeddings)
    }
}

/// Completions through Ollama's `/api/generate` endpoint, non-streaming.
#[derive(Debug)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let generator = Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
        };

        info!(base_url = %generator.base_url, model = %generator.model, "Initialized Ollama generator");
        Ok(generator)
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self, RagError> {
        Self::new(
            config.base_url.clone(),
            config.chat_model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response: GenerateResponse = post_json(&self.client, &url, &request).await?;

        debug!(chars = response.response.chars().count(), "Received completion from Ollama");
        Ok(response.response)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
