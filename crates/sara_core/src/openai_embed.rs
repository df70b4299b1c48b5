use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::embed::EmbeddingProvider;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Explicit configuration for the remote embedding backend. Passed into the
/// provider constructor rather than read from process-wide globals so tests
/// can point it at a stub server.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the environment. `OPENAI_API_KEY` is required;
    /// `SARA_EMBEDDING_MODEL`, `OPENAI_BASE_URL` and
    /// `SARA_REQUEST_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let mut config = Self::new(api_key);

        if let Ok(model) = env::var("SARA_EMBEDDING_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(raw) = env::var("SARA_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("invalid SARA_REQUEST_TIMEOUT_SECS: {raw}"))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Remote embedding backend speaking the OpenAI `/embeddings` wire format.
///
/// Calls are blocking and strictly sequential; the request timeout comes
/// from [`OpenAiConfig`]. A timed-out or non-2xx response aborts the build
/// or query in progress. Rate-limit backoff, if ever needed, belongs here
/// and not in the callers.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::blocking::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/embeddings",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "model": self.config.model, "input": text }))
            .send()
            .with_context(|| format!("send embeddings request to {url}"))?
            .error_for_status()
            .context("embeddings request rejected")?;

        let body: EmbeddingResponse = response.json().context("parse embeddings response")?;
        let Some(first) = body.data.into_iter().next() else {
            bail!("embeddings response contained no data");
        };
        if first.embedding.is_empty() {
            bail!("embeddings response contained an empty vector");
        }

        Ok(first.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = OpenAiConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn parses_embeddings_response() {
        let body: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#).expect("parse");
        assert_eq!(body.data[0].embedding, vec![0.1, 0.2, 0.3]);
    }
}
