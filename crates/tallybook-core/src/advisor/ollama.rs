//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. One prompt in, one completion out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::error::{Error, Result};

use super::AdvisoryBackend;

#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend with reqwest's default client
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create a backend whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Self::with_timeout(&config.host, &config.model, config.timeout)
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AdvisoryBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending Ollama generate request");

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        let text = ollama_response.response.trim();
        if text.is_empty() {
            return Err(Error::Backend(format!(
                "Ollama model {} returned an empty response",
                self.model
            )));
        }

        debug!("Ollama response: {}", text);
        Ok(text.to_string())
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockOllamaServer, MOCK_INSIGHTS};

    #[test]
    fn test_model_and_host() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
        assert_eq!(backend.with_model("gemma3").model(), "gemma3");
    }

    #[test]
    fn test_from_config() {
        let backend = OllamaBackend::from_config(&AdvisorConfig::default()).unwrap();
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockOllamaServer::start().await;
        let backend =
            OllamaBackend::with_timeout(&server.url(), "test-model", Duration::from_secs(5))
                .unwrap();

        assert!(backend.health_check().await);
        let text = backend.generate("How did my spending go?").await.unwrap();
        assert_eq!(text, MOCK_INSIGHTS);
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockOllamaServer::start_failing().await;
        let backend = OllamaBackend::new(&server.url(), "test-model");

        let result = backend.generate("anything").await;
        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn test_empty_response_is_backend_error() {
        let server = MockOllamaServer::start_empty().await;
        let backend = OllamaBackend::new(&server.url(), "test-model");

        let result = backend.generate("anything").await;
        assert!(matches!(result, Err(Error::Backend(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unhealthy() {
        let backend = OllamaBackend::with_timeout(
            "http://127.0.0.1:1",
            "test-model",
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(!backend.health_check().await);
    }
}
