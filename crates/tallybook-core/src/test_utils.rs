//! Test utilities for tallybook-core
//!
//! This module provides a mock Ollama server for development and integration
//! tests. Responses are canned prose keyed off the prompt text, so tests can
//! tell which advisory prompt reached the server.

use std::net::SocketAddr;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

/// Canned reply for saving-plan prompts
pub const MOCK_SAVING_PLAN: &str = "Set aside a fixed amount each week and trim your top category.";
/// Canned reply for anomaly-explanation prompts
pub const MOCK_ANOMALY_EXPLANATION: &str = "One purchase stood out against your usual spending.";
/// Canned reply for any other prompt
pub const MOCK_INSIGHTS: &str = "Most of your money went to your top category this period.";

/// How `/api/generate` answers
#[derive(Debug, Clone, Copy)]
enum Behavior {
    Canned,
    Failing,
    Blank,
}

/// Ollama stand-in bound to a random local port, shut down on drop
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Answers each prompt with the canned reply matching its wording
    pub async fn start() -> Self {
        Self::spawn(Behavior::Canned).await
    }

    /// Healthy `/api/tags`, but every generate call returns 500
    pub async fn start_failing() -> Self {
        Self::spawn(Behavior::Failing).await
    }

    /// Generate calls succeed with a whitespace-only response
    pub async fn start_empty() -> Self {
        Self::spawn(Behavior::Blank).await
    }

    async fn spawn(behavior: Behavior) -> Self {
        let app = Router::new()
            .route("/api/tags", get(tags))
            .route("/api/generate", post(generate))
            .with_state(behavior);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    model: String,
    prompt: String,
}

async fn tags() -> Json<serde_json::Value> {
    Json(json!({
        "models": [{ "name": "llama3.2:latest", "size": 2_019_393_189u64 }]
    }))
}

async fn generate(State(behavior): State<Behavior>, Json(body): Json<GenerateBody>) -> Response {
    let text = match behavior {
        Behavior::Failing => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
        Behavior::Blank => "   ",
        // Keyed off phrases in prompts/*.md
        Behavior::Canned if body.prompt.contains("saving plan") => MOCK_SAVING_PLAN,
        Behavior::Canned if body.prompt.contains("unusual expenses") => MOCK_ANOMALY_EXPLANATION,
        Behavior::Canned => MOCK_INSIGHTS,
    };

    Json(json!({ "model": body.model, "response": text, "done": true })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{AdvisoryBackend, OllamaBackend};

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");

        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_routes_by_prompt() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");

        let plan = client.generate("Suggest a saving plan for next month").await.unwrap();
        assert_eq!(plan, MOCK_SAVING_PLAN);

        let explanation = client
            .generate("Explain the unusual expenses for 2024-05")
            .await
            .unwrap();
        assert_eq!(explanation, MOCK_ANOMALY_EXPLANATION);

        let insights = client.generate("Summarize my spending").await.unwrap();
        assert_eq!(insights, MOCK_INSIGHTS);
    }
}
