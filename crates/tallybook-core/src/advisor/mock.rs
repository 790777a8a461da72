//! Mock backend for testing
//!
//! Returns a fixed response and records every prompt it receives, so tests can
//! assert on what would have been sent to a real model.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AdvisoryBackend;

/// Default text returned by [`MockBackend::generate`]
pub const MOCK_RESPONSE: &str = "You spent most on your top category. Consider a weekly cap.";

#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true (and generate succeed)
    pub healthy: bool,
    response: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            response: MOCK_RESPONSE.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.healthy {
            return Err(Error::Backend("Mock backend is unavailable".into()));
        }
        self.prompts
            .lock()
            .map_err(|_| Error::Backend("Mock prompt log poisoned".into()))?
            .push(prompt.to_string());
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
