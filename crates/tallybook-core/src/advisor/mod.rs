//! Advisory text generation
//!
//! Turns a finalized [`AdvisorySummary`] into prose: a saving plan, spending
//! insights or an explanation of anomalies. The summary is embedded in the
//! prompt as JSON and travels back out alongside the generated text, so the
//! figures shown to users always come from the summary.
//!
//! # Architecture
//!
//! - `AdvisoryBackend` trait: one prompt in, one completion out
//! - `AdvisoryClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//! - `Advisor`: renders prompts from the [`PromptLibrary`] and calls the backend

mod mock;
mod ollama;

pub use mock::{MockBackend, MOCK_RESPONSE};
pub use ollama::OllamaBackend;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::anomaly::DEFAULT_THRESHOLD_RATIO;
use crate::config::{AdvisorConfig, BackendKind};
use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};
use crate::summary::AdvisorySummary;

/// Interface for text-generation backends
#[async_trait]
pub trait AdvisoryBackend: Send + Sync {
    /// Generate a completion for a fully rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete advisory client enum
#[derive(Clone)]
pub enum AdvisoryClient {
    Ollama(OllamaBackend),
    Mock(MockBackend),
}

impl AdvisoryClient {
    /// Build the configured backend; `None` when advice is disabled
    pub fn from_config(config: &AdvisorConfig) -> Result<Option<Self>> {
        match config.backend {
            BackendKind::Ollama => Ok(Some(AdvisoryClient::Ollama(
                OllamaBackend::from_config(config)?,
            ))),
            BackendKind::Mock => Ok(Some(AdvisoryClient::Mock(MockBackend::new()))),
            BackendKind::Disabled => Ok(None),
        }
    }
}

#[async_trait]
impl AdvisoryBackend for AdvisoryClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            AdvisoryClient::Ollama(b) => b.generate(prompt).await,
            AdvisoryClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AdvisoryClient::Ollama(b) => b.health_check().await,
            AdvisoryClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AdvisoryClient::Ollama(b) => b.model(),
            AdvisoryClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AdvisoryClient::Ollama(b) => b.host(),
            AdvisoryClient::Mock(b) => b.host(),
        }
    }
}

/// What kind of advice to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdviceKind {
    SavingPlan,
    Insights,
    Anomalies,
}

impl AdviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SavingPlan => "saving-plan",
            Self::Insights => "insights",
            Self::Anomalies => "anomalies",
        }
    }

    pub fn prompt_id(&self) -> PromptId {
        match self {
            Self::SavingPlan => PromptId::SavingPlan,
            Self::Insights => PromptId::SpendingInsights,
            Self::Anomalies => PromptId::AnomalyExplanation,
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdviceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "saving-plan" | "plan" | "savings" => Ok(Self::SavingPlan),
            "insights" | "spending" => Ok(Self::Insights),
            "anomalies" | "anomaly" => Ok(Self::Anomalies),
            _ => Err(format!(
                "Unknown advice kind: {} (valid: saving-plan, insights, anomalies)",
                s
            )),
        }
    }
}

/// Generated prose paired with the summary it was generated from
#[derive(Debug, Clone, Serialize)]
pub struct Advice {
    pub kind: AdviceKind,
    pub summary: AdvisorySummary,
    pub text: String,
    pub model: String,
}

/// Renders advisory prompts and sends them to a backend
pub struct Advisor {
    backend: Option<AdvisoryClient>,
    prompts: Arc<RwLock<PromptLibrary>>,
    threshold_ratio: f64,
}

impl Advisor {
    /// `backend` may be `None` when only rendering prompts
    pub fn new(backend: Option<AdvisoryClient>, prompts: PromptLibrary) -> Self {
        Self {
            backend,
            prompts: Arc::new(RwLock::new(prompts)),
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
        }
    }

    /// Ratio quoted by the anomaly explanation prompt
    pub fn with_threshold_ratio(mut self, threshold_ratio: f64) -> Self {
        self.threshold_ratio = threshold_ratio;
        self
    }

    pub fn backend(&self) -> Option<&AdvisoryClient> {
        self.backend.as_ref()
    }

    /// Render the prompt for `kind` with the summary embedded as JSON
    pub fn render_prompt(
        &self,
        kind: AdviceKind,
        summary: &AdvisorySummary,
        goal: Option<&str>,
    ) -> Result<String> {
        let summary_json = summary.to_json()?;
        let threshold_ratio = self.threshold_ratio.to_string();

        let mut vars: HashMap<&str, &str> = HashMap::new();
        vars.insert("period", &summary.period);
        vars.insert("summary_json", &summary_json);
        vars.insert("threshold_ratio", &threshold_ratio);
        if let Some(goal) = goal {
            vars.insert("goal", goal);
        }

        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::Prompt("Failed to acquire prompt library lock".into()))?;
        let prompt = prompts.get(kind.prompt_id())?;
        Ok(prompt.render_plain(&vars))
    }

    /// Generate advice for a summary
    pub async fn advise(
        &self,
        kind: AdviceKind,
        summary: AdvisorySummary,
        goal: Option<&str>,
    ) -> Result<Advice> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| Error::Backend("No advisory backend configured".into()))?;

        let prompt = self.render_prompt(kind, &summary, goal)?;
        info!(
            kind = %kind,
            model = backend.model(),
            host = backend.host(),
            "Requesting advice"
        );
        let text = backend.generate(&prompt).await?;

        Ok(Advice {
            kind,
            summary,
            text,
            model: backend.model().to_string(),
        })
    }
}
