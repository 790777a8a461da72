//! Tallybook Core Library
//!
//! Computation engine for the Tallybook finance and wellness companion:
//! - Time-bucketed totals by local day, ISO week and month
//! - Activity streaks over local calendar days
//! - Spending anomaly detection against per-category baselines
//! - Snapshot normalization with data-quality reporting
//! - Advisory summaries and prompt rendering for local text generation

pub mod advisor;
pub mod aggregate;
pub mod anomaly;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod snapshot;
pub mod streak;
pub mod summary;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{
    Advice, AdviceKind, Advisor, AdvisoryBackend, AdvisoryClient, MockBackend, OllamaBackend,
};
pub use aggregate::{
    to_decimal, to_f64, Aggregation, Aggregator, BucketTotals, CategoryTotal, Totals, Window,
};
pub use anomaly::{Anomaly, AnomalyConfig, AnomalyDetector, CategoryBaseline};
pub use config::{AdvisorConfig, BackendKind, TallyConfig};
pub use error::{Error, Result};
pub use models::{DataQualityIssue, DayKey, Granularity, Record, RecordKind};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use snapshot::{load_snapshot, parse_snapshot, RawRecord, SnapshotReport};
pub use streak::{
    compute_streak, compute_streak_today, compute_streak_with_cap, longest_streak, today_in,
};
pub use summary::{round_money, round_total, AdvisorySummary};
