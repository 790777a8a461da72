//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advise` - Advisory text generation from a month's summary
//! - `core` - Shared utilities (snapshot loading, timezone and date flags)
//! - `prompts` - Prompt library management commands
//! - `reports` - Summary, streak and anomaly reports
//! - `status` - Effective configuration

pub mod advise;
pub mod core;
pub mod prompts;
pub mod reports;
pub mod status;

// Re-export command functions for main.rs
pub use advise::*;
pub use core::*;
pub use prompts::*;
pub use reports::*;
pub use status::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
