//! Advisory text generation.
//!
//! Forwards prompts plus project context to a hosted model and hands the
//! text back. The [`AdvisoryRelay`] owns the prompts and turns every failure
//! into a fixed fallback, so callers never see an error.
//!
//! ## Features
//!
//! - Free-form advice, follow-up drafts, costing help
//! - Production risk analysis and urgency action plans
//! - Skills evaluation and a JSON trend feed

mod context;
mod feed;
#[cfg(feature = "ai")]
mod gemini;
mod guard;
mod relay;

pub use context::{portfolio_context, SkillStats};
pub use feed::{parse_feed, FeedInsight, InsightType};
#[cfg(feature = "ai")]
pub use gemini::GeminiProvider;
pub use guard::{Generation, Ticket};
pub use relay::{fallback, AdvisoryRelay};

use async_trait::async_trait;

/// Which model family a request is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Slow, deep analysis
    Pro,
    /// Fast, cheap calls
    Flash,
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub tier: ModelTier,
    pub contents: String,
    pub system_instruction: Option<String>,
    /// Token budget for the model's reasoning; `Some(0)` disables it
    pub thinking_budget: Option<u32>,
    /// Ask for `application/json` output
    pub json: bool,
}

impl GenerationRequest {
    pub fn new(tier: ModelTier, contents: impl Into<String>) -> Self {
        Self {
            tier,
            contents: contents.into(),
            system_instruction: None,
            thinking_budget: None,
            json: false,
        }
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Trait for text-generation providers.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    /// Run one generation and return the text of the reply.
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Check if the provider is usable (credentials present).
    fn is_available(&self) -> bool;
}

/// Advisory error types.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(String),

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("No response from AI")]
    NoResponse,
}
