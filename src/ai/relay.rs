//! The advisory relay.
//!
//! Builds each prompt, sends it through the configured provider and returns
//! the reply verbatim. On any failure (no provider, network, provider error,
//! unparseable output) the relay returns the fixed fallback for that call.
//! There is no retry, backoff, caching or rate limiting.

use std::sync::Arc;

use serde_json::Value;

use super::context::SkillStats;
use super::feed::{parse_feed, FeedInsight};
use super::{AdvisoryProvider, GenerationRequest, ModelTier};
use crate::model::{Project, WorkflowStep, WorkflowStepId};

/// Fixed replies used when a call fails.
pub mod fallback {
    pub const ADVICE: &str = "Strategic analysis failed. Please retry your query.";
    pub const EMPTY_ADVICE: &str = "I couldn't generate a response at this time.";
    pub const FOLLOW_UP: &str = "Failed to generate follow-up template.";
    pub const COSTING: &str = "AI Assistant is currently unavailable.";
    pub const SKILLS: &str = "Keep up the consistent effort! Your score: 85/100";
    pub const RISKS: &str = "Risk analysis is currently unavailable. Please check back later.";
    pub const URGENCY: &str = "Urgency planning is currently unavailable.";
}

const ADVISOR_PERSONA: &str = "You are an elite Garments Industry Advisor with 20+ years of \
experience in Merchandising, Supply Chain, and Production. Provide highly efficient, tactical \
advice. Use thinking mode to analyze complex bottlenecks.";

/// Prompt builder and failure normalizer in front of an [`AdvisoryProvider`].
#[derive(Clone, Default)]
pub struct AdvisoryRelay {
    provider: Option<Arc<dyn AdvisoryProvider>>,
}

impl std::fmt::Debug for AdvisoryRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisoryRelay").field("provider", &self.provider_name()).finish()
    }
}

impl AdvisoryRelay {
    pub fn new(provider: Arc<dyn AdvisoryProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    /// A relay with no provider; every call returns its fallback.
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    /// Build the relay described by config. Missing credentials disable it.
    #[cfg(feature = "ai")]
    pub fn from_config(config: &crate::core::AiConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        if config.provider != "gemini" {
            tracing::warn!(provider = %config.provider, "Unknown advisory provider");
            return Self::disabled();
        }
        match super::GeminiProvider::from_config(config) {
            Ok(provider) => Self::new(Arc::new(provider)),
            Err(e) => {
                tracing::warn!(error = %e, "Advisory provider unavailable");
                Self::disabled()
            }
        }
    }

    /// Check if a usable provider is configured.
    pub fn is_available(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_available())
    }

    /// Get the active provider name.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name())
    }

    async fn call(&self, request: GenerationRequest) -> Option<String> {
        let provider = self.provider.as_ref()?;
        match provider.generate(&request).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "Advisory call failed");
                None
            }
        }
    }

    /// Free-form question answered with the given context.
    pub async fn advice(&self, prompt: &str, context: &Value) -> String {
        let context = if context.is_null() { Value::Object(Default::default()) } else { context.clone() };
        let request = GenerationRequest::new(
            ModelTier::Pro,
            format!("Context: {context} \n\nUser Question: {prompt}"),
        )
        .with_system(ADVISOR_PERSONA)
        .with_thinking_budget(32_768);

        match self.call(request).await {
            Some(text) if text.trim().is_empty() => fallback::EMPTY_ADVICE.to_string(),
            Some(text) => text,
            None => fallback::ADVICE.to_string(),
        }
    }

    /// Three follow-up message variations for a delayed step.
    pub async fn follow_up(&self, project: &Project, step: &WorkflowStep) -> String {
        let contents = format!(
            "Generate a professional yet firm follow-up message for a supplier/team regarding the following delayed task:
Project: {} ({})
Task: {}
Due Date: {}
Buyer: {}
Provide 3 variations: 1. Professional, 2. Urgent, 3. Internal Team reminder.",
            project.style_name,
            project.style_number,
            step.label,
            step.due_date.as_deref().unwrap_or("not set"),
            project.buyer_name,
        );
        let request = GenerationRequest::new(ModelTier::Pro, contents).with_thinking_budget(16_000);
        self.call(request).await.unwrap_or_else(|| fallback::FOLLOW_UP.to_string())
    }

    /// FOB costing breakdown and sourcing savings.
    pub async fn costing_assistant(&self, project: &Project) -> String {
        let contents = format!(
            "Analyze the following garment product details and suggest a breakdown for FOB costing.
Help me identify potential savings in fabric or trim sourcing.
Style: {}, Quantity: {}, Buyer: {}.",
            project.style_name, project.quantity, project.buyer_name,
        );
        let request = GenerationRequest::new(ModelTier::Pro, contents).with_thinking_budget(24_000);
        self.call(request).await.unwrap_or_else(|| fallback::COSTING.to_string())
    }

    /// Bottleneck risks and mitigations for a project.
    pub async fn production_risks(&self, project: &Project) -> String {
        let contents = format!(
            "Analyze potential production risks for the following garment project:
Style: {}, Quantity: {}, Target Ship Date: {}.
Current Status: {}.
Identify bottleneck risks and suggest specific mitigation strategies.",
            project.style_name,
            project.quantity,
            project.ship_date,
            project.current_stage_label(),
        );
        let request = GenerationRequest::new(ModelTier::Pro, contents).with_thinking_budget(32_768);
        self.call(request).await.unwrap_or_else(|| fallback::RISKS.to_string())
    }

    /// Immediate action plan for a project marked urgent.
    pub async fn urgency_action_plan(&self, project: &Project) -> String {
        let contents = format!(
            "This garment project is marked as URGENT. Create an immediate, high-priority action plan.
Style: {}, Ship Date: {}.
Current Stage: {}.
Provide a step-by-step list of actions to ensure no delivery delays.",
            project.style_name,
            project.ship_date,
            project.current_stage_label(),
        );
        let request = GenerationRequest::new(ModelTier::Pro, contents).with_thinking_budget(32_768);
        self.call(request).await.unwrap_or_else(|| fallback::URGENCY.to_string())
    }

    /// Analysis for the step being viewed: costing help at the costing
    /// stage, risk analysis everywhere else.
    pub async fn step_analysis(&self, project: &Project, step: &WorkflowStep) -> String {
        if step.id == WorkflowStepId::CostingQuotation {
            self.costing_assistant(project).await
        } else {
            self.production_risks(project).await
        }
    }

    /// Short performance summary with a score out of 100.
    pub async fn evaluate_skills(&self, stats: &SkillStats) -> String {
        let stats = serde_json::to_string(stats).unwrap_or_default();
        let contents = format!(
            "Evaluate a Merchandiser's monthly performance summary (2-3 sentences) and a score out of 100 based on {stats}."
        );
        let request = GenerationRequest::new(ModelTier::Flash, contents).with_thinking_budget(0);
        self.call(request).await.unwrap_or_else(|| fallback::SKILLS.to_string())
    }

    /// Four trend insights for the active styles. Empty on any failure.
    pub async fn feed_suggestions(&self, projects: &[Project]) -> Vec<FeedInsight> {
        let project_context = projects
            .iter()
            .map(|p| format!("{} ({})", p.style_name, p.season))
            .collect::<Vec<_>>()
            .join(", ");
        let contents = format!(
            r#"You are a garments industry trend expert. Based on these active projects: {project_context},
provide 4 high-value insights in JSON format.
Include:
1. A fabric trend relevant to these styles.
2. A trim/accessory innovation.
3. A production efficiency tip.
4. Global apparel industry news impact.

Format as JSON array of objects with keys: "type" (Fabric/Trims/Production/News), "title", "description", "styleContext"."#
        );
        let request =
            GenerationRequest::new(ModelTier::Flash, contents).with_thinking_budget(0).json();

        self.call(request).await.map(|text| parse_feed(&text)).unwrap_or_default()
    }
}
