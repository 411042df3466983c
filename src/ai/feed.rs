//! Trend feed suggestions returned as JSON by the model.

use serde::{Deserialize, Serialize};

/// Category of a feed insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightType {
    Fabric,
    Trims,
    Production,
    News,
}

/// One card in the discovery feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedInsight {
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub style_context: String,
}

/// Parse the model's JSON array. Anything unparseable yields an empty feed.
///
/// A surrounding markdown code fence is tolerated.
pub fn parse_feed(text: &str) -> Vec<FeedInsight> {
    let trimmed = strip_code_fence(text.trim());
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<FeedInsight>>(trimmed) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Feed response was not a valid insight array");
            Vec::new()
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
