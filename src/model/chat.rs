//! Advisor chat transcript entries.

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One message in the advisor transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self { role: ChatRole::User, content: content.into(), timestamp }
    }

    pub fn model(content: impl Into<String>, timestamp: i64) -> Self {
        Self { role: ChatRole::Model, content: content.into(), timestamp }
    }
}
