//! Advisor chat.
//!
//! In-memory transcript of a conversation with the advisory model. Replies
//! are guarded by a [`Generation`]: a reply that lands after [`AdvisorChat::reset`]
//! is dropped instead of being appended to the fresh transcript.

use crate::ai::{portfolio_context, AdvisoryRelay, Generation};
use crate::core::SharedClock;
use crate::model::{ChatMessage, Project};

/// Opening message of every transcript.
pub const GREETING: &str = "Hello! I am your AI Advisor. I'm equipped with deep industry \
knowledge to help you optimize production efficiency, analyze supply chain risks, and craft \
perfect buyer responses. How can I assist with your styles today?";

/// A chat session with the advisor.
#[derive(Debug)]
pub struct AdvisorChat {
    relay: AdvisoryRelay,
    clock: SharedClock,
    generation: Generation,
    messages: Vec<ChatMessage>,
    thinking: bool,
}

impl AdvisorChat {
    pub fn new(relay: AdvisoryRelay, clock: SharedClock) -> Self {
        let messages = vec![ChatMessage::model(GREETING, clock.now_millis())];
        Self { relay, clock, generation: Generation::new(), messages, thinking: false }
    }

    /// The transcript, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a reply is outstanding.
    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Handle to the staleness counter, for callers that outlive the chat view.
    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    /// Send a question and append the advisor's reply.
    ///
    /// Blank input is ignored. Returns the reply when it was applied.
    pub async fn send(&mut self, input: &str, projects: &[Project]) -> Option<String> {
        if input.trim().is_empty() || self.thinking {
            return None;
        }

        self.messages.push(ChatMessage::user(input, self.clock.now_millis()));
        self.thinking = true;

        let ticket = self.generation.ticket();
        let reply = self.relay.advice(input, &portfolio_context(projects)).await;
        self.thinking = false;

        let mut applied = None;
        let now = self.clock.now_millis();
        let messages = &mut self.messages;
        self.generation.apply_if_current(ticket, || {
            messages.push(ChatMessage::model(reply.clone(), now));
            applied = Some(reply);
        });
        applied
    }

    /// Start over with only the greeting. Outstanding replies become stale.
    pub fn reset(&mut self) {
        self.generation.bump();
        self.thinking = false;
        self.messages = vec![ChatMessage::model(GREETING, self.clock.now_millis())];
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::ai::{fallback, AdvisoryProvider, GenerationRequest};
    use crate::core::ManualClock;
    use crate::model::ChatRole;

    /// Provider that bumps a generation mid-call, like a user navigating away.
    struct NavigatesAway {
        generation: parking_lot::Mutex<Option<Generation>>,
    }

    #[async_trait]
    impl AdvisoryProvider for NavigatesAway {
        async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<String> {
            if let Some(generation) = self.generation.lock().as_ref() {
                generation.bump();
            }
            Ok("late answer".to_string())
        }

        fn name(&self) -> &str {
            "navigates-away"
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_send_appends_user_and_model_messages() {
        let chat_clock = Arc::new(ManualClock::new(1_000));
        let mut chat = AdvisorChat::new(AdvisoryRelay::disabled(), chat_clock);

        let reply = chat.send("Which mill for twill?", &[]).await;
        assert_eq!(reply.as_deref(), Some(fallback::ADVICE));

        let roles: Vec<ChatRole> = chat.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::Model, ChatRole::User, ChatRole::Model]);
        assert_eq!(chat.messages()[1].content, "Which mill for twill?");
        assert!(!chat.is_thinking());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut chat = AdvisorChat::new(AdvisoryRelay::disabled(), Arc::new(ManualClock::new(0)));
        assert!(chat.send("   ", &[]).await.is_none());
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].content, GREETING);
    }

    #[tokio::test]
    async fn test_reply_after_navigation_is_discarded() {
        let provider = Arc::new(NavigatesAway { generation: parking_lot::Mutex::new(None) });
        let mut chat = AdvisorChat::new(
            AdvisoryRelay::new(provider.clone()),
            Arc::new(ManualClock::new(0)),
        );
        *provider.generation.lock() = Some(chat.generation());

        let reply = chat.send("status?", &[]).await;
        assert!(reply.is_none());
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[1].role, ChatRole::User);
    }

    #[test]
    fn test_reset_restores_greeting() {
        let mut chat = AdvisorChat::new(AdvisoryRelay::disabled(), Arc::new(ManualClock::new(0)));
        let before = chat.generation();
        let ticket = before.ticket();
        chat.reset();
        assert!(!before.is_current(ticket));
        assert_eq!(chat.messages().len(), 1);
    }
}
