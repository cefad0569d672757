//! Chat session against the backend search endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::backend::QaBackend;
use crate::error::{Error, Result};
use crate::models::SearchAnswer;

pub const GREETING: &str = "Hello 👋! How can I help you today?";
pub const NO_ANSWER_REPLY: &str = "🤖 Sorry, I couldn't find an answer.";
pub const ERROR_REPLY: &str = "⚠️ Error fetching response";

/// Answer the backend sends when no stored question matched.
const NO_MATCH_SENTINEL: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Transcript of one conversation with a collection.
#[derive(Debug, Clone)]
pub struct ChatSession {
    collection: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            messages: vec![ChatMessage::new(Sender::Bot, GREETING)],
        }
    }

    /// Record `input`, ask the backend, and record its reply.
    ///
    /// Blank input is rejected without touching the transcript. A failed
    /// request still records [`ERROR_REPLY`] and then returns the error.
    pub async fn send(&mut self, backend: &dyn QaBackend, input: &str) -> Result<&ChatMessage> {
        if input.trim().is_empty() {
            return Err(Error::invalid("message is empty"));
        }
        self.messages.push(ChatMessage::new(Sender::User, input));

        let reply = match backend.search(&self.collection, input).await {
            Ok(answer) => reply_text(&answer).to_string(),
            Err(e) => {
                warn!(collection = %self.collection, error = %e, "search failed");
                self.messages.push(ChatMessage::new(Sender::Bot, ERROR_REPLY));
                return Err(e);
            }
        };
        self.messages.push(ChatMessage::new(Sender::Bot, reply));
        Ok(self.last())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn last(&self) -> &ChatMessage {
        // The transcript always starts with the greeting.
        &self.messages[self.messages.len() - 1]
    }
}

/// Text shown to the user for a search response.
pub fn reply_text(answer: &SearchAnswer) -> &str {
    match answer.human_like_answer.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() && text != NO_MATCH_SENTINEL => text,
        _ => NO_ANSWER_REPLY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::models::QaDraft;

    async fn backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new().with_collection("CustomAi");
        backend
            .insert_item(
                "CustomAi",
                &QaDraft::new("What are your opening hours?", "We open at nine."),
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn starts_with_greeting() {
        let session = ChatSession::new("CustomAi");
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].sender, Sender::Bot);
        assert_eq!(session.messages()[0].text, GREETING);
    }

    #[tokio::test]
    async fn records_question_and_answer() {
        let backend = backend().await;
        let mut session = ChatSession::new("CustomAi");

        let reply = session.send(&backend, "opening hours?").await.unwrap();
        assert_eq!(reply.text, "We open at nine.");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[1].sender, Sender::User);
    }

    #[tokio::test]
    async fn no_match_uses_fallback_reply() {
        let backend = backend().await;
        let mut session = ChatSession::new("CustomAi");

        let reply = session.send(&backend, "parking").await.unwrap();
        assert_eq!(reply.text, NO_ANSWER_REPLY);
    }

    #[tokio::test]
    async fn blank_input_is_not_recorded() {
        let backend = backend().await;
        let mut session = ChatSession::new("CustomAi");

        assert!(session.send(&backend, "   ").await.is_err());
        assert_eq!(session.messages().len(), 1);
        assert!(backend.calls().iter().all(|c| *c != "search"));
    }

    #[tokio::test]
    async fn failure_records_error_reply() {
        let backend = backend().await;
        backend.fail_next_network("connection reset");
        let mut session = ChatSession::new("CustomAi");

        let err = session.send(&backend, "hours").await.unwrap_err();
        assert!(err.is_network());
        let last = session.messages().last().unwrap();
        assert_eq!(last.text, ERROR_REPLY);
    }
}
