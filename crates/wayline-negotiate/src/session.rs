//! Negotiation session state.

use serde::{Deserialize, Serialize};

use crate::protocol::ChatMessage;

/// State of a plan negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationState {
    /// Rounds are still being exchanged with the model.
    Negotiating,
    /// The model submitted a valid plan.
    Finalized,
    /// The round budget ran out.
    Exhausted,
    /// The submitted plan was rejected or the model could not be reached.
    Failed,
}

/// The transcript of one negotiation.
///
/// Each round consumes the previous state and returns a new one, so a round
/// can be driven and inspected on its own. The transcript only grows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    round: u32,
}

impl ConversationState {
    /// Start a conversation with the system instructions and the task.
    pub fn seed(system: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(task)],
            round: 0,
        }
    }

    /// Append one message.
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Append messages in order.
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Count one more completed round.
    pub fn advance(mut self) -> Self {
        self.round += 1;
        self
    }

    /// Rounds completed so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
