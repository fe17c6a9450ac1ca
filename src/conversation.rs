//! The conversation controller: the message history and the one outstanding chat request.
//!
//! Sending is two-phase. `send_message` appends the user's message right away and returns the
//! request to send; `on_reply` appends the assistant's answer (or an apology) when the request
//! completes. Only one request may be outstanding, so replies always arrive in request order.

use crate::error::{log_failure, Error};
use crate::model::{ChatReply, ChatRequest, Message};
use crate::Result;
use tracing::debug;

/// The number of prior messages sent along with each new one.
pub const CONTEXT_WINDOW: usize = 10;

/// The assistant's reply when a request fails. The underlying error is only logged.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// The first message of a conversation started with `with_greeting`.
pub const GREETING: &str = "Hello! I'm your personal finance coach. I can help you with \
    budgeting, investment advice, and financial planning. What would you like to discuss?";

#[derive(Debug, Default)]
pub struct ConversationController {
    history: Vec<Message>,
    pending: bool,
}

impl ConversationController {
    /// An empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation that opens with the coach's greeting.
    pub fn with_greeting() -> Self {
        Self {
            history: vec![Message::assistant(GREETING)],
            pending: false,
        }
    }

    /// Every message so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Appends `text` as a user message and returns the request to send: the message plus the
    /// last `CONTEXT_WINDOW` messages that came before it.
    ///
    /// # Errors
    /// A `Validation` error, with nothing changed, if `text` is blank or a request is already
    /// outstanding.
    pub fn send_message(&mut self, text: &str) -> Result<ChatRequest> {
        if text.trim().is_empty() {
            return Err(Error::validation("Message is empty"));
        }
        if self.pending {
            return Err(Error::validation("Still waiting for the previous answer"));
        }

        let start = self.history.len().saturating_sub(CONTEXT_WINDOW);
        let conversation_history = self.history[start..].to_vec();

        self.history.push(Message::user(text));
        self.pending = true;
        debug!(
            "Sending chat message with {} messages of context",
            conversation_history.len()
        );
        Ok(ChatRequest {
            message: text.to_string(),
            conversation_history,
        })
    }

    /// Completes the outstanding request, appending the assistant's reply, or the apology if the
    /// request failed. The user's message stays in the history either way. Returns the appended
    /// message, or `None` if no request was outstanding.
    pub fn on_reply(&mut self, result: Result<ChatReply>) -> Option<&Message> {
        if !self.pending {
            debug!("Ignoring a chat reply with no request outstanding");
            return None;
        }
        let message = match result {
            Ok(reply) => Message::from_reply(reply),
            Err(e) => {
                log_failure("Chat", &e);
                Message::assistant(APOLOGY)
            }
        };
        self.pending = false;
        self.history.push(message);
        self.history.last()
    }
}
