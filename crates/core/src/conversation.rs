//! Conversation-related types.

use std::fmt::{self, Display};

use wyn_agent_model::{ModelMessage, ModelRequest};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The human on the console.
    User,
    /// The remote agent.
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation. Messages are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    #[inline]
    pub(crate) fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    #[inline]
    pub(crate) fn assistant(content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Returns who wrote this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    fn to_model_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.content.clone()),
            Role::Assistant => ModelMessage::Assistant(self.content.clone()),
        }
    }
}

/// Represents a conversation: the ordered, append-only history of one
/// session.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    items: Vec<Message>,
}

impl Conversation {
    /// Returns the messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.items
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: Message) {
        self.items.push(msg);
    }

    /// Removes the last message if it was written by the user.
    #[inline]
    pub(crate) fn discard_pending_input(&mut self) {
        if self.items.last().map(Message::role) == Some(Role::User) {
            self.items.pop();
        }
    }

    /// Builds a request carrying the entire history.
    pub(crate) fn to_model_request(&self) -> ModelRequest {
        ModelRequest {
            messages: self.items.iter().map(Message::to_model_message).collect(),
        }
    }
}
