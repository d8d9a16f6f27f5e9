use super::message::Message;

/// An ordered sequence of role-tagged messages, built up fluently and handed
/// to a provider as request input.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(content)],
        }
    }

    /// Start a conversation with a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
        }
    }

    /// Append a system message.
    pub fn with_system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Append a user message.
    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Append an assistant message.
    pub fn with_assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Append a completed response as an assistant turn, so the conversation
    /// can be sent back for a follow-up.
    pub fn with_reply(self, response: &crate::response::CompleteResponse) -> Self {
        self.with_assistant(response.content())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl From<&str> for Conversation {
    fn from(s: &str) -> Self {
        Conversation::user(s)
    }
}

impl From<String> for Conversation {
    fn from(s: String) -> Self {
        Conversation::user(s)
    }
}

impl From<Message> for Conversation {
    fn from(message: Message) -> Self {
        Conversation {
            messages: vec![message],
        }
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Conversation { messages }
    }
}
