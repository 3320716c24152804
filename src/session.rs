use crate::events::Message;
use crate::prompts::{self, SITE_URL};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    #[error("user message text is empty")]
    EmptyMessage,
}

/// In-memory conversation for one session: the ordered message list plus
/// the flag marking a turn in flight.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    busy: bool,
}

impl Conversation {
    /// A fresh session for the default site.
    pub fn new() -> Self {
        Self::for_site(SITE_URL)
    }

    /// A fresh session, seeded with the greeting naming `site_url`.
    pub fn for_site(site_url: &str) -> Self {
        Self {
            messages: vec![Message::model(prompts::greeting(site_url))],
            busy: false,
        }
    }

    /// Add a message to the end. User messages must have non-blank text.
    pub fn append(&mut self, message: Message) -> Result<(), ConversationError> {
        if message.is_user() && message.text.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
