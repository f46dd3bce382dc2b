//! The append/replace-only conversation log.
//!
//! A log lives only as long as the process; it is never persisted.

use talktastic_core::{Button, Message, MessageType};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Remove the entry with `id`, wherever it sits.
    pub fn remove(&mut self, id: Uuid) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Drop the entry with `id` and append `message` at the tail.
    pub fn replace(&mut self, id: Uuid, message: Message) -> bool {
        let removed = self.remove(id).is_some();
        self.messages.push(message);
        removed
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Most recent buttons message, if any.
    #[must_use]
    pub fn latest_buttons(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageType::Buttons && !m.button_choices().is_empty())
    }

    /// Button `index` of message `id`.
    #[must_use]
    pub fn button(&self, id: Uuid, index: usize) -> Option<&Button> {
        self.get(id)?.button_choices().get(index)
    }
}
