//! Conversation Store
//!
//! Canonical ordered message sequence for the active room. Order is server
//! arrival order; nothing here compares timestamps. A side index maps
//! `MessageId` to position so edit, delete and reply-target lookups stay O(1).
//!
//! Mutations for unknown ids and duplicate adds are silent no-ops: the
//! channel may redeliver, and a full resync via [`ConversationStore::replace`]
//! repairs anything missed while disconnected.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::shared::message::{Message, MessageId};

/// Result of applying a mutation, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// State changed
    Changed,
    /// Duplicate or stale event, nothing changed
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message delivered by `reply`. Duplicate ids are ignored.
    pub fn apply_add(&mut self, message: Message) -> Applied {
        if self.index.contains_key(&message.message_id) {
            tracing::debug!("[Conversation] Duplicate add ignored: {}", message.message_id);
            return Applied::Ignored;
        }
        self.index.insert(message.message_id.clone(), self.messages.len());
        self.messages.push(message);
        Applied::Changed
    }

    /// Edit a message in place. Position, identity and `createdAt` never change.
    pub fn apply_edit(
        &mut self,
        message_id: &MessageId,
        value: String,
        edited_at: Option<DateTime<Utc>>,
    ) -> Applied {
        let Some(message) = self.get_mut(message_id) else {
            tracing::debug!("[Conversation] Edit for unknown message ignored: {}", message_id);
            return Applied::Ignored;
        };
        if message.is_deleted {
            tracing::debug!("[Conversation] Edit for deleted message ignored: {}", message_id);
            return Applied::Ignored;
        }
        message.value = value;
        message.is_edited = true;
        message.edited_at = edited_at;
        Applied::Changed
    }

    /// Tombstone a message. It keeps its slot so replies still resolve.
    pub fn apply_delete(&mut self, message_id: &MessageId) -> Applied {
        let Some(message) = self.get_mut(message_id) else {
            tracing::debug!("[Conversation] Delete for unknown message ignored: {}", message_id);
            return Applied::Ignored;
        };
        if message.is_deleted {
            return Applied::Ignored;
        }
        message.is_deleted = true;
        // no edit can follow a delete, so the text is not kept
        message.value.clear();
        Applied::Changed
    }

    /// Install a prefetched history, replacing everything.
    ///
    /// The new sequence and index are built before the swap. If the server
    /// repeats an id the first occurrence wins.
    pub fn replace(&mut self, history: Vec<Message>) {
        let mut messages = Vec::with_capacity(history.len());
        let mut index = HashMap::with_capacity(history.len());
        for message in history {
            if index.contains_key(&message.message_id) {
                tracing::warn!("[Conversation] Prefetch repeats id {}, keeping first", message.message_id);
                continue;
            }
            index.insert(message.message_id.clone(), messages.len());
            messages.push(message);
        }
        tracing::info!("[Conversation] Installed history: {} messages", messages.len());
        self.messages = messages;
        self.index = index;
    }

    /// Look up a message by id.
    pub fn resolve(&self, message_id: &MessageId) -> Option<&Message> {
        self.index.get(message_id).map(|&i| &self.messages[i])
    }

    /// Displayable text of a message, empty when missing or deleted.
    pub fn resolve_text(&self, message_id: &MessageId) -> &str {
        self.resolve(message_id).map(Message::display_value).unwrap_or("")
    }

    fn get_mut(&mut self, message_id: &MessageId) -> Option<&mut Message> {
        let i = *self.index.get(message_id)?;
        self.messages.get_mut(i)
    }

    pub fn position(&self, message_id: &MessageId) -> Option<usize> {
        self.index.get(message_id).copied()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
    }
}
