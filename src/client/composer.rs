//! Composer State Machine
//!
//! Owns the draft text and the input mode. Exactly one mode is active;
//! entering one always leaves the other.
//!
//! ```text
//!          select own message            submit / cancel / delete
//!   Idle ───────────────────────▶ Editing ─────────────────────────▶ Idle
//!    │  ▲                            │ reply affordance
//!    │  └──── submit / cancel ────┐  ▼
//!    └── reply affordance ──────▶ Replying
//! ```

use serde::Serialize;

use super::session::{LocalIdentity, Session};
use crate::shared::error::{Refusal, SharedError};
use crate::shared::event::OutboundEvent;
use crate::shared::message::{ClientId, Message, MessageId};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ComposerMode {
    #[default]
    Idle,
    /// Editing one of our messages; `original_value` is its text when selected
    Editing {
        message_id: MessageId,
        original_value: String,
    },
    /// Next submit replies to `message_id`
    Replying { message_id: MessageId },
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    mode: ComposerMode,
    draft: String,
}

/// A message value must contain at least one non-whitespace character.
pub fn validate_value(value: &str) -> Result<(), SharedError> {
    if value.trim().is_empty() {
        return Err(SharedError::validation("value", "Message must contain text"));
    }
    Ok(())
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &ComposerMode {
        &self.mode
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft. Returns true if the text changed.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.draft {
            return false;
        }
        self.draft = text;
        true
    }

    /// Insert `text` at character offset `cursor` (clamped to the end).
    pub fn insert_at(&mut self, cursor: usize, text: &str) {
        let byte = self
            .draft
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.draft.len());
        self.draft.insert_str(byte, text);
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        validate_value(&self.draft).is_ok()
    }

    /// Select one of our own messages for editing; the draft is preloaded.
    pub fn begin_edit(&mut self, message: &Message, identity: &LocalIdentity) -> Result<(), SharedError> {
        if !identity.is_own(&message.author_name, &message.author_client_id) {
            return Err(SharedError::refused(&message.message_id, Refusal::NotOwn));
        }
        if message.is_deleted {
            return Err(SharedError::refused(&message.message_id, Refusal::Deleted));
        }
        self.draft = message.value.clone();
        self.mode = ComposerMode::Editing {
            message_id: message.message_id.clone(),
            original_value: message.value.clone(),
        };
        Ok(())
    }

    /// Reply to any message; the draft starts empty.
    pub fn begin_reply(&mut self, message_id: MessageId) {
        self.draft.clear();
        self.mode = ComposerMode::Replying { message_id };
    }

    /// Leave editing/replying and drop the draft.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Back to idle after a delete, whatever the mode was.
    pub fn reset(&mut self) {
        self.draft.clear();
        self.mode = ComposerMode::Idle;
    }

    /// Turn the draft into an outbound event.
    ///
    /// An empty or whitespace-only draft is rejected and nothing changes.
    /// So is a new message or reply sent before the server assigned our
    /// client id, since its echo could never be recognised as ours.
    /// Submitting an edit with unchanged text emits nothing but still
    /// returns to `Idle`.
    pub fn submit(&mut self, session: &Session) -> Result<Option<OutboundEvent>, SharedError> {
        validate_value(&self.draft)?;

        let room_id = session.room_id().to_string();
        let value = self.draft.clone();
        let event = match &self.mode {
            ComposerMode::Idle => Some(OutboundEvent::AddMessage {
                room_id,
                name: session.user_name().to_string(),
                client_id: author_id(session)?,
                value,
            }),
            ComposerMode::Editing {
                message_id,
                original_value,
            } => {
                if &value == original_value {
                    tracing::debug!("[Composer] Edit of {} left text unchanged", message_id);
                    None
                } else {
                    Some(OutboundEvent::EditMessage {
                        room_id,
                        message_id: message_id.clone(),
                        value,
                    })
                }
            }
            ComposerMode::Replying { message_id } => Some(OutboundEvent::ReplyToMessage {
                room_id,
                name: session.user_name().to_string(),
                client_id: author_id(session)?,
                value,
                reply_to: message_id.clone(),
            }),
        };
        self.reset();
        Ok(event)
    }
}

fn author_id(session: &Session) -> Result<ClientId, SharedError> {
    session.client_id().cloned().ok_or_else(|| {
        tracing::warn!("[Composer] No client id assigned yet, keeping the draft");
        SharedError::validation("clientId", "not assigned by the server yet")
    })
}
