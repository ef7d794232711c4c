//! Engine errors
//!
//! Nothing here is fatal. A payload that fails to decode is logged and
//! dropped; a rejected command leaves state exactly as it was and the caller
//! decides whether to show anything.
//!
//! ```rust
//! use roomchat::shared::error::{Refusal, SharedError};
//! use roomchat::shared::MessageId;
//!
//! let error = SharedError::refused(&MessageId::from("m1"), Refusal::NotOwn);
//! assert_eq!(error.to_string(), "message m1: belongs to another user");
//! ```
use std::fmt::Display;

use thiserror::Error;

use super::message::MessageId;

/// Why a command on a specific message was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("not in this conversation")]
    Unknown,
    #[error("belongs to another user")]
    NotOwn,
    #[error("already deleted")]
    Deleted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// An inbound payload (or transcript line) did not match its schema
    #[error("cannot decode {context}: {message}")]
    SerializationError { context: String, message: String },

    /// Local input rejected before anything was emitted
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    /// A command named a message it may not act on
    #[error("message {message_id}: {reason}")]
    MessageError {
        message_id: MessageId,
        reason: Refusal,
    },

    /// The event channel would not take an outbound event
    #[error("channel: {message}")]
    ChannelError { message: String },
}

impl SharedError {
    pub fn decode(context: impl Into<String>, err: impl Display) -> Self {
        Self::SerializationError {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn refused(message_id: &MessageId, reason: Refusal) -> Self {
        Self::MessageError {
            message_id: message_id.clone(),
            reason,
        }
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self::ChannelError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode("JSON", err)
    }
}
