/**
 * Message Data Structure
 *
 * This module defines the Message struct pushed by the room server and
 * the identifier newtypes that reference it. Messages arrive as camelCase
 * JSON over the event channel (`prefetch`, `reply`) and are only ever
 * created from those inbound events.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-assigned message identifier.
///
/// Stable across edits and deletes; replies reference it through `replyTo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of one connected client (one browser tab / socket).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single chat message as held by the conversation store.
///
/// # Fields
/// * `message_id` - Server-assigned identity, never changes
/// * `author_name` / `author_client_id` - Who sent it
/// * `value` - Message text (empty once deleted)
/// * `created_at` - Server timestamp, set once; used for date grouping only
/// * `is_edited` / `edited_at` - Edit marker
/// * `is_deleted` - Tombstone flag
/// * `reply_to` - Message this one replies to, immutable once set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: MessageId,
    #[serde(rename = "name")]
    pub author_name: String,
    #[serde(rename = "clientId")]
    pub author_client_id: ClientId,
    #[serde(default)]
    pub value: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(
        default,
        alias = "updatedAt",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub reply_to: Option<MessageId>,
}

impl Message {
    /// Create a plain message with the given identity and text.
    pub fn new(
        message_id: impl Into<String>,
        author_name: impl Into<String>,
        author_client_id: impl Into<String>,
        value: impl Into<String>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            message_id: MessageId::new(message_id),
            author_name: author_name.into(),
            author_client_id: ClientId::new(author_client_id),
            value: value.into(),
            created_at,
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            reply_to: None,
        }
    }

    /// Mark this message as a reply to `target`.
    pub fn replying_to(mut self, target: impl Into<String>) -> Self {
        self.reply_to = Some(MessageId::new(target));
        self
    }

    /// Text to show for this message; tombstones display nothing.
    pub fn display_value(&self) -> &str {
        if self.is_deleted {
            ""
        } else {
            &self.value
        }
    }
}

/// Member of the room roster pushed with the `users` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomUser {
    pub name: String,
    pub client_id: ClientId,
}

impl RoomUser {
    pub fn new(name: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client_id: ClientId::new(client_id),
        }
    }

    /// First two characters of the name, as shown in the avatar bubble.
    pub fn initials(&self) -> String {
        self.name.chars().take(2).collect()
    }
}

/// The server sends `replyTo: ""` for plain messages.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<MessageId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(MessageId))
}

/// Timestamps are RFC 3339, but edit times also show up as display text
/// (`""`, `09/03/25, 23:05`). Anything unparseable reads as absent.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(Raw::Other(_)) | None => None,
    })
}
