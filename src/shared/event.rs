/**
 * Room Event Types
 *
 * This module defines the named events exchanged with the room server over
 * the event channel. Every event on the wire is a `WireEvent`: an event name
 * plus a JSON payload. Inbound wire events are decoded into `InboundEvent`;
 * the engine produces `OutboundEvent`s which encode back into wire events.
 *
 * # Event Names
 *
 * | Direction | Event | Payload |
 * |---|---|---|
 * | out | `joinroom` | `{roomId, userName}` |
 * | in | `clientId` | string |
 * | in | `prefetch` | message list |
 * | in | `reply` | message |
 * | in | `message:edit` | `{messageId, value, editedAt?}` |
 * | in | `message:delete` | `{messageId}` |
 * | out | `message:add` | `{roomId, name, value, clientId}` |
 * | out | `message:edit` | `{roomId, messageId, value}` |
 * | out | `message:delete` | `{roomId, messageId}` |
 * | out | `message:replyToMessage` | `{roomId, name, value, clientId, replyTo}` |
 * | out | `startTyping` / `stopTyping` | `{roomId, userName}` / `{roomId}` |
 * | in | `userTyping` / `userStoppedTyping` | `{userName, clientId}` / `{clientId}` |
 * | in | `users` | roster |
 */
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SharedError;
use super::message::{lenient_timestamp, ClientId, Message, MessageId, RoomUser};

/// Event names used on the wire
pub mod names {
    pub const JOIN_ROOM: &str = "joinroom";
    pub const CLIENT_ID: &str = "clientId";
    pub const PREFETCH: &str = "prefetch";
    pub const REPLY: &str = "reply";
    pub const USERS: &str = "users";
    pub const MESSAGE_ADD: &str = "message:add";
    pub const MESSAGE_EDIT: &str = "message:edit";
    pub const MESSAGE_DELETE: &str = "message:delete";
    pub const MESSAGE_REPLY: &str = "message:replyToMessage";
    pub const START_TYPING: &str = "startTyping";
    pub const STOP_TYPING: &str = "stopTyping";
    pub const USER_TYPING: &str = "userTyping";
    pub const USER_STOPPED_TYPING: &str = "userStoppedTyping";
}

/// A named event with a JSON payload, as carried by the channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireEvent {
    /// Event name (see [`names`])
    pub name: String,
    /// Event payload; `null` for events that carry nothing
    #[serde(default)]
    pub payload: Value,
}

impl WireEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// What the transport reports to the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "event", rename_all = "snake_case")]
pub enum ChannelSignal {
    /// Connection (re)established
    Connected,
    /// Connection lost; the view is stale until the next prefetch
    Disconnected,
    /// A named event arrived
    Event(WireEvent),
}

/// Decoded inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Server-assigned id of the local client
    ClientId(ClientId),
    /// Full room history, in server order
    Prefetch(Vec<Message>),
    /// One new message (plain or reply)
    Reply(Message),
    /// In-place edit of a known message
    Edit {
        message_id: MessageId,
        value: String,
        edited_at: Option<DateTime<Utc>>,
    },
    /// Tombstone a known message
    Delete { message_id: MessageId },
    /// A peer started typing
    UserTyping { user_name: String, client_id: ClientId },
    /// A peer stopped typing
    UserStoppedTyping { client_id: ClientId },
    /// Room roster
    Users(Vec<RoomUser>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditPayload {
    message_id: MessageId,
    value: String,
    #[serde(default, alias = "updatedAt", deserialize_with = "lenient_timestamp")]
    edited_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePayload {
    message_id: MessageId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypingPayload {
    user_name: String,
    client_id: ClientId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoppedTypingPayload {
    client_id: ClientId,
}

fn parse<T: DeserializeOwned>(name: &str, payload: Value) -> Result<T, SharedError> {
    serde_json::from_value(payload).map_err(|e| SharedError::decode(name, e))
}

/// Decode a history list entry by entry; a bad entry is logged and skipped.
fn parse_history(name: &str, payload: Value) -> Result<Vec<Message>, SharedError> {
    let entries: Vec<Value> = parse(name, payload)?;
    let total = entries.len();
    let messages: Vec<Message> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!("[Event] Skipping {} entry {}: {}", name, index, e);
                None
            }
        })
        .collect();
    if messages.len() < total {
        tracing::warn!(
            "[Event] Kept {} of {} {} entries",
            messages.len(),
            total,
            name
        );
    }
    Ok(messages)
}

impl InboundEvent {
    /// Decode a wire event.
    ///
    /// Returns `Ok(None)` for event names this engine does not consume and
    /// `Err(SerializationError)` when a known event carries a bad payload.
    pub fn decode(event: &WireEvent) -> Result<Option<Self>, SharedError> {
        let payload = event.payload.clone();
        let decoded = match event.name.as_str() {
            names::CLIENT_ID => Self::ClientId(parse(&event.name, payload)?),
            names::PREFETCH => Self::Prefetch(parse_history(&event.name, payload)?),
            names::REPLY => Self::Reply(parse(&event.name, payload)?),
            names::MESSAGE_EDIT => {
                let p: EditPayload = parse(&event.name, payload)?;
                Self::Edit {
                    message_id: p.message_id,
                    value: p.value,
                    edited_at: p.edited_at,
                }
            }
            names::MESSAGE_DELETE => {
                let p: DeletePayload = parse(&event.name, payload)?;
                Self::Delete {
                    message_id: p.message_id,
                }
            }
            names::USER_TYPING => {
                let p: TypingPayload = parse(&event.name, payload)?;
                Self::UserTyping {
                    user_name: p.user_name,
                    client_id: p.client_id,
                }
            }
            names::USER_STOPPED_TYPING => {
                let p: StoppedTypingPayload = parse(&event.name, payload)?;
                Self::UserStoppedTyping {
                    client_id: p.client_id,
                }
            }
            names::USERS => Self::Users(parse(&event.name, payload)?),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

/// Event the engine asks the channel to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    JoinRoom {
        room_id: String,
        user_name: String,
    },
    AddMessage {
        room_id: String,
        name: String,
        client_id: ClientId,
        value: String,
    },
    EditMessage {
        room_id: String,
        message_id: MessageId,
        value: String,
    },
    DeleteMessage {
        room_id: String,
        message_id: MessageId,
    },
    ReplyToMessage {
        room_id: String,
        name: String,
        client_id: ClientId,
        value: String,
        reply_to: MessageId,
    },
    StartTyping {
        room_id: String,
        user_name: String,
    },
    StopTyping {
        room_id: String,
    },
}

impl OutboundEvent {
    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => names::JOIN_ROOM,
            Self::AddMessage { .. } => names::MESSAGE_ADD,
            Self::EditMessage { .. } => names::MESSAGE_EDIT,
            Self::DeleteMessage { .. } => names::MESSAGE_DELETE,
            Self::ReplyToMessage { .. } => names::MESSAGE_REPLY,
            Self::StartTyping { .. } => names::START_TYPING,
            Self::StopTyping { .. } => names::STOP_TYPING,
        }
    }

    /// JSON payload of this event
    pub fn payload(&self) -> Value {
        match self {
            Self::JoinRoom { room_id, user_name } => serde_json::json!({
                "roomId": room_id,
                "userName": user_name,
            }),
            Self::AddMessage {
                room_id,
                name,
                client_id,
                value,
            } => serde_json::json!({
                "roomId": room_id,
                "name": name,
                "value": value,
                "clientId": client_id,
            }),
            Self::EditMessage {
                room_id,
                message_id,
                value,
            } => serde_json::json!({
                "roomId": room_id,
                "messageId": message_id,
                "value": value,
            }),
            Self::DeleteMessage { room_id, message_id } => serde_json::json!({
                "roomId": room_id,
                "messageId": message_id,
            }),
            Self::ReplyToMessage {
                room_id,
                name,
                client_id,
                value,
                reply_to,
            } => serde_json::json!({
                "roomId": room_id,
                "name": name,
                "value": value,
                "clientId": client_id,
                "replyTo": reply_to,
            }),
            Self::StartTyping { room_id, user_name } => serde_json::json!({
                "roomId": room_id,
                "userName": user_name,
            }),
            Self::StopTyping { room_id } => serde_json::json!({
                "roomId": room_id,
            }),
        }
    }

    /// Encode as a wire event
    pub fn to_wire(&self) -> WireEvent {
        WireEvent::new(self.name(), self.payload())
    }
}
