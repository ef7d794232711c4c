//! Session context
//!
//! Room id and local display name are explicit state owned by the engine,
//! created by [`Session::join`] and cleared by [`Session::teardown`]. The
//! server assigns the local client id after connecting (`clientId` event).

use crate::shared::error::SharedError;
use crate::shared::event::OutboundEvent;
use crate::shared::message::ClientId;

/// Display name used when the user did not pick one
pub const GUEST_NAME: &str = "guest";

/// Who "we" are in the room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub name: String,
    pub client_id: Option<ClientId>,
}

impl LocalIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client_id: None,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.name == GUEST_NAME
    }

    /// Whether a message or roster entry belongs to the local user.
    ///
    /// Named users own everything posted under their name, from any tab.
    /// Guests share one name, so for them the client id must match too.
    pub fn is_own(&self, name: &str, client_id: &ClientId) -> bool {
        if name != self.name {
            return false;
        }
        !self.is_guest() || self.client_id.as_ref() == Some(client_id)
    }

    /// Whether `client_id` is this very connection.
    pub fn is_this_client(&self, client_id: &ClientId) -> bool {
        self.client_id.as_ref() == Some(client_id)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    room_id: String,
    identity: LocalIdentity,
    connected: bool,
}

impl Session {
    /// Validate the room id and user name and open a session.
    ///
    /// An empty user name joins as `guest`.
    pub fn join(room_id: impl Into<String>, user_name: impl Into<String>) -> Result<Self, SharedError> {
        let room_id = room_id.into();
        let mut user_name = user_name.into();
        validate_room_id(&room_id)?;
        if user_name.trim().is_empty() {
            user_name = GUEST_NAME.to_string();
        } else {
            validate_user_name(&user_name)?;
        }
        tracing::info!("[Session] Joining room {} as {}", room_id, user_name);
        Ok(Self {
            room_id,
            identity: LocalIdentity::new(user_name),
            connected: false,
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn user_name(&self) -> &str {
        &self.identity.name
    }

    pub fn client_id(&self) -> Option<&ClientId> {
        self.identity.client_id.as_ref()
    }

    /// Record the server-assigned id for this connection.
    pub fn assign_client_id(&mut self, client_id: ClientId) {
        if let Some(previous) = &self.identity.client_id {
            if previous != &client_id {
                tracing::info!("[Session] Client id changed {} -> {}", previous, client_id);
            }
        }
        self.identity.client_id = Some(client_id);
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// `joinroom` announcement for the current room
    pub fn join_event(&self) -> OutboundEvent {
        OutboundEvent::JoinRoom {
            room_id: self.room_id.clone(),
            user_name: self.identity.name.clone(),
        }
    }

    /// Forget connection-scoped state
    pub fn teardown(&mut self) {
        tracing::info!("[Session] Leaving room {}", self.room_id);
        self.connected = false;
        self.identity.client_id = None;
    }
}

/// Letters, digits and hyphen, non-empty
pub fn validate_room_id(room_id: &str) -> Result<(), SharedError> {
    if room_id.is_empty() || !room_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(SharedError::validation(
            "roomId",
            "Room ID can contain only letters, digits and hyphen",
        ));
    }
    Ok(())
}

/// 3 to 20 letters, digits or underscores
pub fn validate_user_name(name: &str) -> Result<(), SharedError> {
    let len = name.chars().count();
    if !(3..=20).contains(&len) || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SharedError::validation(
            "userName",
            "Username can contain only letters, digits and underscore",
        ));
    }
    Ok(())
}
