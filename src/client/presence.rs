//! Presence Tracker
//!
//! Three pieces of ephemeral peer state:
//!
//! - [`TypingSet`]: peers currently typing, keyed by client id
//! - [`TypingEmitter`]: the local `startTyping`/`stopTyping` debounce
//! - [`Roster`]: room members for the header avatars
//!
//! The protocol has no typing heartbeat, so a peer that disconnects without
//! `userStoppedTyping` would linger forever. Entries therefore expire locally
//! once they go unrefreshed for the configured window.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use super::session::LocalIdentity;
use super::timer::Debounce;
use crate::shared::message::{ClientId, RoomUser};

/// A peer currently typing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingParticipant {
    pub name: String,
    pub client_id: ClientId,
    last_seen: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct TypingSet {
    entries: Vec<TypingParticipant>,
}

impl TypingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle `userTyping`. Returns true if the set changed.
    ///
    /// Events about the local client are dropped, and so is everything
    /// until the server has told us which client id is ours.
    pub fn on_user_typing(
        &mut self,
        name: String,
        client_id: ClientId,
        identity: &LocalIdentity,
        now: Instant,
    ) -> bool {
        if identity.client_id.is_none() || identity.is_this_client(&client_id) {
            tracing::trace!("[Presence] Ignoring typing event for {}", client_id);
            return false;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.client_id == client_id) {
            entry.last_seen = now;
            return false;
        }
        tracing::debug!("[Presence] {} started typing", name);
        self.entries.push(TypingParticipant {
            name,
            client_id,
            last_seen: now,
        });
        true
    }

    /// Handle `userStoppedTyping`. Returns true if the set changed.
    pub fn on_user_stopped(&mut self, client_id: &ClientId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.client_id != client_id);
        before != self.entries.len()
    }

    /// Drop entries not refreshed within `expiry`. Returns how many were dropped.
    pub fn expire(&mut self, now: Instant, expiry: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| now.saturating_duration_since(e.last_seen) < expiry);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!("[Presence] Expired {} stale typing entries", dropped);
        }
        dropped
    }

    /// When the oldest entry will expire
    pub fn next_expiry(&self, expiry: Duration) -> Option<Instant> {
        self.entries.iter().map(|e| e.last_seen + expiry).min()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn participants(&self) -> &[TypingParticipant] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// "alice is typing...", "alice, bob are typing...",
    /// "alice, bob and 2 others are typing..."
    pub fn indicator_text(&self, max_visible: usize) -> String {
        let names: Vec<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
        typing_indicator_text(&names, max_visible)
    }
}

/// Format the typing indicator for `names` (empty string when nobody types).
pub fn typing_indicator_text(names: &[&str], max_visible: usize) -> String {
    if names.is_empty() {
        return String::new();
    }
    let visible = &names[..names.len().min(max_visible.max(1))];
    let others = names.len() - visible.len();
    let shown = visible.join(", ");

    if others > 0 {
        let plural = if others > 1 { "s" } else { "" };
        format!("{} and {} other{} are typing...", shown, others, plural)
    } else {
        let verb = if names.len() == 1 { "is" } else { "are" };
        format!("{} {} typing...", shown, verb)
    }
}

/// What the emitter wants sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Start,
    Stop,
}

/// Local typing announcements.
///
/// The first keystroke of a burst yields `Start`; every keystroke re-arms a
/// single stop timer, so a burst ends with exactly one `Stop`.
#[derive(Debug, Clone)]
pub struct TypingEmitter {
    quiet_period: Duration,
    stop_timer: Debounce,
}

impl TypingEmitter {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            stop_timer: Debounce::new(),
        }
    }

    /// Register a draft change.
    pub fn on_draft_change(&mut self, now: Instant) -> Option<TypingSignal> {
        let starting = !self.stop_timer.is_armed();
        self.stop_timer.arm(now, self.quiet_period);
        starting.then_some(TypingSignal::Start)
    }

    /// Fire the stop timer if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<TypingSignal> {
        self.stop_timer.fire_if_due(now).then_some(TypingSignal::Stop)
    }

    pub fn is_typing(&self) -> bool {
        self.stop_timer.is_armed()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.stop_timer.deadline()
    }

    /// Abandon the burst without a `Stop` (channel gone).
    pub fn reset(&mut self) {
        self.stop_timer.cancel();
    }
}

/// Header summary: a few avatars plus an overflow bubble
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RosterHeader {
    pub visible: Vec<RoomUser>,
    pub overflow: Vec<RoomUser>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    users: Vec<RoomUser>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, users: Vec<RoomUser>) {
        tracing::debug!("[Presence] Roster updated: {} users", users.len());
        self.users = users;
    }

    pub fn users(&self) -> &[RoomUser] {
        &self.users
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// Everyone except the local user.
    ///
    /// Roster entries are matched by name; only when we are `guest` do other
    /// guests (different client ids) stay listed.
    pub fn others<'a>(&'a self, identity: &'a LocalIdentity) -> impl Iterator<Item = &'a RoomUser> + 'a {
        self.users.iter().filter(move |user| {
            user.name != identity.name || (identity.is_guest() && !identity.is_this_client(&user.client_id))
        })
    }

    /// Split the others into `max_visible - 1` avatars and the overflow list.
    pub fn header(&self, identity: &LocalIdentity, max_visible: usize) -> RosterHeader {
        let others: Vec<RoomUser> = self.others(identity).cloned().collect();
        let split = max_visible.saturating_sub(1).min(others.len());
        let mut visible = others;
        let overflow = visible.split_off(split);
        RosterHeader { visible, overflow }
    }
}
