//! Chat engine
//!
//! Owns every piece of room state and reacts to two inputs: signals from the
//! event channel and [`Command`]s from the render boundary. Each reaction runs
//! to completion before the next one starts. Timers are polled explicitly
//! through [`ChatEngine::poll_timers`]; [`ChatEngine::next_deadline`] tells the
//! driver when to do so.

use chrono::{Local, NaiveDate, TimeZone};
use serde::Deserialize;
use tokio::time::Instant;

use super::channel::EventChannel;
use super::composer::{Composer, ComposerMode};
use super::conversation::{Applied, ConversationStore};
use super::format::emoji_from_unified;
use super::presence::{Roster, TypingEmitter, TypingSet, TypingSignal};
use super::scroll::{ScrollCoordinator, ScrollMetrics};
use super::session::Session;
use super::timer::earliest;
use super::view::{ComposerView, RowContext, ViewSnapshot};
use crate::shared::config::EngineConfig;
use crate::shared::error::{Refusal, SharedError};
use crate::shared::event::{ChannelSignal, InboundEvent, OutboundEvent};
use crate::shared::message::MessageId;

/// Everything the render boundary can ask of the engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Command {
    /// Draft text replaced by the input widget
    SetDraft(String),
    /// Emoji picked; `cursor` is a character offset into the draft
    InsertEmoji { cursor: usize, unified: String },
    /// Own message clicked: load it for editing
    SelectMessage(MessageId),
    /// Reply affordance on any message
    Reply(MessageId),
    /// Escape: leave editing/replying
    Cancel,
    Submit,
    /// Delete one of our own messages
    Delete(MessageId),
    Scroll(ScrollMetrics),
    ActivateUnreadBanner,
    ScrollToBottom,
    /// Leave the room
    Teardown,
}

pub struct ChatEngine<C: EventChannel> {
    config: EngineConfig,
    session: Session,
    channel: C,
    store: ConversationStore,
    typing: TypingSet,
    roster: Roster,
    emitter: TypingEmitter,
    composer: Composer,
    scroll: ScrollCoordinator,
    closed: bool,
}

impl<C: EventChannel> ChatEngine<C> {
    pub fn new(config: EngineConfig, session: Session, channel: C) -> Self {
        let emitter = TypingEmitter::new(config.typing_quiet_period());
        let scroll = ScrollCoordinator::new(&config);
        Self {
            config,
            session,
            channel,
            store: ConversationStore::new(),
            typing: TypingSet::new(),
            roster: Roster::new(),
            emitter,
            composer: Composer::new(),
            scroll,
            closed: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn typing(&self) -> &TypingSet {
        &self.typing
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn scroll(&self) -> &ScrollCoordinator {
        &self.scroll
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Whether [`ChatEngine::teardown`] has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ========== Channel side ==========

    pub fn handle_signal(&mut self, signal: ChannelSignal, now: Instant) {
        if self.closed {
            tracing::trace!("[Engine] Ignoring signal after teardown");
            return;
        }
        match signal {
            ChannelSignal::Connected => {
                tracing::info!("[Engine] Connected, joining {}", self.session.room_id());
                self.session.set_connected(true);
                self.emitter.reset();
                let join = self.session.join_event();
                self.send(join);
            }
            ChannelSignal::Disconnected => {
                tracing::warn!("[Engine] Disconnected, view is stale until the next prefetch");
                self.session.set_connected(false);
                self.typing.clear();
                self.emitter.reset();
            }
            ChannelSignal::Event(wire) => match InboundEvent::decode(&wire) {
                Ok(Some(event)) => self.handle_inbound(event, now),
                Ok(None) => tracing::trace!("[Engine] Ignoring unknown event {}", wire.name),
                Err(e) => tracing::warn!("[Engine] Dropping malformed {} event: {}", wire.name, e),
            },
        }
    }

    pub fn handle_inbound(&mut self, event: InboundEvent, now: Instant) {
        match event {
            InboundEvent::ClientId(client_id) => self.session.assign_client_id(client_id),
            InboundEvent::Prefetch(history) => {
                self.store.replace(history);
                let last = self.store.last().map(|m| m.message_id.clone());
                self.scroll.on_history_replaced(last.as_ref());
            }
            InboundEvent::Reply(message) => {
                let is_own = self
                    .session
                    .identity()
                    .is_own(&message.author_name, &message.author_client_id);
                let message_id = message.message_id.clone();
                if self.store.apply_add(message) == Applied::Changed {
                    self.scroll.on_message_arrival(&message_id, is_own);
                }
            }
            InboundEvent::Edit {
                message_id,
                value,
                edited_at,
            } => {
                self.store.apply_edit(&message_id, value, edited_at);
            }
            InboundEvent::Delete { message_id } => {
                if self.store.apply_delete(&message_id) == Applied::Changed
                    && matches!(self.composer.mode(), ComposerMode::Editing { message_id: target, .. } if target == &message_id)
                {
                    tracing::debug!("[Engine] Message {} being edited was deleted", message_id);
                    self.composer.reset();
                }
            }
            InboundEvent::UserTyping { user_name, client_id } => {
                self.typing
                    .on_user_typing(user_name, client_id, self.session.identity(), now);
            }
            InboundEvent::UserStoppedTyping { client_id } => {
                self.typing.on_user_stopped(&client_id);
            }
            InboundEvent::Users(users) => self.roster.set(users),
        }
    }

    // ========== User side ==========

    /// Apply a user command.
    ///
    /// Rejected commands (invalid draft, unknown or foreign message) return
    /// an error and leave state untouched.
    pub fn dispatch(&mut self, command: Command, now: Instant) -> Result<(), SharedError> {
        if self.closed {
            return Err(SharedError::channel("session closed"));
        }
        match command {
            Command::SetDraft(text) => {
                if self.composer.set_draft(text) {
                    self.on_draft_changed(now);
                }
            }
            Command::InsertEmoji { cursor, unified } => {
                let emoji = emoji_from_unified(&unified)
                    .ok_or_else(|| SharedError::validation("unified", format!("not an emoji code: {}", unified)))?;
                self.composer.insert_at(cursor, &emoji);
                self.on_draft_changed(now);
            }
            Command::SelectMessage(message_id) => {
                let message = self
                    .store
                    .resolve(&message_id)
                    .ok_or_else(|| SharedError::refused(&message_id, Refusal::Unknown))?;
                self.composer.begin_edit(message, self.session.identity())?;
            }
            Command::Reply(message_id) => {
                if self.store.resolve(&message_id).is_none() {
                    return Err(SharedError::refused(&message_id, Refusal::Unknown));
                }
                self.composer.begin_reply(message_id);
            }
            Command::Cancel => self.composer.cancel(),
            Command::Submit => {
                if let Some(event) = self.composer.submit(&self.session)? {
                    self.send(event);
                }
            }
            Command::Delete(message_id) => self.delete(message_id)?,
            Command::Scroll(metrics) => self.scroll.on_scroll(metrics, now),
            Command::ActivateUnreadBanner => self.scroll.activate_banner(now),
            Command::ScrollToBottom => {
                let last = self.store.last().map(|m| m.message_id.clone());
                self.scroll.scroll_to_bottom(last.as_ref());
            }
            Command::Teardown => self.teardown(),
        }
        Ok(())
    }

    fn delete(&mut self, message_id: MessageId) -> Result<(), SharedError> {
        let message = self
            .store
            .resolve(&message_id)
            .ok_or_else(|| SharedError::refused(&message_id, Refusal::Unknown))?;
        if !self
            .session
            .identity()
            .is_own(&message.author_name, &message.author_client_id)
        {
            return Err(SharedError::refused(&message_id, Refusal::NotOwn));
        }
        if message.is_deleted {
            return Err(SharedError::refused(&message_id, Refusal::Deleted));
        }
        self.send(OutboundEvent::DeleteMessage {
            room_id: self.session.room_id().to_string(),
            message_id,
        });
        self.composer.reset();
        Ok(())
    }

    /// Offline keystrokes never arm the emitter, so every `stopTyping`
    /// follows a `startTyping` that actually went out.
    fn on_draft_changed(&mut self, now: Instant) {
        if !self.session.is_connected() {
            return;
        }
        if self.emitter.on_draft_change(now) == Some(TypingSignal::Start) {
            self.send(OutboundEvent::StartTyping {
                room_id: self.session.room_id().to_string(),
                user_name: self.session.user_name().to_string(),
            });
        }
    }

    // ========== Timers ==========

    /// Fire every timer due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.emitter.poll(now) == Some(TypingSignal::Stop) && self.session.is_connected() {
            self.send(OutboundEvent::StopTyping {
                room_id: self.session.room_id().to_string(),
            });
        }
        self.scroll.poll(now);
        self.typing.expire(now, self.config.typing_expiry());
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([
            self.emitter.deadline(),
            self.scroll.deadline(),
            self.typing.next_expiry(self.config.typing_expiry()),
        ])
    }

    // ========== View ==========

    /// Start a render pass and build its snapshot in the local timezone.
    pub fn snapshot(&mut self) -> ViewSnapshot {
        let today = Local::now().date_naive();
        self.snapshot_in(&Local, today)
    }

    pub fn snapshot_in<Tz: TimeZone>(&mut self, tz: &Tz, today: NaiveDate) -> ViewSnapshot
    where
        Tz::Offset: std::fmt::Display,
    {
        let render_pass = self.scroll.begin_render_pass();
        let ctx = RowContext {
            store: &self.store,
            identity: self.session.identity(),
            scroll: &self.scroll,
            composer_mode: self.composer.mode(),
            render_pass,
            reply_preview_len: self.config.reply_preview_len,
        };
        let rows = ctx.build_rows(tz, today);
        let reply_preview = match self.composer.mode() {
            ComposerMode::Replying { message_id } => Some(ctx.snippet(message_id)),
            _ => None,
        };

        ViewSnapshot {
            render_pass,
            connected: self.session.is_connected(),
            rows,
            typing_text: self.typing.indicator_text(self.config.max_visible_typing),
            affordance: self.scroll.affordance(),
            unread_count: self.scroll.unread_count(),
            composer: ComposerView {
                mode: self.composer.mode().clone(),
                draft: self.composer.draft().to_string(),
                can_submit: self.composer.can_submit(),
                reply_preview,
            },
            roster: self
                .roster
                .header(self.session.identity(), self.config.max_visible_avatars),
        }
    }

    // ========== Lifecycle ==========

    /// Disconnect and forget all room state.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.channel.disconnect();
        self.session.teardown();
        self.store.clear();
        self.typing.clear();
        self.roster.clear();
        self.emitter.reset();
        self.composer.reset();
        self.scroll.reset();
        self.closed = true;
    }

    /// Fire-and-forget send; failures are logged and dropped.
    fn send(&mut self, event: OutboundEvent) {
        tracing::debug!("[Engine] Emitting {}", event.name());
        if let Err(e) = self.channel.emit(event.to_wire()) {
            tracing::warn!("[Engine] Failed to emit {}: {}", event.name(), e);
        }
    }
}
