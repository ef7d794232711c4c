//! Render snapshot
//!
//! Everything the render boundary needs for one pass, fully owned so it can
//! cross a `watch` channel. Rows carry display-ready text; the render side
//! does no lookups of its own.

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use super::composer::ComposerMode;
use super::conversation::ConversationStore;
use super::format::{edited_at_label_in, reply_snippet, DELETED_PLACEHOLDER};
use super::grouping::{project_in, ViewGroup};
use super::presence::RosterHeader;
use super::scroll::{Affordance, ScrollCoordinator};
use super::session::LocalIdentity;
use crate::shared::message::{ClientId, Message, MessageId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewRow {
    DateSeparator { day: NaiveDate, label: String },
    Message(MessageRow),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub message_id: MessageId,
    pub author_name: String,
    pub author_client_id: ClientId,
    /// Value, or the deleted placeholder for tombstones
    pub text: String,
    pub is_own: bool,
    pub is_deleted: bool,
    /// `dd/mm/yy, HH:MM` when the message was edited
    pub edited_label: Option<String>,
    /// Quoted target snippet; empty when the target is gone
    pub reply_snippet: Option<String>,
    /// Edit and delete affordances are offered
    pub can_modify: bool,
    /// The render pass should scroll this row into view
    pub is_scroll_anchor: bool,
    /// Currently loaded in the composer
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerView {
    #[serde(flatten)]
    pub mode: ComposerMode,
    pub draft: String,
    pub can_submit: bool,
    /// Snippet of the message being replied to
    pub reply_preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub render_pass: u64,
    pub connected: bool,
    pub rows: Vec<ViewRow>,
    pub typing_text: String,
    pub affordance: Affordance,
    pub unread_count: usize,
    pub composer: ComposerView,
    pub roster: RosterHeader,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            render_pass: 0,
            connected: false,
            rows: Vec::new(),
            typing_text: String::new(),
            affordance: Affordance::None,
            unread_count: 0,
            composer: ComposerView {
                mode: ComposerMode::Idle,
                draft: String::new(),
                can_submit: false,
                reply_preview: None,
            },
            roster: RosterHeader::default(),
        }
    }
}

impl ViewSnapshot {
    /// Message rows only, in display order
    pub fn messages(&self) -> impl Iterator<Item = &MessageRow> {
        self.rows.iter().filter_map(|row| match row {
            ViewRow::Message(m) => Some(m),
            ViewRow::DateSeparator { .. } => None,
        })
    }

    /// Labels of the date separators, in display order
    pub fn separators(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                ViewRow::DateSeparator { label, .. } => Some(label.as_str()),
                ViewRow::Message(_) => None,
            })
            .collect()
    }

    pub fn anchor(&self) -> Option<&MessageId> {
        self.messages().find(|m| m.is_scroll_anchor).map(|m| &m.message_id)
    }
}

/// Borrowed engine state needed to build the rows of one pass
pub(crate) struct RowContext<'a> {
    pub store: &'a ConversationStore,
    pub identity: &'a LocalIdentity,
    pub scroll: &'a ScrollCoordinator,
    pub composer_mode: &'a ComposerMode,
    pub render_pass: u64,
    pub reply_preview_len: usize,
}

impl RowContext<'_> {
    pub fn build_rows<Tz: TimeZone>(&self, tz: &Tz, today: NaiveDate) -> Vec<ViewRow>
    where
        Tz::Offset: std::fmt::Display,
    {
        project_in(self.store.messages(), tz, today)
            .into_iter()
            .map(|group| match group {
                ViewGroup::DateSeparator { day, label } => ViewRow::DateSeparator { day, label },
                ViewGroup::Message(message) => ViewRow::Message(self.message_row(message, tz)),
            })
            .collect()
    }

    /// Snippet of `target` for a reply quote; empty if missing or deleted
    pub fn snippet(&self, target: &MessageId) -> String {
        reply_snippet(self.store.resolve_text(target), self.reply_preview_len)
    }

    fn message_row<Tz: TimeZone>(&self, message: &Message, tz: &Tz) -> MessageRow
    where
        Tz::Offset: std::fmt::Display,
    {
        let is_own = self
            .identity
            .is_own(&message.author_name, &message.author_client_id);
        let text = if message.is_deleted {
            DELETED_PLACEHOLDER.to_string()
        } else {
            message.value.clone()
        };
        let edited_label = match (message.is_edited && !message.is_deleted, message.edited_at) {
            (true, Some(at)) => Some(edited_at_label_in(at, tz)),
            _ => None,
        };
        let is_selected = match self.composer_mode {
            ComposerMode::Editing { message_id, .. } | ComposerMode::Replying { message_id } => {
                message_id == &message.message_id
            }
            ComposerMode::Idle => false,
        };

        MessageRow {
            message_id: message.message_id.clone(),
            author_name: message.author_name.clone(),
            author_client_id: message.author_client_id.clone(),
            text,
            is_own,
            is_deleted: message.is_deleted,
            edited_label,
            reply_snippet: message.reply_to.as_ref().map(|target| self.snippet(target)),
            can_modify: is_own && !message.is_deleted,
            is_scroll_anchor: self.scroll.is_scroll_anchor(&message.message_id, self.render_pass),
            is_selected,
        }
    }
}
