//! Scroll/Unread Coordinator
//!
//! Tracks whether the viewport sits at the bottom, counts messages that
//! arrive while the user reads history, and decides where the next render
//! should scroll. The engine never scrolls anything itself: it publishes a
//! [`ScrollAnchor`] tagged with the render pass it is meant for, and the
//! render boundary asks [`ScrollCoordinator::is_scroll_anchor`] per row.
//!
//! ```text
//!   at bottom ──scroll up──▶ reading history ──message──▶ unread += 1
//!       ▲                        │                          │
//!       └── clear after delay ◀──┴──── reach bottom ◀───────┘
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::timer::Debounce;
use crate::shared::config::EngineConfig;
use crate::shared::message::MessageId;

/// Viewport geometry reported by the render boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_height: f64, scroll_top: f64, client_height: f64) -> Self {
        Self {
            scroll_height,
            scroll_top,
            client_height,
        }
    }

    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }
}

/// Floating control to show over the message list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Affordance {
    None,
    /// "N unread" banner; activating it jumps to the first unread message
    UnreadBanner { count: usize },
    /// Plain jump-to-latest button
    ScrollToBottom,
}

/// Message the render pass `pass` should scroll into view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollAnchor {
    pub message_id: MessageId,
    pub pass: u64,
}

#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    threshold: f64,
    clear_delay: Duration,
    grace_delay: Duration,
    is_at_bottom: bool,
    /// Peer messages that arrived while away, oldest first
    unread: Vec<MessageId>,
    /// How many of `unread` the pending clear covers
    clear_upto: usize,
    clear_timer: Debounce,
    render_pass: u64,
    anchor: Option<ScrollAnchor>,
}

impl ScrollCoordinator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.bottom_threshold_px,
            clear_delay: config.unread_clear_delay(),
            grace_delay: config.banner_grace_delay(),
            is_at_bottom: true,
            unread: Vec::new(),
            clear_upto: 0,
            clear_timer: Debounce::new(),
            render_pass: 0,
            anchor: None,
        }
    }

    pub fn is_at_bottom(&self) -> bool {
        self.is_at_bottom
    }

    pub fn unread_count(&self) -> usize {
        self.unread.len()
    }

    pub fn first_unread(&self) -> Option<&MessageId> {
        self.unread.first()
    }

    /// Viewport moved.
    ///
    /// Reaching the bottom schedules the unread clear; leaving it again
    /// before the timer fires cancels it.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) {
        let at_bottom = metrics.distance_from_bottom() < self.threshold;
        if at_bottom == self.is_at_bottom {
            return;
        }
        self.is_at_bottom = at_bottom;
        if at_bottom {
            if !self.unread.is_empty() {
                tracing::trace!("[Scroll] Reached bottom, clearing unread in {:?}", self.clear_delay);
                self.clear_upto = self.unread.len();
                self.clear_timer.arm(now, self.clear_delay);
            }
        } else {
            self.clear_timer.cancel();
        }
    }

    /// A new message was appended. Returns true if the view follows it.
    pub fn on_message_arrival(&mut self, message_id: &MessageId, is_own: bool) -> bool {
        if self.is_at_bottom || is_own {
            self.request_scroll(message_id.clone());
            self.clear_unread();
            return true;
        }
        self.unread.push(message_id.clone());
        false
    }

    /// History was replaced wholesale: forget unread state, jump to the end.
    pub fn on_history_replaced(&mut self, last: Option<&MessageId>) {
        self.clear_unread();
        if let Some(last) = last {
            self.request_scroll(last.clone());
        }
    }

    /// "N unread" banner pressed.
    ///
    /// The grace clear only covers the messages counted at activation;
    /// later arrivals stay unread while the view is away from the bottom.
    pub fn activate_banner(&mut self, now: Instant) {
        let Some(first) = self.unread.first().cloned() else {
            return;
        };
        self.request_scroll(first);
        self.clear_upto = self.unread.len();
        self.clear_timer.arm(now, self.grace_delay);
    }

    /// Jump-to-latest pressed.
    pub fn scroll_to_bottom(&mut self, last: Option<&MessageId>) {
        if let Some(last) = last {
            self.request_scroll(last.clone());
        }
    }

    /// Fire the unread clear if due. Returns true if state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.clear_timer.fire_if_due(now) {
            if self.is_at_bottom {
                self.unread.clear();
            } else {
                let upto = self.clear_upto.min(self.unread.len());
                self.unread.drain(..upto);
            }
            tracing::trace!("[Scroll] Unread cleared, {} left", self.unread.len());
            self.clear_upto = 0;
            return true;
        }
        false
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.clear_timer.deadline()
    }

    pub fn affordance(&self) -> Affordance {
        match (self.is_at_bottom, self.unread.len()) {
            (true, _) => Affordance::None,
            (false, 0) => Affordance::ScrollToBottom,
            (false, count) => Affordance::UnreadBanner { count },
        }
    }

    /// Start the next render pass and return its number.
    pub fn begin_render_pass(&mut self) -> u64 {
        self.render_pass += 1;
        self.render_pass
    }

    /// Whether `message_id` is the row render pass `pass` should scroll to.
    pub fn is_scroll_anchor(&self, message_id: &MessageId, pass: u64) -> bool {
        self.anchor
            .as_ref()
            .is_some_and(|a| a.pass == pass && &a.message_id == message_id)
    }

    pub fn anchor(&self) -> Option<&ScrollAnchor> {
        self.anchor.as_ref()
    }

    pub fn reset(&mut self) {
        self.is_at_bottom = true;
        self.clear_unread();
        self.anchor = None;
    }

    fn request_scroll(&mut self, message_id: MessageId) {
        self.anchor = Some(ScrollAnchor {
            message_id,
            pass: self.render_pass + 1,
        });
    }

    fn clear_unread(&mut self) {
        self.unread.clear();
        self.clear_upto = 0;
        self.clear_timer.cancel();
    }
}
