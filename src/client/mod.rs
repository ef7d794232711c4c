//! Client Module
//!
//! The conversation sync and view-state engine for one chat room.
//!
//! # Architecture
//!
//! ```text
//! client/
//! ├── session.rs      - Room id, local identity, teardown
//! ├── channel.rs      - EventChannel trait and tokio mpsc adapter
//! ├── timer.rs        - Single-slot debounce deadlines
//! ├── conversation.rs - Conversation Store (ordered, id-indexed)
//! ├── grouping.rs     - Date separators
//! ├── presence.rs     - Typing set, typing emitter, roster
//! ├── scroll.rs       - Unread accounting and scroll anchors
//! ├── composer.rs     - Idle / Editing / Replying
//! ├── format.rs       - Reply snippets, edited labels, emoji
//! ├── view.rs         - Owned render snapshot
//! ├── engine.rs       - ChatEngine and the Command set
//! └── runtime.rs      - tokio select loop
//! ```
//!
//! The engine is synchronous and owns all state. The runtime is the only
//! place that awaits: it feeds signals, commands and timer ticks into the
//! engine one at a time and publishes a [`ViewSnapshot`] after each.

pub mod channel;
pub mod composer;
pub mod conversation;
pub mod engine;
pub mod format;
pub mod grouping;
pub mod presence;
pub mod runtime;
pub mod scroll;
pub mod session;
pub mod timer;
pub mod view;

pub use channel::{EventChannel, MpscChannel, RecordingChannel};
pub use composer::{Composer, ComposerMode};
pub use conversation::{Applied, ConversationStore};
pub use engine::{ChatEngine, Command};
pub use presence::{Roster, RosterHeader, TypingEmitter, TypingSet};
pub use scroll::{Affordance, ScrollCoordinator, ScrollMetrics};
pub use session::{LocalIdentity, Session};
pub use view::{MessageRow, ViewRow, ViewSnapshot};
