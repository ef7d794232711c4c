//! roomchat - conversation sync and view-state engine
//!
//! Client-side engine for a multi-user chat room. It keeps a local replica
//! of the room's message history in sync with a server over a named-event
//! channel, tracks who is typing, accounts for unread messages while the
//! user reads history, and drives the composer through its idle, editing
//! and replying states.
//!
//! # Module Structure
//!
//! - **`shared`** - Types that cross the channel boundary
//!   - Message model, wire events, error types
//!   - Engine configuration
//!
//! - **`client`** - The engine itself
//!   - Conversation store, date grouping, presence, scroll/unread, composer
//!   - `ChatEngine` wiring them together behind a closed command set
//!   - tokio runtime loop publishing view snapshots
//!
//! # Usage
//!
//! ```rust,no_run
//! use roomchat::client::{runtime, ChatEngine, MpscChannel, Session, ViewSnapshot};
//! use roomchat::shared::EngineConfig;
//! use tokio::sync::{mpsc, watch};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load_or_default()?;
//! let session = Session::join("lobby", "alice")?;
//! let (channel, _outbound) = MpscChannel::new();
//! let engine = ChatEngine::new(config, session, channel);
//!
//! let (_signal_tx, signals) = mpsc::unbounded_channel();
//! let (_command_tx, commands) = mpsc::unbounded_channel();
//! let (view_tx, _view_rx) = watch::channel(ViewSnapshot::default());
//! runtime::run(engine, signals, commands, view_tx).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Nothing inbound is fatal. Duplicate or stale events are no-ops, malformed
//! payloads are logged and dropped, and rejected user commands come back as
//! [`shared::SharedError`] without touching state.

/// Shared types and data structures
pub mod shared;

/// Room engine
pub mod client;
