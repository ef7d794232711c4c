//! Wire-facing types
//!
//! Types that cross the boundary between the conversation engine and the
//! event channel: the message model, named wire events, error types, and
//! engine configuration. All types are serde-serializable so transports and
//! the replay tool can move them as JSON.

/// Room message model and identifiers
pub mod message;

/// Named room events
pub mod event;

/// Engine errors
pub mod error;

/// Engine configuration
pub mod config;

pub use message::{ClientId, Message, MessageId, RoomUser};
pub use event::{ChannelSignal, InboundEvent, OutboundEvent, WireEvent};
pub use error::{Refusal, SharedError};
pub use config::{ConfigError, EngineConfig, EngineConfigBuilder};
