//! Event Channel boundary
//!
//! The transport (socket handshake, reconnection backoff) lives outside this
//! crate. The engine only needs somewhere to push named events; inbound
//! traffic reaches it as [`ChannelSignal`](crate::shared::ChannelSignal)s.
//!
//! Sends are fire-and-forget: there is no acknowledgement, and a failed send
//! is logged and dropped.

use tokio::sync::mpsc;

use crate::shared::error::SharedError;
use crate::shared::event::WireEvent;

/// Outbound half of a bidirectional named-event transport
pub trait EventChannel: Send {
    /// Queue an event for sending
    fn emit(&mut self, event: WireEvent) -> Result<(), SharedError>;

    /// Close the connection; later emits fail
    fn disconnect(&mut self);
}

/// Channel that hands outbound events to a transport task over tokio mpsc
#[derive(Debug)]
pub struct MpscChannel {
    tx: Option<mpsc::UnboundedSender<WireEvent>>,
}

impl MpscChannel {
    /// Create the channel and the receiver the transport task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WireEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }
}

impl EventChannel for MpscChannel {
    fn emit(&mut self, event: WireEvent) -> Result<(), SharedError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| SharedError::channel("channel disconnected"))?;
        tx.send(event)
            .map_err(|e| SharedError::channel(format!("transport gone, dropped {}", e.0.name)))
    }

    fn disconnect(&mut self) {
        if self.tx.take().is_some() {
            tracing::info!("[Channel] Disconnected");
        }
    }
}

/// Channel that keeps everything it is asked to send
#[derive(Debug, Default, Clone)]
pub struct RecordingChannel {
    sent: Vec<WireEvent>,
    disconnected: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[WireEvent] {
        &self.sent
    }

    /// Names of sent events, in order
    pub fn names(&self) -> Vec<&str> {
        self.sent.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn take(&mut self) -> Vec<WireEvent> {
        std::mem::take(&mut self.sent)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl EventChannel for RecordingChannel {
    fn emit(&mut self, event: WireEvent) -> Result<(), SharedError> {
        if self.disconnected {
            return Err(SharedError::channel("channel disconnected"));
        }
        self.sent.push(event);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnected = true;
    }
}
