//! Tokio driver for [`ChatEngine`]
//!
//! One task owns the engine. It waits on transport signals, user commands
//! and the engine's earliest timer, applies whichever comes first, and
//! publishes a fresh [`ViewSnapshot`] after every reaction.

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use super::channel::EventChannel;
use super::engine::{ChatEngine, Command};
use super::view::ViewSnapshot;
use crate::shared::event::ChannelSignal;

/// Drive `engine` until teardown or until both input streams close.
///
/// Returns the engine so the caller can inspect or reuse what is left.
pub async fn run<C: EventChannel>(
    mut engine: ChatEngine<C>,
    mut signals: mpsc::UnboundedReceiver<ChannelSignal>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    view_tx: watch::Sender<ViewSnapshot>,
) -> ChatEngine<C> {
    let mut signals_open = true;
    let mut commands_open = true;

    tracing::info!("[Runtime] Started for room {}", engine.session().room_id());
    view_tx.send_replace(engine.snapshot());

    while signals_open || commands_open {
        let deadline = engine.next_deadline();
        let timer = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            signal = signals.recv(), if signals_open => match signal {
                Some(signal) => engine.handle_signal(signal, Instant::now()),
                None => {
                    tracing::debug!("[Runtime] Signal stream closed");
                    signals_open = false;
                    continue;
                }
            },
            command = commands.recv(), if commands_open => match command {
                Some(command) => {
                    if let Err(e) = engine.dispatch(command, Instant::now()) {
                        tracing::debug!("[Runtime] Command rejected: {}", e);
                    }
                }
                None => {
                    tracing::debug!("[Runtime] Command stream closed");
                    commands_open = false;
                    continue;
                }
            },
            _ = timer => engine.poll_timers(Instant::now()),
        }

        view_tx.send_replace(engine.snapshot());
        if engine.is_closed() {
            break;
        }
    }

    tracing::info!("[Runtime] Stopped");
    engine
}
