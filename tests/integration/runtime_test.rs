//! Runtime loop over tokio channels, on a paused clock

use std::time::Duration;

use roomchat::client::{runtime, ChatEngine, Command, MpscChannel, Session, ViewSnapshot};
use roomchat::shared::event::names;
use roomchat::shared::{ChannelSignal, EngineConfig};
use serde_json::json;
use tokio::sync::{mpsc, watch};

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_runtime_end_to_end() {
    let session = Session::join(ROOM, ME).unwrap();
    let (channel, mut outbound) = MpscChannel::new();
    let engine = ChatEngine::new(EngineConfig::default(), session, channel);

    let (signal_tx, signals) = mpsc::unbounded_channel();
    let (command_tx, commands) = mpsc::unbounded_channel();
    let (view_tx, mut view_rx) = watch::channel(ViewSnapshot::default());
    let handle = tokio::spawn(runtime::run(engine, signals, commands, view_tx));

    signal_tx.send(ChannelSignal::Connected).unwrap();
    assert_eq!(outbound.recv().await.unwrap().name, names::JOIN_ROOM);

    signal_tx.send(wire(names::CLIENT_ID, json!(MY_CLIENT))).unwrap();
    let t0 = utc(2025, 6, 1, 12, 0);
    signal_tx
        .send(wire(names::PREFETCH, to_json(&vec![peer("1", "hello", t0)])))
        .unwrap();

    view_rx
        .wait_for(|view| view.messages().count() == 1)
        .await
        .unwrap();
    assert!(view_rx.borrow().connected);

    command_tx.send(Command::SetDraft("hey".into())).unwrap();
    assert_eq!(outbound.recv().await.unwrap().name, names::START_TYPING);

    // Quiet period elapses on the paused clock
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(outbound.recv().await.unwrap().name, names::STOP_TYPING);

    command_tx.send(Command::Submit).unwrap();
    let add = outbound.recv().await.unwrap();
    assert_eq!(add.name, names::MESSAGE_ADD);
    assert_eq!(add.payload["value"], "hey");
    assert_eq!(add.payload["clientId"], MY_CLIENT);

    command_tx.send(Command::Teardown).unwrap();
    let engine = handle.await.unwrap();
    assert!(engine.is_closed());
    assert!(engine.store().is_empty());
    assert!(outbound.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stale_typing_expires_without_input() {
    let session = Session::join(ROOM, ME).unwrap();
    let (channel, _outbound) = MpscChannel::new();
    let engine = ChatEngine::new(EngineConfig::default(), session, channel);

    let (signal_tx, signals) = mpsc::unbounded_channel();
    let (_command_tx, commands) = mpsc::unbounded_channel::<Command>();
    let (view_tx, mut view_rx) = watch::channel(ViewSnapshot::default());
    tokio::spawn(runtime::run(engine, signals, commands, view_tx));

    signal_tx.send(ChannelSignal::Connected).unwrap();
    signal_tx.send(wire(names::CLIENT_ID, json!(MY_CLIENT))).unwrap();
    signal_tx
        .send(wire(names::USER_TYPING, json!({"userName": "bob", "clientId": "c-bob"})))
        .unwrap();

    view_rx
        .wait_for(|view| view.typing_text == "bob is typing...")
        .await
        .unwrap();
    view_rx.wait_for(|view| view.typing_text.is_empty()).await.unwrap();
}
