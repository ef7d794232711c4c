//! End-to-end engine flows driven through wire events and commands

use std::time::Duration;

use chrono::Duration as Days;
use pretty_assertions::assert_eq;
use roomchat::client::{Affordance, Command, ComposerMode, ScrollMetrics, ViewRow};
use roomchat::shared::event::names;
use roomchat::shared::{ChannelSignal, MessageId, RoomUser, SharedError};
use serde_json::json;
use tokio::time::Instant;

use crate::common::*;
use crate::{assert_contains, assert_err, assert_message_order, assert_ok, assert_sent};

fn away() -> Command {
    Command::Scroll(ScrollMetrics::new(5000.0, 1000.0, 800.0))
}

fn bottom() -> Command {
    Command::Scroll(ScrollMetrics::new(5000.0, 4150.0, 800.0))
}

#[test]
fn test_prefetch_then_reply_on_next_day_gets_separator() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();

    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("1", "hi", t0)])), now);
    engine.handle_signal(wire(names::REPLY, to_json(&peer("2", "yo", t0 + Days::days(1)))), now);

    let view = snapshot_utc(&mut engine, (t0 + Days::days(1)).date_naive());
    let shape: Vec<String> = view
        .rows
        .iter()
        .map(|row| match row {
            ViewRow::DateSeparator { label, .. } => format!("sep:{}", label),
            ViewRow::Message(m) => format!("msg:{}", m.message_id),
        })
        .collect();
    assert_eq!(shape, vec!["msg:1", "sep:Today", "msg:2"]);
}

#[test]
fn test_server_order_is_kept_over_timestamps() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();

    engine.handle_signal(wire(names::REPLY, to_json(&peer("late", "b", t0 + Days::hours(2)))), now);
    engine.handle_signal(wire(names::REPLY, to_json(&peer("early", "a", t0))), now);

    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_message_order!(view, ["late", "early"]);
}

#[test]
fn test_unchanged_edit_submit_emits_nothing() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("1", "hi", t0), mine("2", "yo", t0)])), now);

    assert_ok!(engine.dispatch(Command::SelectMessage("2".into()), now));
    assert!(matches!(engine.composer().mode(), ComposerMode::Editing { .. }));
    assert_eq!(engine.composer().draft(), "yo");

    assert_ok!(engine.dispatch(Command::Submit, now));
    assert_eq!(engine.composer().mode(), &ComposerMode::Idle);
    assert!(!engine.channel().names().contains(&names::MESSAGE_EDIT));
}

#[test]
fn test_edit_roundtrip_through_server_echo() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![mine("1", "first", t0), peer("2", "x", t0)])), now);

    assert_ok!(engine.dispatch(Command::SelectMessage("1".into()), now));
    assert_ok!(engine.dispatch(Command::SetDraft("second".into()), now));
    assert_ok!(engine.dispatch(Command::Submit, now));

    let sent = engine.channel().sent().last().cloned().expect("edit sent");
    assert_eq!(sent.name, names::MESSAGE_EDIT);
    assert_eq!(sent.payload, json!({"roomId": ROOM, "messageId": "1", "value": "second"}));

    engine.handle_signal(
        wire(
            names::MESSAGE_EDIT,
            json!({"messageId": "1", "value": "second", "editedAt": "2025-06-01T12:30:00Z"}),
        ),
        now,
    );
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_message_order!(view, ["1", "2"]);
    let row = view.messages().next().expect("row");
    assert_eq!(row.text, "second");
    assert_eq!(row.edited_label.as_deref(), Some("01/06/25, 12:30"));
}

#[test]
fn test_deleted_target_still_resolves_for_reply() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("1", "question?", t0)])), now);
    engine.handle_signal(wire(names::REPLY, to_json(&mine("2", "answer", t0).replying_to("1"))), now);

    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_eq!(view.messages().nth(1).and_then(|m| m.reply_snippet.clone()).as_deref(), Some("question?"));

    engine.handle_signal(wire(names::MESSAGE_DELETE, json!({"messageId": "1"})), now);
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_message_order!(view, ["1", "2"]);
    let rows: Vec<_> = view.messages().collect();
    assert!(rows[0].is_deleted);
    assert_contains!(rows[0].text, "deleted");
    assert_eq!(rows[1].reply_snippet.as_deref(), Some(""));
}

#[test]
fn test_reply_to_tombstone_still_sends() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("1", "q", t0)])), now);

    assert_ok!(engine.dispatch(Command::Reply("1".into()), now));
    engine.handle_signal(wire(names::MESSAGE_DELETE, json!({"messageId": "1"})), now);
    assert_ok!(engine.dispatch(Command::SetDraft("late answer".into()), now));
    assert_ok!(engine.dispatch(Command::Submit, now));

    let sent = engine.channel().sent().last().cloned().expect("reply sent");
    assert_eq!(sent.name, names::MESSAGE_REPLY);
    assert_eq!(sent.payload["replyTo"], "1");
    assert_eq!(sent.payload["clientId"], MY_CLIENT);
}

#[test]
fn test_delete_only_own_live_messages() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("1", "theirs", t0), mine("2", "mine", t0)])), now);

    assert_err!(engine.dispatch(Command::Delete("1".into()), now), SharedError::MessageError { .. });
    assert_ok!(engine.dispatch(Command::Reply("1".into()), now));
    assert_ok!(engine.dispatch(Command::Delete("2".into()), now));
    assert_eq!(engine.composer().mode(), &ComposerMode::Idle);

    engine.handle_signal(wire(names::MESSAGE_DELETE, json!({"messageId": "2"})), now);
    assert_err!(engine.dispatch(Command::Delete("2".into()), now));
    assert_sent!(engine, [names::MESSAGE_DELETE]);
}

#[test]
fn test_whitespace_submit_sends_nothing() {
    let mut engine = connected_engine();
    let now = Instant::now();
    assert_ok!(engine.dispatch(Command::SetDraft("   ".into()), now));
    assert_err!(engine.dispatch(Command::Submit, now), SharedError::ValidationError { .. });

    let view = engine.snapshot();
    assert!(!view.composer.can_submit);
    assert_eq!(view.composer.draft, "   ");
    assert_sent!(engine, [names::START_TYPING]);
}

#[test]
fn test_unread_banner_flow() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let start = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("0", "old", t0)])), start);
    assert_ok!(engine.dispatch(away(), start));

    for id in ["a", "b", "c"] {
        engine.handle_signal(wire(names::REPLY, to_json(&peer(id, id, t0))), start);
    }
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_eq!(view.affordance, Affordance::UnreadBanner { count: 3 });
    assert_eq!(engine.scroll().first_unread(), Some(&MessageId::from("a")));

    assert_ok!(engine.dispatch(Command::ActivateUnreadBanner, start));
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_eq!(view.anchor(), Some(&MessageId::from("a")));

    engine.poll_timers(start + Duration::from_secs(1));
    assert_eq!(engine.scroll().unread_count(), 0);
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_eq!(view.affordance, Affordance::ScrollToBottom);
    assert_eq!(view.anchor(), None);
}

#[test]
fn test_own_message_scrolls_even_when_reading_history() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    assert_ok!(engine.dispatch(away(), now));
    engine.handle_signal(wire(names::REPLY, to_json(&peer("a", "x", t0))), now);
    engine.handle_signal(wire(names::REPLY, to_json(&mine("b", "y", t0))), now);

    assert_eq!(engine.scroll().unread_count(), 0);
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_eq!(view.anchor(), Some(&MessageId::from("b")));
}

#[test]
fn test_reaching_bottom_clears_unread_after_debounce() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let start = Instant::now();
    assert_ok!(engine.dispatch(away(), start));
    engine.handle_signal(wire(names::REPLY, to_json(&peer("a", "x", t0))), start);
    assert_ok!(engine.dispatch(bottom(), start));

    assert_eq!(engine.next_deadline(), Some(start + Duration::from_secs(3)));
    engine.poll_timers(start + Duration::from_secs(2));
    assert_eq!(engine.scroll().unread_count(), 1);
    engine.poll_timers(start + Duration::from_secs(3));
    assert_eq!(engine.scroll().unread_count(), 0);
}

#[test]
fn test_duplicate_reply_counts_once() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    assert_ok!(engine.dispatch(away(), now));
    let message = peer(&random_id(), "dup", t0);
    engine.handle_signal(wire(names::REPLY, to_json(&message)), now);
    engine.handle_signal(wire(names::REPLY, to_json(&message)), now);

    assert_eq!(engine.store().len(), 1);
    assert_eq!(engine.scroll().unread_count(), 1);
}

#[test]
fn test_reconnect_rejoins_and_resyncs() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(wire(names::PREFETCH, to_json(&vec![peer("1", "a", t0)])), now);
    engine.handle_signal(
        wire(names::USER_TYPING, json!({"userName": "bob", "clientId": "client-bob"})),
        now,
    );
    assert!(!engine.typing().is_empty());

    engine.handle_signal(ChannelSignal::Disconnected, now);
    assert!(engine.typing().is_empty());
    assert!(!engine.snapshot().connected);

    engine.handle_signal(ChannelSignal::Connected, now);
    engine.handle_signal(
        wire(names::PREFETCH, to_json(&vec![peer("1", "a", t0), peer("2", "missed", t0)])),
        now,
    );
    assert_sent!(engine, [names::JOIN_ROOM]);
    let view = snapshot_utc(&mut engine, t0.date_naive());
    assert_message_order!(view, ["1", "2"]);
    assert_eq!(view.anchor(), Some(&MessageId::from("2")));
}

#[test]
fn test_resync_keeps_messages_with_display_edit_times() {
    let mut engine = connected_engine();
    let now = Instant::now();
    let history = json!([
        {"messageId": "1", "name": "bob", "clientId": "client-bob", "value": "a",
         "createdAt": "2025-06-01T12:00:00Z", "isEdited": true, "editedAt": ""},
        {"messageId": "2", "name": "bob", "clientId": "client-bob", "value": "b",
         "createdAt": "2025-06-01T12:05:00Z", "isEdited": true, "editedAt": "09/03/25, 23:05"},
    ]);
    engine.handle_signal(wire(names::PREFETCH, history), now);

    assert_eq!(engine.store().len(), 2);
    let view = snapshot_utc(&mut engine, utc(2025, 6, 1, 0, 0).date_naive());
    assert_message_order!(view, ["1", "2"]);
}

#[test]
fn test_typing_across_reconnect_sends_paired_signals() {
    let mut engine = connected_engine();
    let start = Instant::now();

    engine.handle_signal(ChannelSignal::Disconnected, start);
    assert_ok!(engine.dispatch(Command::SetDraft("h".into()), start));
    engine.handle_signal(ChannelSignal::Connected, start + Duration::from_millis(100));
    assert_ok!(engine.dispatch(Command::SetDraft("hi".into()), start + Duration::from_millis(200)));
    engine.poll_timers(start + Duration::from_millis(1300));

    assert_sent!(
        engine,
        [names::JOIN_ROOM, names::START_TYPING, names::STOP_TYPING]
    );
}

#[test]
fn test_typing_indicator_from_peers() {
    let mut engine = connected_engine();
    let start = Instant::now();
    let typing = |name: &str, id: &str| wire(names::USER_TYPING, json!({"userName": name, "clientId": id}));

    engine.handle_signal(typing(ME, MY_CLIENT), start);
    assert_eq!(engine.snapshot().typing_text, "");

    engine.handle_signal(typing("bob", "c-bob"), start);
    engine.handle_signal(typing("carol", "c-carol"), start);
    assert_eq!(engine.snapshot().typing_text, "bob, carol are typing...");

    engine.handle_signal(typing("dave", "c-dave"), start + Duration::from_secs(5));
    engine.handle_signal(typing("erin", "c-erin"), start + Duration::from_secs(5));
    assert_eq!(engine.snapshot().typing_text, "bob, carol and 2 others are typing...");

    engine.handle_signal(wire(names::USER_STOPPED_TYPING, json!({"clientId": "c-bob"})), start);
    engine.poll_timers(start + Duration::from_secs(10));
    assert_eq!(engine.snapshot().typing_text, "dave, erin are typing...");
}

#[test]
fn test_roster_header_hides_self() {
    let mut engine = connected_engine();
    let users = vec![
        RoomUser::new(ME, MY_CLIENT),
        RoomUser::new("bob", "c-bob"),
        RoomUser::new("carol", "c-carol"),
        RoomUser::new("dave", "c-dave"),
    ];
    engine.handle_signal(wire(names::USERS, to_json(&users)), Instant::now());

    let view = engine.snapshot();
    let visible: Vec<&str> = view.roster.visible.iter().map(|u| u.name.as_str()).collect();
    let overflow: Vec<&str> = view.roster.overflow.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(visible, vec!["bob", "carol"]);
    assert_eq!(overflow, vec!["dave"]);
}

#[test]
fn test_guests_only_own_their_client() {
    let mut engine = engine_as("", "guest-1");
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(
        wire(
            names::PREFETCH,
            to_json(&vec![msg("1", "guest", "guest-2", "other tab", t0), msg("2", "guest", "guest-1", "me", t0)]),
        ),
        now,
    );

    let view = snapshot_utc(&mut engine, t0.date_naive());
    let own: Vec<bool> = view.messages().map(|m| m.is_own).collect();
    assert_eq!(own, vec![false, true]);
    assert_err!(engine.dispatch(Command::SelectMessage("1".into()), now));
}

#[test]
fn test_reply_preview_in_composer() {
    let mut engine = connected_engine();
    let t0 = utc(2025, 6, 1, 12, 0);
    let now = Instant::now();
    engine.handle_signal(
        wire(names::PREFETCH, to_json(&vec![peer("1", "a rather long message that keeps going", t0)])),
        now,
    );
    assert_ok!(engine.dispatch(Command::Reply("1".into()), now));

    let view = engine.snapshot();
    assert_eq!(
        view.composer.reply_preview.as_deref(),
        Some("a rather long message that kee...")
    );
    assert!(view.messages().next().is_some_and(|m| m.is_selected));

    assert_ok!(engine.dispatch(Command::Cancel, now));
    assert_eq!(engine.snapshot().composer.reply_preview, None);
}
