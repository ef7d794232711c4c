//! Property-based tests for the outbound typing debounce

use proptest::prelude::*;
use roomchat::client::Command;
use roomchat::shared::event::names;
use std::time::Duration;
use tokio::time::Instant;

use crate::common::connected_engine;

proptest! {
    #[test]
    fn test_burst_sends_one_start_and_one_stop(gaps in prop::collection::vec(0u64..1000, 1..30)) {
        let mut engine = connected_engine();
        let start = Instant::now();
        let mut at = start;
        let mut draft = String::new();

        for gap in gaps {
            at += Duration::from_millis(gap);
            engine.poll_timers(at);
            draft.push('x');
            engine.dispatch(Command::SetDraft(draft.clone()), at).unwrap();
        }
        engine.poll_timers(at + Duration::from_millis(999));
        prop_assert_eq!(engine.channel().names(), vec![names::START_TYPING]);

        engine.poll_timers(at + Duration::from_secs(1));
        prop_assert_eq!(
            engine.channel().names(),
            vec![names::START_TYPING, names::STOP_TYPING]
        );
    }
}
