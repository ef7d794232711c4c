/**
 * room-replay
 *
 * Feeds a recorded JSON-lines transcript through a ChatEngine and prints
 * what the engine would have sent plus the final view.
 *
 * Usage: room-replay <transcript.jsonl> [room-id] [user-name]
 */

use std::io::{BufRead, BufReader};
use std::time::Duration;

use roomchat::client::{ChatEngine, Command, RecordingChannel, Session};
use roomchat::shared::{ChannelSignal, EngineConfig, SharedError};
use serde::Deserialize;
use tokio::time::Instant;

/// One transcript line: `{"atMs": 120, "signal": ...}` or `{"atMs": 120, "command": ...}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Step {
    at_ms: u64,
    #[serde(default)]
    signal: Option<ChannelSignal>,
    #[serde(default)]
    command: Option<Command>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: room-replay <transcript.jsonl> [room-id] [user-name]");
        std::process::exit(2);
    };
    let room_id = args.next().unwrap_or_else(|| "lobby".to_string());
    let user_name = args.next().unwrap_or_default();

    let config = EngineConfig::load_or_default()?;
    config.validate()?;
    let session = Session::join(room_id, user_name)?;
    let mut engine = ChatEngine::new(config, session, RecordingChannel::new());

    let file = std::fs::File::open(&path)?;
    let base = Instant::now();
    let mut last_at = 0u64;

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let step: Step = serde_json::from_str(&line)
            .map_err(|e| SharedError::decode(format!("line {}", number + 1), e))?;
        if step.at_ms < last_at {
            tracing::warn!("[Replay] Line {} goes back in time, clamping", number + 1);
        }
        last_at = last_at.max(step.at_ms);
        let at = base + Duration::from_millis(last_at);

        fire_timers_until(&mut engine, at);
        match (step.signal, step.command) {
            (Some(signal), None) => engine.handle_signal(signal, at),
            (None, Some(command)) => {
                if let Err(e) = engine.dispatch(command, at) {
                    tracing::info!("[Replay] Line {}: command rejected: {}", number + 1, e);
                }
            }
            _ => {
                return Err(SharedError::validation(
                    "line",
                    format!("line {} needs exactly one of signal or command", number + 1),
                )
                .into())
            }
        }
    }

    // Let pending debounces run out
    while let Some(deadline) = engine.next_deadline() {
        engine.poll_timers(deadline);
    }

    for event in engine.channel().sent() {
        println!("{}", serde_json::to_string(event)?);
    }
    let view = engine.snapshot();
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn fire_timers_until(engine: &mut ChatEngine<RecordingChannel>, at: Instant) {
    while let Some(deadline) = engine.next_deadline().filter(|d| *d <= at) {
        engine.poll_timers(deadline);
    }
}
