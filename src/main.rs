//! Tram Hop headless driver
//!
//! Runs a session on virtual time with a scripted player and streams JSON
//! snapshots to stdout, one line per snapshot, for an external renderer.
//!
//! Usage: tram-hop [settings.json] [--frames N]

use std::path::PathBuf;
use std::process::ExitCode;

use tram_hop::sim::GamePhase;
use tram_hop::{GameSession, Settings};

/// Host frame length (60 fps)
const FRAME_MS: f64 = 1000.0 / 60.0;
const DEFAULT_FRAMES: u64 = 600;
/// Print a snapshot every this many frames
const SNAPSHOT_EVERY: u64 = 60;
/// The scripted player hops once per this many frames
const HOP_EVERY: u64 = 45;

struct Args {
    settings: Option<PathBuf>,
    frames: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        settings: None,
        frames: DEFAULT_FRAMES,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                let value = iter.next().ok_or("--frames needs a value")?;
                args.frames = value
                    .parse()
                    .map_err(|_| format!("invalid frame count `{value}`"))?;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            path => args.settings = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

/// Key edges the scripted player sends on `frame`
fn script(frame: u64, phase: GamePhase) -> Vec<(&'static str, bool)> {
    match phase {
        GamePhase::NotStarted => vec![("Space", true), ("Space", false)],
        GamePhase::Over => vec![("KeyR", true), ("KeyR", false)],
        GamePhase::Paused => Vec::new(),
        GamePhase::Running => {
            let mut keys = Vec::new();
            match frame % HOP_EVERY {
                0 => keys.push(("Space", true)),
                1 => keys.push(("Space", false)),
                _ => {}
            }
            // Drift left for a while, then let go
            match frame % (HOP_EVERY * 4) {
                0 => keys.push(("ArrowLeft", true)),
                20 => keys.push(("ArrowLeft", false)),
                _ => {}
            }
            keys
        }
    }
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: tram-hop [settings.json] [--frames N]");
            return ExitCode::FAILURE;
        }
    };

    let settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    log::info!("Tram Hop (headless) running {} frames", args.frames);
    let mut session = match GameSession::new(settings) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut restarts = 0u32;

    for frame in 0..args.frames {
        let phase = session.phase();
        for (code, pressed) in script(frame, phase) {
            session.handle_key(code, pressed);
        }
        if phase == GamePhase::Over && session.phase() == GamePhase::Running {
            restarts += 1;
        }

        session.advance(FRAME_MS);

        for event in session.drain_events() {
            log::debug!("frame {frame}: {event:?}");
        }

        if frame % SNAPSHOT_EVERY == 0 {
            match serde_json::to_string(&*session.snapshot()) {
                Ok(line) => println!("{line}"),
                Err(e) => log::error!("Failed to serialize snapshot: {e}"),
            }
        }
    }

    let state = session.snapshot();
    log::info!(
        "Finished: level {}, score {}, lives {}, restarts {}",
        state.level,
        state.score,
        state.lives,
        restarts
    );
    session.shutdown();
    ExitCode::SUCCESS
}
