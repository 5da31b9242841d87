//! CLI entry point - the composition root.
//!
//! This is the only place where infrastructure is wired together: the
//! rodio output device, the symphonia duration probe, the state store,
//! and the synthesis engine all meet here. Everything else goes through
//! the session controller.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use lector_core::{
    CATALOG, PlayState, SessionEvent, SilenceSynthesizer, StateStore, format_time,
};
use lector_playback::{RodioDevice, SymphoniaProbe};
use lector_session::SessionController;

#[derive(Parser, Debug)]
#[command(name = "lector", about = "Turn text files into audiobooks and play them")]
struct Cli {
    /// Input file to open on startup (.txt converts, .wav/.mp3 plays)
    input: Option<PathBuf>,

    /// Resume-state file (defaults to ~/.lector.json)
    #[arg(long, env = "LECTOR_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Synthesis pace multiplier; 1.0 is the voice's natural pace
    #[arg(long, default_value_t = 1.0)]
    pace: f32,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let store = cli
        .state_file
        .map_or_else(StateStore::default_location, StateStore::at);
    let device = RodioDevice::open_default()?;
    let mut controller = SessionController::new(
        Box::new(device),
        Arc::new(SilenceSynthesizer::new()),
        Arc::new(SymphoniaProbe),
        store,
    );
    controller.set_length_scale(cli.pace);

    if let Some(input) = &cli.input {
        if let Err(err) = controller.select_input(input) {
            eprintln!("{err}");
        }
    }

    repl(&mut controller)?;
    controller.save_now();
    Ok(())
}

fn repl(controller: &mut SessionController) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("lector - type 'help' for commands");

    loop {
        for event in controller.poll_events() {
            print_event(&event);
        }

        match editor.readline("lector> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                if matches!(dispatch(controller, line), Flow::Quit) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if controller.is_converting() {
                    println!("Cancelling conversion...");
                    controller.cancel_conversion();
                } else {
                    break;
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn dispatch(controller: &mut SessionController, line: &str) -> Flow {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    let result = match command {
        "open" | "o" => match arg {
            Some(path) => controller.select_input(std::path::Path::new(path)),
            None => {
                println!("usage: open <file.txt|file.wav|file.mp3>");
                Ok(())
            }
        },
        "play" | "p" => controller.play(),
        "pause" => {
            controller.pause();
            Ok(())
        }
        "resume" | "r" => controller.resume(),
        "stop" => {
            controller.stop();
            Ok(())
        }
        "seek" => match arg.and_then(|a| a.parse::<f64>().ok()) {
            Some(seconds) => controller.seek(seconds),
            None => {
                println!("usage: seek <seconds>");
                Ok(())
            }
        },
        "fwd" | "f" => controller.skip_forward(),
        "back" | "b" => controller.skip_back(),
        "toggle" | "t" => match controller.status().state {
            PlayState::Playing => {
                controller.pause();
                Ok(())
            }
            PlayState::Paused => controller.resume(),
            PlayState::Stopped => controller.play(),
        },
        "cancel" => {
            controller.cancel_conversion();
            Ok(())
        }
        "status" | "s" => {
            print_status(controller);
            Ok(())
        }
        "voices" => {
            print_voices();
            Ok(())
        }
        "help" | "h" => {
            print_help();
            Ok(())
        }
        "quit" | "q" | "exit" => return Flow::Quit,
        other => {
            println!("unknown command '{other}', try 'help'");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
    }
    Flow::Continue
}

fn print_status(controller: &SessionController) {
    let status = controller.status();
    let state = match status.state {
        PlayState::Playing => "playing",
        PlayState::Paused => "paused",
        PlayState::Stopped => "stopped",
    };
    match &status.track {
        Some(track) => println!("track:    {}", track.display()),
        None => println!("track:    (none)"),
    }
    let position = format_time(status.position.max(0.0) as u64);
    match status.duration {
        Some(duration) => {
            let remaining = (duration - status.position).max(0.0);
            println!(
                "position: {position} / {} (-{})",
                format_time(duration.max(0.0) as u64),
                format_time(remaining as u64)
            );
        }
        None => println!("position: {position}"),
    }
    println!("state:    {state}");
    if controller.is_converting() {
        println!("converting...");
    }
}

fn print_voices() {
    for voice in CATALOG {
        let qualities: Vec<_> = voice.qualities.iter().map(ToString::to_string).collect();
        println!("{:<24} [{}]", voice.name, qualities.join(", "));
    }
}

fn print_help() {
    println!("  open <file>   convert a .txt, or play a .wav/.mp3");
    println!("  play          play the bound track from the resume point");
    println!("  pause         pause playback");
    println!("  resume        resume paused playback");
    println!("  stop          stop playback and rewind to the start");
    println!("  seek <secs>   jump to an absolute position");
    println!("  toggle        cycle play -> pause -> resume");
    println!("  fwd / back    skip 10 seconds forward / backward");
    println!("  cancel        cancel the running conversion");
    println!("  status        show track, position, and state");
    println!("  voices        list the voice catalog");
    println!("  quit          save and exit (Ctrl-C cancels a conversion)");
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::ConversionStarted { chunks } => {
            println!("Converting {chunks} chunk(s)...");
        }
        SessionEvent::ConversionProgress {
            current,
            total,
            stage,
        } => {
            println!("  {stage:?} {current}/{total}");
        }
        SessionEvent::ConversionCompleted { track } => {
            println!("Done: {}", track.path.display());
        }
        SessionEvent::ConversionCancelled => println!("Conversion cancelled"),
        SessionEvent::ConversionFailed { error } => eprintln!("Conversion failed: {error}"),
        SessionEvent::DurationComputed { seconds } => {
            println!("Duration: {}", format_time(seconds.max(0.0) as u64));
        }
        SessionEvent::TrackBound { path } => println!("Bound: {}", path.display()),
        // Position ticks and state flips are visible via `status`.
        SessionEvent::PositionChanged { .. } | SessionEvent::PlayStateChanged { .. } => {}
    }
}
