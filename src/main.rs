mod clock;
mod config;
mod devices;
mod dsp;
mod error;
mod pitch;
mod playback;
mod render;
mod score;
mod types;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::File, io, path::PathBuf, sync::Arc};

use config::VisualizerConfig;
use devices::{list_devices, Direction};
use error::RenderSurfaceError;
use pitch::{CpalCapture, PitchEstimator, SharedPitchState};
use render::{FrameTimer, RenderEngine};
use score::Score;
use ui::{events, render as painter, App};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Scrolling pitch lane: sing against a MIDI score and watch your intonation
#[derive(Parser, Debug)]
#[command(name = "pitch-lane")]
#[command(about = "Real-time singing pitch visualizer", long_about = None)]
struct Args {
    /// Reference score (Standard MIDI File)
    midi_file: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// List available devices and exit
    #[arg(short = 'l', long = "list")]
    list_devices: bool,

    /// Do not play the score
    #[arg(long = "mute")]
    mute: bool,
}

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pitch-lane")
        .join("pitch-lane.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("pitch-lane.log")));

    // Running without a log file is better than not running
    if let Ok(log_file) = log_file {
        let _ = WriteLogger::init(log_level, Config::default(), log_file);
    }

    log::info!("pitch-lane starting (log level: {:?})", log_level);
}

fn print_devices() -> Result<()> {
    println!("Available Audio Input Devices:");
    for (i, device) in list_devices(Direction::Input)?.iter().enumerate() {
        println!("  {}: {}", i, device);
    }
    println!("\nAvailable Audio Output Devices:");
    for (i, device) in list_devices(Direction::Output)?.iter().enumerate() {
        println!("  {}: {}", i, device);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_devices {
        return print_devices();
    }

    let config = match &args.config {
        Some(path) => VisualizerConfig::load(path)?,
        None => VisualizerConfig::default(),
    };

    let score = args
        .midi_file
        .as_ref()
        .map(|path| {
            Score::load(path).with_context(|| format!("Failed to load score: {}", path.display()))
        })
        .transpose()?;

    run(config, score, args.mute)
}

fn run(config: VisualizerConfig, score: Option<Score>, mute: bool) -> Result<()> {
    let state = Arc::new(SharedPitchState::new());
    let capture = CpalCapture::new(config.devices.audioin.clone());
    let estimator = PitchEstimator::spawn(capture, config.detector.clone(), Arc::clone(&state))
        .context("Failed to start microphone capture")?;
    log::info!("Microphone open at {} Hz", estimator.sample_rate());

    let engine = RenderEngine::new(&config.display, score)?;
    let mut terminal = setup_terminal()?;

    // Guide playback is optional; the visual keeps going without it
    let guide = match engine.score() {
        Some(score) if config.playback.enabled && !mute && !score.is_empty() => {
            match playback::start(score, &config.playback, config.devices.audioout.as_deref()) {
                Ok(stream) => Some(stream),
                Err(err) => {
                    log::warn!("Guide playback unavailable: {}", err);
                    None
                }
            }
        }
        _ => None,
    };

    // Clock starts with the first played sample
    let mut app = App::new(engine, state, estimator);
    let result = run_ui_loop(&mut terminal, &mut app, config.display.frame_rate);
    let restored = restore_terminal(&mut terminal);

    drop(guide);
    log::info!("Exiting after {:.1}s", app.elapsed());

    result?;
    restored?;
    Ok(())
}

fn setup_terminal() -> Result<Tui, RenderSurfaceError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<(), RenderSurfaceError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Fixed-rate loop: advance a frame, paint it, then spend the rest of the
/// frame period waiting for keys
fn run_ui_loop(terminal: &mut Tui, app: &mut App, frame_rate: u32) -> Result<()> {
    let mut timer = FrameTimer::new(frame_rate);
    log::debug!("Frame period {:?}", timer.period());

    loop {
        app.frame();
        terminal
            .draw(|f| painter::render(f, app))
            .map_err(RenderSurfaceError::from)?;

        events::handle_events(app, timer.remaining())?;

        if app.should_quit {
            break;
        }

        timer.wait();
    }

    Ok(())
}
