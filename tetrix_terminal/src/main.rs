mod file_logger;
mod game_input_handler;
mod game_renderer;
mod settings;
pub mod terminal_tetrix;

use std::{io, path::PathBuf};

use anyhow::Context;
use clap::Parser;

/// Terminal frontend for playing tetrix.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The framerate at which to redraw the game.
    #[arg(short, long)]
    fps: Option<u32>,
    /// Seed for the piece sequence, for reproducible runs.
    #[arg(short, long)]
    seed: Option<u64>,
    /// JSON settings file (fps, tick periods, keybinds).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Append log output to this file. Nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Maximum level written to the log file.
    #[arg(long, default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        file_logger::init(path, args.log_level)
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    let mut settings = match &args.settings {
        Some(path) => settings::Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => settings::Settings::default(),
    };
    if let Some(fps) = args.fps {
        settings.game_fps = fps.into();
    }
    let stdout = io::BufWriter::new(io::stdout());
    let mut app = terminal_tetrix::App::new(stdout, settings, args.seed);
    let msg = app.run()?;
    drop(app);
    println!("{msg}");
    Ok(())
}
