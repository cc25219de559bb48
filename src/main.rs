//! Blocktris: a classic falling-block puzzle in the terminal.

mod app;
mod board;
mod controller;
mod game;
mod input;
mod notify;
mod piece;
mod scoring;
mod theme;
mod timer;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Options derived from CLI that affect how a session runs.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Seed for the piece sequence; random when unset.
    pub seed: Option<u64>,
    pub autostart: bool,
    pub animations: bool,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(theme) => theme,
        Err(err) => {
            log::warn!("falling back to default theme: {err}");
            theme::Theme::default()
        }
    };
    let config = GameConfig {
        seed: args.seed,
        autostart: args.no_menu,
        animations: !args.no_animation,
        frame_rate: args.frame_rate,
    };
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Logs go to a file; the terminal belongs to the game. `RUST_LOG` overrides the level.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

/// Classic falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktris",
    version,
    about = "Classic falling-block puzzle in the terminal. Clear full rows to score.",
    long_about = "Blocktris is a terminal take on the classic falling-block puzzle.\n\n\
        Steer the falling tetromino, complete horizontal rows to clear them, and survive as \
        the drop speed rises every ten lines.\n\n\
        CONTROLS:\n  Left/Right  Move    Up        Rotate      Down       Soft drop\n  \
        Space       Hard drop   P          Pause      Enter/R    Start / restart\n  \
        Q / Esc     Quit\n\n\
        Vim keys h/j/k/l work too. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the slate default if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Seed the piece sequence for a reproducible game.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Skip the start screen and begin playing immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the line-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["blocktris"]).unwrap();
        assert_eq!(args.seed, None);
        assert!(!args.no_menu);
        assert!(!args.no_animation);
        assert!((args.frame_rate - 30.0).abs() < f64::EPSILON);
        assert!(args.theme.is_none());
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::try_parse_from([
            "blocktris",
            "--seed",
            "42",
            "--no-menu",
            "--no-animation",
            "--frame-rate",
            "60",
            "-t",
            "onedark.theme",
        ])
        .unwrap();
        assert_eq!(args.seed, Some(42));
        assert!(args.no_menu);
        assert!(args.no_animation);
        assert!((args.frame_rate - 60.0).abs() < f64::EPSILON);
        assert_eq!(args.theme, Some(PathBuf::from("onedark.theme")));
    }
}
