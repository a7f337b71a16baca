//! quadsim main entry point.
//!
//! Runs the headless beach-volley demo on top of the simulator:
//! - **bevy_ecs** backs the scene the bodies live in
//! - **glam** for vectors and world matrices
//! - **configparser** for the INI tuning file
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --frames 600
//! cargo run --release -- --json > frames.jsonl
//! ```

mod components;
mod game;
mod math;
mod resources;
mod systems;

use crate::game::BeachMatch;
use crate::resources::gameconfig::GameConfig;
use clap::Parser;
use std::path::PathBuf;

/// quadsim: quads, ellipses and a beach-volley match
#[derive(Parser)]
#[command(version, about = "Headless 2D collision simulator demo")]
struct Cli {
    /// INI file with the match tuning (default: ./quadsim.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of fixed steps to run, overriding the config.
    #[arg(long)]
    frames: Option<u32>,

    /// Step length in seconds, overriding the config.
    #[arg(long)]
    dt: Option<f32>,

    /// Bot seed, overriding the config.
    #[arg(long)]
    seed: Option<u64>,

    /// Print one JSON line of body state per frame instead of a summary.
    #[arg(long)]
    json: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => GameConfig::with_path(path),
        None => GameConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        log::warn!("{}, using defaults", e);
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(dt) = cli.dt {
        config.dt = dt;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    // Early-exit: persist the effective config and quit
    if cli.write_config {
        if let Err(e) = config.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!("Config written to {}", config.config_path.display());
        return;
    }

    let frames = config.frames;
    let mut game = match BeachMatch::new(config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    log::debug!("Draw order: {:?}", game.draw_list());

    if cli.json {
        for _ in 0..frames {
            game.step_frame();
            match serde_json::to_string(&game.frame_record()) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        return;
    }

    let report = game.run(frames);
    log::info!(
        "Match over after {} frames: left {} - right {}",
        report.frames,
        report.scores[0],
        report.scores[1]
    );
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
