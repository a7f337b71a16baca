//! Demo match configuration.
//!
//! Tuning for the headless beach-volley match in [`crate::game`], loaded from
//! an INI file. Every value has a safe default, so a missing file or key is
//! never fatal.
//!
//! # Configuration File Format
//!
//! ```ini
//! [world]
//! gravity = -3.0
//! floor = -0.95
//! move_speed = 0.5
//! jump_momentum = 2.4
//! ball_scale = 0.1
//! player_scale = 0.1
//! max_headers = 3
//!
//! [run]
//! frames = 3600
//! dt = 0.016666668
//!
//! [serve]
//! seed = 24301
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_GRAVITY: f32 = -3.0;
const DEFAULT_FLOOR: f32 = -0.95;
const DEFAULT_MOVE_SPEED: f32 = 0.5;
const DEFAULT_JUMP_MOMENTUM: f32 = 2.4;
const DEFAULT_BALL_SCALE: f32 = 0.1;
const DEFAULT_PLAYER_SCALE: f32 = 0.1;
const DEFAULT_MAX_HEADERS: u32 = 3;
const DEFAULT_FRAMES: u32 = 3600;
const DEFAULT_DT: f32 = 1.0 / 60.0;
const DEFAULT_SEED: u64 = 24301;
const DEFAULT_CONFIG_PATH: &str = "./quadsim.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Downward acceleration applied to ball and players (negative is down).
    pub gravity: f32,
    /// Height of the beach surface in normalized screen coordinates.
    pub floor: f32,
    /// Horizontal player speed in screen units per second.
    pub move_speed: f32,
    /// Vertical velocity given to a jumping player.
    pub jump_momentum: f32,
    pub ball_scale: f32,
    pub player_scale: f32,
    /// Consecutive headers one player may take before conceding a point.
    pub max_headers: u32,
    /// Number of fixed steps to simulate.
    pub frames: u32,
    /// Fixed step length in seconds.
    pub dt: f32,
    /// Seed for the bot players.
    pub seed: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            floor: DEFAULT_FLOOR,
            move_speed: DEFAULT_MOVE_SPEED,
            jump_momentum: DEFAULT_JUMP_MOMENTUM,
            ball_scale: DEFAULT_BALL_SCALE,
            player_scale: DEFAULT_PLAYER_SCALE,
            max_headers: DEFAULT_MAX_HEADERS,
            frames: DEFAULT_FRAMES,
            dt: DEFAULT_DT,
            seed: DEFAULT_SEED,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [world] section
        if let Some(v) = config.getfloat("world", "gravity").ok().flatten() {
            self.gravity = v as f32;
        }
        if let Some(v) = config.getfloat("world", "floor").ok().flatten() {
            self.floor = v as f32;
        }
        if let Some(v) = config.getfloat("world", "move_speed").ok().flatten() {
            self.move_speed = v as f32;
        }
        if let Some(v) = config.getfloat("world", "jump_momentum").ok().flatten() {
            self.jump_momentum = v as f32;
        }
        if let Some(v) = config.getfloat("world", "ball_scale").ok().flatten() {
            self.ball_scale = v as f32;
        }
        if let Some(v) = config.getfloat("world", "player_scale").ok().flatten() {
            self.player_scale = v as f32;
        }
        if let Some(v) = config.getuint("world", "max_headers").ok().flatten() {
            self.max_headers = v as u32;
        }

        // [run] section
        if let Some(v) = config.getuint("run", "frames").ok().flatten() {
            self.frames = v as u32;
        }
        if let Some(v) = config.getfloat("run", "dt").ok().flatten() {
            self.dt = v as f32;
        }

        // [serve] section
        if let Some(v) = config.getuint("serve", "seed").ok().flatten() {
            self.seed = v;
        }

        info!(
            "Loaded config: gravity={}, floor={}, move_speed={}, jump={}, frames={}, dt={}, seed={}",
            self.gravity,
            self.floor,
            self.move_speed,
            self.jump_momentum,
            self.frames,
            self.dt,
            self.seed
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [world] section
        config.set("world", "gravity", Some(self.gravity.to_string()));
        config.set("world", "floor", Some(self.floor.to_string()));
        config.set("world", "move_speed", Some(self.move_speed.to_string()));
        config.set("world", "jump_momentum", Some(self.jump_momentum.to_string()));
        config.set("world", "ball_scale", Some(self.ball_scale.to_string()));
        config.set("world", "player_scale", Some(self.player_scale.to_string()));
        config.set("world", "max_headers", Some(self.max_headers.to_string()));

        // [run] section
        config.set("run", "frames", Some(self.frames.to_string()));
        config.set("run", "dt", Some(self.dt.to_string()));

        // [serve] section
        config.set("serve", "seed", Some(self.seed.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
