//! Runner configuration
//!
//! Loaded from JSON settings files with the priority
//! local settings > template settings > built-in defaults,
//! then overridden by command line flags.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::RunnerError;

/// Template runner settings (checked into git)
pub const RUNNER_SETTINGS_TEMPLATE: &str = "config/runner_settings.template.json";
/// Local runner settings (gitignored, user's custom settings)
pub const RUNNER_SETTINGS_FILE: &str = "config/runner_settings.json";

/// Thresholds used while executing steps and validating results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// move_to stops once the player is horizontally closer than this
    pub close_distance: f32,
    /// Minimum local-frame dot product before a direction is pressed
    pub steer_threshold: f32,
    /// Maximum distance for interact steps
    pub interact_range: f32,
    /// Slack added to near_group's max_distance
    pub near_group_margin: f32,
    /// Frames to wait after spawn before discovery runs
    pub settle_frames: u32,
    /// Keep every Nth position sample in test metrics
    pub position_sample_interval: u32,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            close_distance: MOVE_TO_CLOSE_DISTANCE,
            steer_threshold: MOVE_TO_STEER_THRESHOLD,
            interact_range: INTERACT_RANGE,
            near_group_margin: NEAR_GROUP_MARGIN,
            settle_frames: SETTLE_FRAMES,
            position_sample_interval: POSITION_SAMPLE_INTERVAL,
        }
    }
}

/// Kinematic controller tuning for the simulated player
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            sprint_multiplier: SPRINT_MULTIPLIER,
            ground_accel: GROUND_ACCEL,
            air_accel: AIR_ACCEL,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
        }
    }
}

/// Configuration for a test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulated frames per second (fixed frame duration = 1 / fps)
    pub fps: f32,
    /// Frames to keep running after the result document is written
    pub exit_delay_frames: u32,
    /// Root directory for timestamped run directories
    pub output_root: PathBuf,
    pub executor: ExecutorSettings,
    pub movement: MovementTuning,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            exit_delay_frames: EXIT_DELAY_FRAMES,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            executor: ExecutorSettings::default(),
            movement: MovementTuning::default(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| RunnerError::json(path, e))
    }

    /// Load configuration from default config files
    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        match Self::from_file(RUNNER_SETTINGS_FILE) {
            Ok(config) => {
                info!("Loaded runner settings from {}", RUNNER_SETTINGS_FILE);
                return config;
            }
            Err(RunnerError::Io { .. }) => {}
            Err(e) => warn!("{}, trying template", e),
        }
        match Self::from_file(RUNNER_SETTINGS_TEMPLATE) {
            Ok(config) => {
                info!("Loaded runner settings from {}", RUNNER_SETTINGS_TEMPLATE);
                config
            }
            Err(RunnerError::Io { .. }) => Self::default(),
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }
}
