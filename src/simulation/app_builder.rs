//! Headless App Builder
//!
//! Provides a reusable builder for creating the headless Bevy app a feature
//! suite runs in. Used by the run loop, the CLI and the batch runner.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use crate::config::{MovementTuning, RunnerConfig};
use crate::constants::DEFAULT_FPS;
use crate::input::SimulatedInput;
use crate::player::{apply_gravity, apply_input, apply_velocity, floor_contact};
use crate::testing::run_executor;

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    fps: f32,
    movement: MovementTuning,
    minimal_threads: bool,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            fps: DEFAULT_FPS,
            movement: MovementTuning::default(),
            minimal_threads: false,
        }
    }

    /// Take fps and movement tuning from a runner config
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new().with_fps(config.fps).with_movement(config.movement)
    }

    /// Set the simulated FPS (default: 60)
    pub fn with_fps(mut self, fps: f32) -> Self {
        if fps > 0.0 {
            self.fps = fps;
        }
        self
    }

    pub fn with_movement(mut self, movement: MovementTuning) -> Self {
        self.movement = movement;
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many builds back to back to keep thread churn down.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Fixed simulated time per `app.update()`
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.fps)
    }

    /// Build the app with minimal plugins and the feature-test schedule
    ///
    /// The returned app has:
    /// - MinimalPlugins, with time advanced by a fixed manual duration per update
    /// - MovementTuning and an empty SimulatedInput
    /// - Update: `run_executor`, then the movement chain
    ///
    /// Callers should spawn the scene and insert a `FeatureRunner`.
    pub fn build(self) -> App {
        let frame = self.frame_duration();
        let mut app = App::new();

        if self.minimal_threads {
            app.add_plugins(
                MinimalPlugins
                    .set(ScheduleRunnerPlugin::run_loop(frame))
                    .set(TaskPoolPlugin {
                        task_pool_options: TaskPoolOptions::with_num_threads(1),
                    }),
            );
        } else {
            app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)));
        }

        // Every update advances exactly one frame of simulated time
        app.insert_resource(TimeUpdateStrategy::ManualDuration(frame));

        app.insert_resource(self.movement);
        app.init_resource::<SimulatedInput>();

        app.add_systems(
            Update,
            (
                run_executor,
                apply_input,
                apply_gravity,
                apply_velocity,
                floor_contact,
            )
                .chain(),
        );

        app
    }
}

/// Install the global log subscriber for command line tools
pub fn install_logging(verbose: bool) {
    let (level, filter) = if verbose {
        (Level::DEBUG, "feature_runner=debug,bevy=warn".to_string())
    } else {
        (Level::INFO, "feature_runner=info,bevy=warn".to_string())
    };

    // Building the plugin sets the process-wide subscriber; the app itself is not needed
    let mut app = App::new();
    app.add_plugins(LogPlugin {
        level,
        filter,
        ..default()
    });
}
