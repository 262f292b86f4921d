//! Feature Runner - dynamic feature tests for generated game builds, run in headless Bevy
//!
//! This crate provides the scene model, the simulated player and the feature
//! test pipeline (discovery, test loading, step execution, validation and
//! result aggregation) organized into modules.

// Core modules
pub mod config;
pub mod constants;
pub mod error;
pub mod helpers;
pub mod simulation;
pub mod testing;

// Scene modules
pub mod input;
pub mod player;
pub mod world;

// Re-export commonly used types for convenience
pub use config::{ExecutorSettings, MovementTuning, RunnerConfig};
pub use error::RunnerError;
pub use input::{InputState, SimulatedInput};
pub use player::{Grounded, Inventory, Player, Velocity};
pub use simulation::{BuildOptions, HeadlessAppBuilder, RunOutcome, install_logging, run_build, run_suite};
pub use testing::{
    DiscoveryRegistry, FeatureRunner, OverallStatus, ResultDocument, TestResult, TestStatus,
    TestSuite, format_feedback, template_for,
};
pub use world::{Capability, SceneDescription, spawn_scene};
