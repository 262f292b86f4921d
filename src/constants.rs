//! Tunable constants for the feature runner
//!
//! Built-in defaults for every value in `RunnerConfig`. Settings files override these.

// =============================================================================
// INPUT ACTIONS
// =============================================================================

pub const ACTION_MOVE_FORWARD: &str = "move_forward";
pub const ACTION_MOVE_BACKWARD: &str = "move_backward";
pub const ACTION_MOVE_LEFT: &str = "move_left";
pub const ACTION_MOVE_RIGHT: &str = "move_right";
pub const ACTION_JUMP: &str = "jump";

/// Every action the executor can assert. `wait` and `input` steps release all of these.
pub const SIMULATED_ACTIONS: [&str; 8] = [
    ACTION_MOVE_FORWARD,
    ACTION_MOVE_BACKWARD,
    ACTION_MOVE_LEFT,
    ACTION_MOVE_RIGHT,
    ACTION_JUMP,
    "sprint",
    "crouch",
    "interact",
];

// =============================================================================
// STEP EXECUTION
// =============================================================================

pub const MOVE_TO_CLOSE_DISTANCE: f32 = 2.0; // Horizontal distance at which move_to stops
pub const MOVE_TO_STEER_THRESHOLD: f32 = 0.3; // Local-frame dot product needed to press a direction
pub const INTERACT_RANGE: f32 = 5.0;
pub const DAMAGE_PER_HIT: f64 = 1.0;

// =============================================================================
// VALIDATION
// =============================================================================

pub const NEAR_GROUP_MARGIN: f32 = 0.5; // Slack added on top of near_group max_distance
pub const DEFAULT_NEAR_GROUP_DISTANCE: f32 = 2.0;
pub const DEFAULT_TARGET_TOLERANCE: f32 = 1.0;
pub const PROPERTY_FLOAT_EPSILON: f64 = 1e-4;

// =============================================================================
// RUN LOOP
// =============================================================================

pub const DEFAULT_FPS: f32 = 60.0;
pub const SETTLE_FRAMES: u32 = 1; // Frames between scene spawn and discovery
pub const EXIT_DELAY_FRAMES: u32 = 30; // Frames between result write and loop exit
pub const POSITION_SAMPLE_INTERVAL: u32 = 6; // Keep every Nth position sample in metrics

// =============================================================================
// MOVEMENT SIMULATION
// =============================================================================

pub const MOVE_SPEED: f32 = 5.0; // Units per second
pub const SPRINT_MULTIPLIER: f32 = 1.6;
pub const GROUND_ACCEL: f32 = 40.0;
pub const AIR_ACCEL: f32 = 12.0;
pub const GRAVITY: f32 = 20.0;
pub const JUMP_VELOCITY: f32 = 7.0;
pub const DEFAULT_FLOOR_Y: f32 = 0.0;

// =============================================================================
// FILES
// =============================================================================

pub const TESTS_FILE_JSON: &str = "tests.json";
pub const TESTS_FILE_TOML: &str = "tests.toml";
pub const SCENE_FILE: &str = "scene.json";
pub const RESULTS_FILE: &str = "test_results.json";
pub const DEFAULT_OUTPUT_ROOT: &str = "test_runs";
