//! Headless run loop
//!
//! Spawns the scene into a headless app, inserts a `FeatureRunner` and steps
//! frames until every test has run. The result document is written as the
//! terminal action, then a few more frames run before the loop returns.

use bevy::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::RunnerConfig;
use crate::constants::SCENE_FILE;
use crate::testing::{
    FeatureRunner, LoadedSuite, Performance, ResultDocument, SuiteSource, TestSuite, compile,
    find_suite_file, load_suite, write_results,
};
use crate::world::{SceneDescription, spawn_scene};

use super::app_builder::HeadlessAppBuilder;

/// Simulated seconds allowed beyond the suite's summed step durations
const FRAME_BUDGET_SLACK_SECS: f32 = 10.0;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub document: ResultDocument,
    /// Where the document was written, if writing succeeded
    pub written_to: Option<PathBuf>,
    /// Frames stepped, including the exit delay
    pub frames: u64,
}

/// Files and overrides for running one build directory
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Test document; defaults to `tests.json`/`tests.toml` in the build directory
    pub tests: Option<PathBuf>,
    /// Scene description; defaults to `scene.json` in the build directory
    pub scene: Option<PathBuf>,
    /// Run with single-threaded task pools
    pub minimal_threads: bool,
}

/// Load a build directory's tests and scene, then run them
pub fn run_build(build_dir: &Path, options: &BuildOptions, config: &RunnerConfig) -> RunOutcome {
    info!("Running build {}", build_dir.display());

    let tests_path = options
        .tests
        .clone()
        .or_else(|| find_suite_file(build_dir));
    let LoadedSuite { suite, source } = load_suite(tests_path.as_deref());
    if let SuiteSource::Defaults { reason } = &source {
        info!("Test source: defaults ({})", reason);
    }

    let scene_path = options
        .scene
        .clone()
        .unwrap_or_else(|| build_dir.join(SCENE_FILE));
    let scene = SceneDescription::load_or_empty(&scene_path);

    run_suite_with(suite, &scene, config, options.minimal_threads)
}

/// Run a suite against a scene and write the result document
pub fn run_suite(suite: TestSuite, scene: &SceneDescription, config: &RunnerConfig) -> RunOutcome {
    run_suite_with(suite, scene, config, false)
}

fn run_suite_with(
    mut suite: TestSuite,
    scene: &SceneDescription,
    config: &RunnerConfig,
    minimal_threads: bool,
) -> RunOutcome {
    suite.normalize();
    let mut builder = HeadlessAppBuilder::from_config(config);
    if minimal_threads {
        builder = builder.with_minimal_threads();
    }
    let frame_secs = builder.frame_duration().as_secs_f32();
    let mut app = builder.build();

    let max_frames = frame_budget(&suite, config, frame_secs);
    let feature = suite.feature.clone();

    spawn_scene(app.world_mut(), scene);
    app.insert_resource(FeatureRunner::new(suite, config.executor));

    let mut frame_times = Vec::new();
    let mut frames: u64 = 0;
    loop {
        let start = Instant::now();
        app.update();
        frame_times.push(start.elapsed().as_secs_f32());
        frames += 1;

        if app.world().resource::<FeatureRunner>().is_finalized() {
            break;
        }
        if frames >= max_frames {
            error!("Run did not finish within {} frames, reporting partial results", max_frames);
            break;
        }
    }

    let (status, tests, player_found) = {
        let mut runner = app.world_mut().resource_mut::<FeatureRunner>();
        let status = if runner.is_finalized() {
            "completed"
        } else {
            "timeout"
        };
        let player_found = runner.registry().player.is_some();
        (status, runner.take_results(), player_found)
    };

    let document = compile(
        status,
        feature,
        tests,
        player_found,
        Performance::from_samples(&frame_times),
    );

    let written_to = match write_results(&document, &config.output_root) {
        Ok(path) => Some(path),
        Err(e) => {
            error!("Failed to write results: {}", e);
            None
        }
    };

    for _ in 0..config.exit_delay_frames {
        app.update();
        frames += 1;
    }

    RunOutcome {
        document,
        written_to,
        frames,
    }
}

/// Upper bound on frames for a suite: summed step time plus slack, settle frames and one
/// transition frame per step and test
fn frame_budget(suite: &TestSuite, config: &RunnerConfig, frame_secs: f32) -> u64 {
    let steps: usize = suite.tests.iter().map(|t| t.steps.len()).sum();
    let simulated = suite.total_step_duration() + FRAME_BUDGET_SLACK_SECS;
    let frames = (simulated / frame_secs.max(f32::EPSILON)).ceil() as u64;
    frames + (config.executor.settle_frames as u64) + (steps + suite.tests.len()) as u64 + 2
}
