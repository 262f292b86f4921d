//! Step executor - the per-frame state machine that drives a test suite
//!
//! `Idle → Settling → Running → Finalized`. One test is current at a time and
//! its steps run strictly in order. Each tick samples telemetry, then applies
//! the current step until its duration is used up; leftover time carries into
//! the next step so a test runs for its summed step duration to within one tick.

use bevy::prelude::*;
use serde_json::Value;

use crate::config::ExecutorSettings;
use crate::constants::*;
use crate::helpers::{horizontal_distance, round_to, vec3_from_array};
use crate::input::{InputState, publish_input};
use crate::player::Grounded;
use crate::world::{Capability, InteractionError, InteractionOutcome, invoke_capability, set_property};

use super::assertions::{ValidationContext, check_wait_conditions, validate};
use super::discovery::{DiscoveryRegistry, discover, is_live};
use super::parser::{Step, TestSuite};
use super::results::{RunEvent, StepResult, TestMetrics, TestResult, TestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    /// Waiting for the scene to settle before discovery
    Settling { frames_left: u32 },
    Running,
    Finalized,
}

/// Per-test telemetry and bookkeeping, discarded once the test's result is recorded
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub start_position: Option<Vec3>,
    pub last_position: Option<Vec3>,
    /// Path length accumulated across samples
    pub distance: f32,
    pub positions: Vec<Vec3>,
    pub prev_grounded: Option<bool>,
    pub left_floor: bool,
    pub events: Vec<RunEvent>,
    pub step_results: Vec<StepResult>,
    /// Set once an interact/call_method step has acted; cleared when the step ends
    pub interacted: bool,
    /// Simulated seconds spent running steps
    pub elapsed: f32,
    pub samples: u32,
    /// Latest reason the current step could not act
    pub step_note: Option<String>,
}

impl RunState {
    fn begin(position: Option<Vec3>, grounded: Option<bool>) -> Self {
        Self {
            start_position: position,
            last_position: position,
            positions: position.into_iter().collect(),
            prev_grounded: grounded,
            ..Default::default()
        }
    }

    fn record(&mut self, position: Vec3, grounded: Option<bool>, interval: u32) {
        if let Some(last) = self.last_position {
            self.distance += position.distance(last);
        }
        self.last_position = Some(position);
        if self.start_position.is_none() {
            self.start_position = Some(position);
        }

        self.samples += 1;
        if interval > 0 && self.samples % interval == 0 {
            self.positions.push(position);
        }

        if let Some(grounded) = grounded {
            if self.prev_grounded == Some(true) && !grounded {
                self.left_floor = true;
            }
            self.prev_grounded = Some(grounded);
        }
    }

    fn metrics(&self) -> TestMetrics {
        let displacement = match (self.start_position, self.last_position) {
            (Some(start), Some(end)) => start.distance(end),
            _ => 0.0,
        };
        let mut positions: Vec<[f32; 3]> = self.positions.iter().map(|p| rounded(*p)).collect();
        if let Some(last) = self.last_position {
            if self.positions.last() != Some(&last) {
                positions.push(rounded(last));
            }
        }

        TestMetrics {
            distance: round_to(self.distance, 3),
            displacement: round_to(displacement, 3),
            left_floor: self.left_floor,
            duration: round_to(self.elapsed, 3),
            start_position: self.start_position.map(rounded),
            final_position: self.last_position.map(rounded),
            positions,
        }
    }
}

fn rounded(v: Vec3) -> [f32; 3] {
    [round_to(v.x, 3), round_to(v.y, 3), round_to(v.z, 3)]
}

/// Actions that steer from `position` toward `destination` in the player's local frame.
///
/// Empty once within `close_distance` (horizontally). Each local axis is pressed
/// only when its share of the direction exceeds `threshold`.
pub fn steering_actions(
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    destination: Vec3,
    close_distance: f32,
    threshold: f32,
) -> Vec<&'static str> {
    if horizontal_distance(position, destination) < close_distance {
        return Vec::new();
    }

    let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
    let direction = flat(destination - position);
    let along = direction.dot(flat(forward));
    let across = direction.dot(flat(right));

    let mut actions = Vec::new();
    if along > threshold {
        actions.push(ACTION_MOVE_FORWARD);
    } else if along < -threshold {
        actions.push(ACTION_MOVE_BACKWARD);
    }
    if across > threshold {
        actions.push(ACTION_MOVE_RIGHT);
    } else if across < -threshold {
        actions.push(ACTION_MOVE_LEFT);
    }
    actions
}

/// Drives a suite through the scene; lives in the world as a resource and is
/// ticked by `run_executor`
#[derive(Resource, Debug)]
pub struct FeatureRunner {
    settings: ExecutorSettings,
    suite: TestSuite,
    registry: DiscoveryRegistry,
    phase: RunPhase,
    test_index: usize,
    step_index: usize,
    step_elapsed: f32,
    /// Whether the current step has been applied at least once
    step_applied: bool,
    run_state: RunState,
    input: InputState,
    results: Vec<TestResult>,
}

impl FeatureRunner {
    pub fn new(suite: TestSuite, settings: ExecutorSettings) -> Self {
        Self {
            settings,
            suite,
            registry: DiscoveryRegistry::default(),
            phase: RunPhase::Idle,
            test_index: 0,
            step_index: 0,
            step_elapsed: 0.0,
            step_applied: false,
            run_state: RunState::default(),
            input: InputState::default(),
            results: Vec::new(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == RunPhase::Finalized
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn take_results(&mut self) -> Vec<TestResult> {
        std::mem::take(&mut self.results)
    }

    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn current_test_index(&self) -> usize {
        self.test_index
    }

    pub fn current_step_index(&self) -> usize {
        self.step_index
    }

    /// Advance the state machine by one frame of `dt` simulated seconds
    pub fn tick(&mut self, world: &mut World, dt: f32) {
        match self.phase {
            RunPhase::Idle => {
                info!("Running {} tests", self.suite.tests.len());
                self.phase = RunPhase::Settling {
                    frames_left: self.settings.settle_frames,
                };
            }
            RunPhase::Settling { frames_left } if frames_left > 0 => {
                self.phase = RunPhase::Settling {
                    frames_left: frames_left - 1,
                };
            }
            RunPhase::Settling { .. } => {
                self.registry = discover(world);
                self.phase = RunPhase::Running;
                self.begin_test(world);
            }
            RunPhase::Running => self.tick_running(world, dt),
            RunPhase::Finalized => {}
        }
    }

    fn tick_running(&mut self, world: &mut World, dt: f32) {
        self.sample(world);

        loop {
            let Some(test) = self.suite.tests.get(self.test_index) else {
                self.finalize(world);
                return;
            };
            let Some(step) = test.steps.get(self.step_index).cloned() else {
                self.complete_test(world);
                if !self.is_finalized() {
                    self.begin_test(world);
                }
                return;
            };

            let duration = step.duration().max(0.0);
            // Steps shorter than the carried-over time still act once
            if self.step_elapsed < duration || !self.step_applied {
                self.apply_step(world, &step);
                self.step_applied = true;
                if self.step_elapsed < duration {
                    self.step_elapsed += dt;
                    self.run_state.elapsed += dt;
                    return;
                }
            }

            let overshoot = (self.step_elapsed - duration).max(0.0);
            self.finish_step(&step, duration);
            self.step_index += 1;
            self.step_elapsed = overshoot;
        }
    }

    fn begin_test(&mut self, world: &mut World) {
        self.step_index = 0;
        self.step_elapsed = 0.0;
        self.step_applied = false;

        let (position, grounded) = self.player_sample(world);
        self.run_state = RunState::begin(position, grounded);

        match self.suite.tests.get(self.test_index) {
            Some(test) => info!(
                "Test {}/{}: {} ({})",
                self.test_index + 1,
                self.suite.tests.len(),
                test.name,
                test.test_type
            ),
            None => self.finalize(world),
        }
    }

    fn sample(&mut self, world: &World) {
        if let (Some(position), grounded) = self.player_sample(world) {
            self.run_state
                .record(position, grounded, self.settings.position_sample_interval);
        }
    }

    fn player_sample(&self, world: &World) -> (Option<Vec3>, Option<bool>) {
        let Some(player) = self.registry.player else {
            return (None, None);
        };
        (
            world.get::<Transform>(player).map(|t| t.translation),
            world.get::<Grounded>(player).map(|g| g.0),
        )
    }

    fn apply_step(&mut self, world: &mut World, step: &Step) {
        match step {
            Step::Wait { .. } | Step::WaitFor { .. } => self.input.release_all(),
            Step::Input { inputs, .. } => {
                self.input.set_only(inputs);
                let unknown = self.input.unknown_actions();
                if !unknown.is_empty() {
                    debug!("Pressing non-standard actions {:?}", unknown);
                }
            }
            Step::MoveTo {
                target,
                target_group,
                ..
            } => self.steer(world, *target, target_group.as_deref()),
            Step::Interact { target_group, .. } => {
                self.input.release_all();
                self.interact(world, target_group.as_deref());
            }
            Step::CallMethod {
                path, method, args, ..
            } => {
                self.input.release_all();
                self.call_method(world, path, method, args);
            }
        }
        publish_input(world, &self.input);
    }

    fn steer(&mut self, world: &World, target: Option<[f32; 3]>, group: Option<&str>) {
        let destination = match (target, group) {
            (Some(target), _) => vec3_from_array(target),
            (None, Some(group)) => {
                let position = self
                    .registry
                    .live_members(world, group)
                    .first()
                    .and_then(|&e| world.get::<Transform>(e))
                    .map(|t| t.translation);
                match position {
                    Some(position) => position,
                    None => {
                        self.degrade(format!("no live object in group '{}'", group));
                        return;
                    }
                }
            }
            (None, None) => {
                self.degrade("move_to has neither target nor target_group".to_string());
                return;
            }
        };

        let Some(transform) = self.registry.player.and_then(|p| world.get::<Transform>(p)) else {
            self.degrade("no player to move".to_string());
            return;
        };

        let actions = steering_actions(
            transform.translation,
            *transform.forward(),
            *transform.right(),
            destination,
            self.settings.close_distance,
            self.settings.steer_threshold,
        );
        self.input.set_only(&actions);
        self.run_state.step_note = None;
    }

    fn interact(&mut self, world: &mut World, group: Option<&str>) {
        if self.run_state.interacted {
            return;
        }
        let Some(player) = self.registry.player.filter(|&p| is_live(world, p)) else {
            self.degrade("no player to interact with".to_string());
            return;
        };
        let Some(origin) = world.get::<Transform>(player).map(|t| t.translation) else {
            self.degrade("player has no position".to_string());
            return;
        };

        // The capability fallback only applies when the group has nothing interactable at all
        let group_members: Vec<Entity> = group
            .map(|g| self.registry.live_members(world, g))
            .unwrap_or_default()
            .into_iter()
            .filter(|&e| self.registry.interaction_capability(e).is_some())
            .collect();
        let candidates = if group_members.is_empty() {
            self.registry.interaction_fallback()
        } else {
            group_members
        };
        let target = self.nearest_interactable(world, origin, candidates);

        let Some((entity, capability)) = target else {
            let range = self.settings.interact_range;
            self.degrade(match group {
                Some(g) => format!("no interactable '{}' object within {:.1} units", g, range),
                None => format!("no interactable object within {:.1} units", range),
            });
            return;
        };

        let path = self.registry.path_of(entity).unwrap_or("?").to_string();
        let actor = capability.accepts_actor().then_some(player);
        let result = invoke_capability(world, entity, capability, actor, &[]);
        self.record_outcome("interact", &path, capability.method(), result);
    }

    fn nearest_interactable(
        &self,
        world: &World,
        origin: Vec3,
        candidates: Vec<Entity>,
    ) -> Option<(Entity, Capability)> {
        let range = self.settings.interact_range;
        candidates
            .into_iter()
            .filter(|&e| is_live(world, e))
            .filter_map(|e| {
                let capability = self.registry.interaction_capability(e)?;
                let distance = world.get::<Transform>(e)?.translation.distance(origin);
                (distance <= range).then_some((e, capability, distance))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(e, capability, _)| (e, capability))
    }

    fn call_method(&mut self, world: &mut World, path: &str, method: &str, args: &[Value]) {
        if self.run_state.interacted {
            return;
        }
        // One attempt per step, successful or not
        self.run_state.interacted = true;

        let Some(target) = self.registry.by_path(path).filter(|&e| is_live(world, e)) else {
            self.degrade(format!("no object at {}", path));
            return;
        };

        let result = if method == "set" {
            set_property(world, target, args)
        } else if let Some(capability) = Capability::from_method(method) {
            let actor = self.registry.player.filter(|_| capability.accepts_actor());
            invoke_capability(world, target, capability, actor, args)
        } else {
            self.degrade(format!("unknown method '{}' on {}", method, path));
            return;
        };
        self.record_outcome("call_method", path, method, result);
    }

    fn record_outcome(
        &mut self,
        kind: &str,
        path: &str,
        method: &str,
        result: Result<InteractionOutcome, InteractionError>,
    ) {
        match result {
            Ok(outcome) => {
                info!("  {} {}: {}", method, path, outcome);
                self.run_state.interacted = true;
                self.run_state.step_note = None;
                self.run_state.events.push(RunEvent {
                    time: round_to(self.run_state.elapsed, 3),
                    kind: kind.to_string(),
                    target: path.to_string(),
                    detail: format!("{}: {}", method, outcome),
                });
            }
            Err(e) => self.degrade(format!("{} on {} failed: {}", method, path, e)),
        }
    }

    /// The step cannot act: release inputs and remember why
    fn degrade(&mut self, reason: String) {
        self.input.release_all();
        self.run_state.step_note = Some(reason);
    }

    fn finish_step(&mut self, step: &Step, duration: f32) {
        let note = self.run_state.step_note.take();
        if let Some(note) = &note {
            warn!("  step {} ({}): {}", self.step_index + 1, step.action(), note);
        }
        self.run_state.step_results.push(StepResult {
            index: self.step_index,
            action: step.action().to_string(),
            duration,
            elapsed: round_to(self.step_elapsed, 3),
            note,
        });
        self.run_state.interacted = false;
        self.step_applied = false;
    }

    fn complete_test(&mut self, world: &mut World) {
        let state = std::mem::take(&mut self.run_state);
        let Some(test) = self.suite.tests.get(self.test_index) else {
            return;
        };

        let ctx = ValidationContext {
            world: &*world,
            registry: &self.registry,
            settings: &self.settings,
        };
        let validation = validate(&test.validate, &state, &ctx);
        let wait_issues = check_wait_conditions(&test.steps, &ctx);

        let mut issues: Vec<String> = state
            .step_results
            .iter()
            .filter_map(|s| {
                s.note
                    .as_ref()
                    .map(|note| format!("step {} ({}): {}", s.index + 1, s.action, note))
            })
            .collect();
        issues.extend(validation.issues);
        issues.extend(wait_issues);

        let status = if issues.is_empty() {
            info!("  {} PASS", test.name);
            TestStatus::Passed
        } else {
            warn!("  {} FAIL: {}", test.name, issues.join("; "));
            TestStatus::Failed
        };

        self.results.push(TestResult {
            name: test.name.clone(),
            test_type: test.test_type.clone(),
            status,
            issues,
            metrics: state.metrics(),
            events: state.events,
            steps: state.step_results,
        });

        self.input.release_all();
        publish_input(world, &self.input);
        self.test_index += 1;
        if self.test_index >= self.suite.tests.len() {
            self.finalize(world);
        }
    }

    fn finalize(&mut self, world: &mut World) {
        if self.is_finalized() {
            return;
        }
        self.input.release_all();
        publish_input(world, &self.input);
        self.phase = RunPhase::Finalized;

        let passed = self.results.iter().filter(|r| r.passed()).count();
        info!("All tests complete: {}/{} passed", passed, self.results.len());
    }
}

/// Exclusive system ticking the `FeatureRunner` with this frame's delta
pub fn run_executor(world: &mut World) {
    if !world.contains_resource::<FeatureRunner>() {
        return;
    }
    let dt = world
        .get_resource::<Time>()
        .map(|t| t.delta_secs())
        .unwrap_or(0.0);
    world.resource_scope(|world, mut runner: Mut<FeatureRunner>| runner.tick(world, dt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Inventory;
    use crate::testing::parser::{StateCheck, TestDefinition, ValidationSpec};
    use crate::world::{Properties, SceneDescription, spawn_scene};
    use serde_json::json;

    const DT: f32 = 1.0 / 60.0;

    fn scene() -> SceneDescription {
        serde_json::from_value(json!({
            "player": { "position": [0, 0, 0] },
            "objects": [
                { "path": "/root/Main/Door", "position": [0, 0, -3], "groups": ["door"],
                  "capabilities": ["interactable"], "properties": { "is_open": false } },
                { "path": "/root/Main/Key", "position": [3, 0, 0], "groups": ["pickup"],
                  "capabilities": ["pickupable"], "properties": { "item": "key" } },
                { "path": "/root/Main/Lever", "position": [40, 0, 0], "groups": ["lever"],
                  "capabilities": ["activatable"] }
            ]
        }))
        .unwrap()
    }

    fn test_def(name: &str, steps: Vec<Step>, validate: ValidationSpec) -> TestDefinition {
        TestDefinition {
            name: name.to_string(),
            test_type: "interaction".to_string(),
            description: String::new(),
            duration: steps.iter().map(Step::duration).sum(),
            steps,
            validate,
        }
    }

    fn suite(tests: Vec<TestDefinition>) -> TestSuite {
        TestSuite {
            feature: None,
            tests,
        }
    }

    /// Tick a runner to completion on a world without movement systems
    fn drive(world: &mut World, runner: &mut FeatureRunner, dt: f32) -> u32 {
        let mut ticks = 0;
        while !runner.is_finalized() {
            runner.tick(world, dt);
            ticks += 1;
            assert!(ticks < 100_000, "runner never finalized");
        }
        ticks
    }

    fn run(tests: Vec<TestDefinition>) -> (World, FeatureRunner) {
        let mut world = World::new();
        spawn_scene(&mut world, &scene());
        let mut runner = FeatureRunner::new(suite(tests), ExecutorSettings::default());
        drive(&mut world, &mut runner, DT);
        (world, runner)
    }

    #[test]
    fn test_phases_advance_in_order() {
        let mut world = World::new();
        spawn_scene(&mut world, &scene());
        let mut runner = FeatureRunner::new(
            suite(vec![test_def("idle", vec![Step::wait(0.1)], Default::default())]),
            ExecutorSettings::default(),
        );

        assert_eq!(runner.phase(), RunPhase::Idle);
        runner.tick(&mut world, DT);
        assert_eq!(runner.phase(), RunPhase::Settling { frames_left: SETTLE_FRAMES });
        for _ in 0..=SETTLE_FRAMES {
            runner.tick(&mut world, DT);
        }
        assert_eq!(runner.phase(), RunPhase::Running);
        assert!(runner.registry().player.is_some());

        drive(&mut world, &mut runner, DT);
        assert_eq!(runner.results().len(), 1);
        assert!(runner.results()[0].passed());
    }

    #[test]
    fn test_empty_suite_finalizes() {
        let (_, runner) = run(Vec::new());
        assert!(runner.is_finalized());
        assert!(runner.results().is_empty());
    }

    #[test]
    fn test_stationary_player_fails_min_distance() {
        // No movement systems run, so pressing forward goes nowhere
        let (_, runner) = run(vec![test_def(
            "move_forward",
            vec![Step::input(&[ACTION_MOVE_FORWARD], 3.0)],
            ValidationSpec {
                min_distance: Some(0.5),
                ..Default::default()
            },
        )]);

        let result = &runner.results()[0];
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("0.00"), "{:?}", result.issues);
    }

    #[test]
    fn test_interact_fires_once_per_step() {
        let (world, runner) = run(vec![test_def(
            "open_door",
            vec![
                Step::Interact {
                    target_group: Some("door".to_string()),
                    duration: 0.5,
                },
                Step::wait(0.5),
            ],
            ValidationSpec::default(),
        )]);

        let result = &runner.results()[0];
        assert_eq!(result.events.len(), 1, "{:?}", result.events);
        assert_eq!(result.events[0].target, "/root/Main/Door");
        assert!(result.passed());

        let door = runner.registry().by_path("/root/Main/Door").unwrap();
        assert_eq!(world.get::<Properties>(door).unwrap().get_bool("is_open"), Some(true));
    }

    #[test]
    fn test_wait_for_condition_checked_at_validation() {
        let wait_for = |path: &str| Step::WaitFor {
            condition: Some(StateCheck {
                object_exists: Some(path.to_string()),
                ..Default::default()
            }),
            duration: 0.2,
        };
        let (_, runner) = run(vec![
            test_def("door_present", vec![wait_for("/root/Main/Door")], ValidationSpec::default()),
            test_def("door_missing", vec![Step::wait(0.1), wait_for("/root/Main/NoSuchDoor")], ValidationSpec::default()),
        ]);

        let present = &runner.results()[0];
        assert!(present.passed(), "{:?}", present.issues);

        let missing = &runner.results()[1];
        assert_eq!(missing.status, TestStatus::Failed);
        assert_eq!(
            missing.issues,
            vec!["step 2 (wait_for): Object '/root/Main/NoSuchDoor' does not exist".to_string()]
        );
    }

    #[test]
    fn test_interact_pickup_passes_player() {
        let (world, runner) = run(vec![test_def(
            "collect",
            vec![Step::Interact {
                target_group: Some("pickup".to_string()),
                duration: 0.5,
            }],
            ValidationSpec::default(),
        )]);

        assert_eq!(runner.results()[0].events.len(), 1);
        let player = runner.registry().player.unwrap();
        assert!(world.get::<Inventory>(player).unwrap().contains("key"));
        assert!(runner.registry().live_members(&world, "pickup").is_empty());
    }

    #[test]
    fn test_interact_out_of_range_degrades() {
        // Lever is out of range; the door within range must not be used in its place
        let (world, runner) = run(vec![
            test_def(
                "pull_lever",
                vec![Step::Interact {
                    target_group: Some("lever".to_string()),
                    duration: 0.2,
                }],
                ValidationSpec::default(),
            ),
        ]);
        let result = &runner.results()[0];
        assert!(result.events.is_empty(), "{:?}", result.events);
        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.issues[0].starts_with("step 1 (interact): no interactable 'lever'"), "{:?}", result.issues);
        let door = runner.registry().by_path("/root/Main/Door").unwrap();
        assert_eq!(world.get::<Properties>(door).unwrap().get_bool("is_open"), Some(false));

        let mut world = World::new();
        let mut far_only = scene();
        far_only.objects.retain(|o| o.path == "/root/Main/Lever");
        spawn_scene(&mut world, &far_only);
        let mut runner = FeatureRunner::new(
            suite(vec![test_def(
                "pull_lever",
                vec![Step::Interact {
                    target_group: Some("lever".to_string()),
                    duration: 0.2,
                }],
                ValidationSpec::default(),
            )]),
            ExecutorSettings::default(),
        );
        drive(&mut world, &mut runner, DT);

        let result = &runner.results()[0];
        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.events.is_empty());
        assert!(result.issues[0].starts_with("step 1 (interact): no interactable 'lever'"), "{:?}", result.issues);
        assert!(result.steps[0].note.is_some());
    }

    #[test]
    fn test_call_method_runs_once() {
        let (world, runner) = run(vec![test_def(
            "activate_lever",
            vec![Step::CallMethod {
                path: "/root/Main/Lever".to_string(),
                method: "activate".to_string(),
                args: Vec::new(),
                duration: 0.5,
            }],
            ValidationSpec::default(),
        )]);

        assert_eq!(runner.results()[0].events.len(), 1);
        let lever = runner.registry().by_path("/root/Main/Lever").unwrap();
        assert_eq!(
            world.get::<Properties>(lever).unwrap().get_f64("activation_count"),
            Some(1.0)
        );
    }

    #[test]
    fn test_zero_duration_set_applies() {
        let (_, runner) = run(vec![test_def(
            "force_open",
            vec![
                Step::CallMethod {
                    path: "/root/Main/Door".to_string(),
                    method: "set".to_string(),
                    args: vec![json!("is_open"), json!(true)],
                    duration: 0.0,
                },
                Step::wait(0.1),
            ],
            serde_json::from_value(json!({
                "state_check": {
                    "property_equals": { "path": "/root/Main/Door", "property": "is_open", "value": true }
                }
            }))
            .unwrap(),
        )]);
        assert!(runner.results()[0].passed(), "{:?}", runner.results()[0].issues);
    }

    #[test]
    fn test_unknown_method_is_reported() {
        let (_, runner) = run(vec![test_def(
            "explode_door",
            vec![Step::CallMethod {
                path: "/root/Main/Door".to_string(),
                method: "explode".to_string(),
                args: Vec::new(),
                duration: 0.1,
            }],
            ValidationSpec::default(),
        )]);
        let result = &runner.results()[0];
        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.issues[0].contains("unknown method 'explode'"));
    }

    #[test]
    fn test_move_to_missing_group_degrades() {
        let (_, runner) = run(vec![test_def(
            "approach_enemy",
            vec![Step::MoveTo {
                target: None,
                target_group: Some("enemy".to_string()),
                duration: 0.2,
            }],
            ValidationSpec::default(),
        )]);
        assert!(runner.results()[0].issues[0].contains("no live object in group 'enemy'"));
    }

    #[test]
    fn test_duration_accuracy_within_one_tick() {
        for dt in [DT, 0.1, 0.07] {
            let mut world = World::new();
            spawn_scene(&mut world, &scene());
            let steps = vec![Step::wait(0.5), Step::input(&[ACTION_JUMP], 0.25), Step::wait(1.0)];
            let mut runner = FeatureRunner::new(
                suite(vec![test_def("timed", steps, Default::default())]),
                ExecutorSettings::default(),
            );
            drive(&mut world, &mut runner, dt);

            let duration = runner.results()[0].metrics.duration;
            assert!(
                (duration - 1.75).abs() <= dt + 1e-3,
                "dt {}: ran {} instead of 1.75",
                dt,
                duration
            );
        }
    }

    #[test]
    fn test_indices_advance_monotonically() {
        let mut world = World::new();
        spawn_scene(&mut world, &scene());
        let mut runner = FeatureRunner::new(TestSuite::default_movement(), ExecutorSettings::default());

        let mut last = (0, 0);
        while !runner.is_finalized() {
            runner.tick(&mut world, DT);
            let current = (runner.current_test_index(), runner.current_step_index());
            assert!(current >= last, "went from {:?} to {:?}", last, current);
            last = current;
        }
        assert_eq!(runner.results().len(), 6);
    }

    #[test]
    fn test_inputs_published_and_released() {
        let mut world = World::new();
        spawn_scene(&mut world, &scene());
        let mut runner = FeatureRunner::new(
            suite(vec![test_def(
                "hold_forward",
                vec![Step::input(&[ACTION_MOVE_FORWARD], 0.5)],
                Default::default(),
            )]),
            ExecutorSettings::default(),
        );

        for _ in 0..10 {
            runner.tick(&mut world, DT);
        }
        let published = &world.resource::<crate::input::SimulatedInput>().0;
        assert!(published.is_pressed(ACTION_MOVE_FORWARD));
        assert_eq!(published, runner.input());

        drive(&mut world, &mut runner, DT);
        assert!(world.resource::<crate::input::SimulatedInput>().0.is_empty());
    }

    #[test]
    fn test_steering_actions() {
        let forward = Vec3::NEG_Z;
        let right = Vec3::X;
        let steer = |destination: Vec3| {
            steering_actions(Vec3::ZERO, forward, right, destination, 2.0, 0.3)
        };

        assert_eq!(steer(Vec3::new(0.0, 0.0, -10.0)), vec![ACTION_MOVE_FORWARD]);
        assert_eq!(steer(Vec3::new(0.0, 0.0, 10.0)), vec![ACTION_MOVE_BACKWARD]);
        assert_eq!(
            steer(Vec3::new(5.0, 3.0, 5.0)),
            vec![ACTION_MOVE_BACKWARD, ACTION_MOVE_RIGHT]
        );
        assert_eq!(steer(Vec3::new(-10.0, 0.0, -1.0)), vec![ACTION_MOVE_LEFT]);
        assert!(steer(Vec3::new(1.0, 50.0, 1.0)).is_empty());
    }
}
