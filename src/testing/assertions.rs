//! Post-test validation against telemetry and scene state

use bevy::prelude::*;
use serde_json::Value;

use crate::config::ExecutorSettings;
use crate::constants::*;
use crate::helpers::vec3_from_array;
use crate::player::Inventory;
use crate::world::{Autoloads, Groups, Properties};

use super::discovery::{DiscoveryRegistry, is_live};
use super::executor::RunState;
use super::parser::{GroupMembership, PropertyEquals, StateCheck, Step, ValidationSpec};

/// Outcome of validating one test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub passed: bool,
    pub issues: Vec<String>,
}

/// What the validator may read besides the test's own telemetry
pub struct ValidationContext<'a> {
    pub world: &'a World,
    pub registry: &'a DiscoveryRegistry,
    pub settings: &'a ExecutorSettings,
}

/// Check every predicate present in `spec`, collecting all failures
pub fn validate(spec: &ValidationSpec, state: &RunState, ctx: &ValidationContext) -> Validation {
    let mut issues = Vec::new();

    if let Some(min) = spec.min_distance {
        if state.distance < min {
            issues.push(format!(
                "Player moved {:.2} units, expected at least {:.2}",
                state.distance, min
            ));
        }
    }

    if let Some(expected) = spec.left_floor {
        if expected && !state.left_floor {
            issues.push("Player never left the floor".to_string());
        } else if !expected && state.left_floor {
            issues.push("Player left the floor".to_string());
        }
    }

    if let Some(target) = spec.target_position {
        let tolerance = spec.tolerance.unwrap_or(DEFAULT_TARGET_TOLERANCE);
        match state.last_position {
            Some(position) => {
                let distance = position.distance(vec3_from_array(target));
                if distance > tolerance {
                    issues.push(format!(
                        "Final position {:?} is {:.2} units from target {:?} (tolerance {:.2})",
                        position.to_array(),
                        distance,
                        target,
                        tolerance
                    ));
                }
            }
            None => issues.push("No player position to compare with target".to_string()),
        }
    }

    if let Some(group) = &spec.near_group {
        let max_distance = spec.max_distance.unwrap_or(DEFAULT_NEAR_GROUP_DISTANCE);
        if let Some(issue) = check_near_group(group, max_distance, state, ctx) {
            issues.push(issue);
        }
    }

    for group in [&spec.object_in_group, &spec.object_in_group_2].into_iter().flatten() {
        if ctx.registry.live_members(ctx.world, group).is_empty() {
            issues.push(format!("No objects found in group '{}'", group));
        }
    }

    if let Some(check) = &spec.state_check {
        check_state(check, ctx, &mut issues);
    }

    if let Some(name) = &spec.autoload_exists {
        let registered = ctx
            .world
            .get_resource::<Autoloads>()
            .is_some_and(|a| a.0.iter().any(|n| n == name));
        if !registered {
            issues.push(format!("Autoload '{}' is not registered", name));
        }
    }

    Validation {
        passed: issues.is_empty(),
        issues,
    }
}

/// Check the conditions of a test's `wait_for` steps, labelled by step
pub fn check_wait_conditions(steps: &[Step], ctx: &ValidationContext) -> Vec<String> {
    let mut issues = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        let Step::WaitFor {
            condition: Some(check),
            ..
        } = step
        else {
            continue;
        };
        let mut step_issues = Vec::new();
        check_state(check, ctx, &mut step_issues);
        issues.extend(
            step_issues
                .into_iter()
                .map(|issue| format!("step {} ({}): {}", index + 1, step.action(), issue)),
        );
    }
    issues
}

fn check_near_group(
    group: &str,
    max_distance: f32,
    state: &RunState,
    ctx: &ValidationContext,
) -> Option<String> {
    let Some(position) = state.last_position else {
        return Some(format!("No player position to compare with group '{}'", group));
    };

    let nearest = ctx
        .registry
        .live_members(ctx.world, group)
        .into_iter()
        .filter_map(|e| ctx.world.get::<Transform>(e))
        .map(|t| t.translation.distance(position))
        .fold(None, |best: Option<f32>, d| Some(best.map_or(d, |b| b.min(d))));

    let limit = max_distance + ctx.settings.near_group_margin;
    match nearest {
        None => Some(format!("No objects found in group '{}'", group)),
        Some(distance) if distance > limit => Some(format!(
            "Nearest '{}' is {:.2} units away, expected within {:.2}",
            group, distance, limit
        )),
        Some(_) => None,
    }
}

fn check_state(check: &StateCheck, ctx: &ValidationContext, issues: &mut Vec<String>) {
    if let Some(path) = &check.object_exists {
        if live_entity(ctx, path).is_none() {
            issues.push(format!("Object '{}' does not exist", path));
        }
    }

    if let Some(PropertyEquals { path, property, value }) = &check.property_equals {
        match live_entity(ctx, path) {
            None => issues.push(format!("Object '{}' does not exist", path)),
            Some(entity) => {
                let actual = ctx
                    .world
                    .get::<Properties>(entity)
                    .and_then(|p| p.get(property));
                match actual {
                    None => issues.push(format!("Object '{}' has no property '{}'", path, property)),
                    Some(actual) if !values_equal(actual, value) => issues.push(format!(
                        "{}.{} is {}, expected {}",
                        path, property, actual, value
                    )),
                    Some(_) => {}
                }
            }
        }
    }

    if let Some(GroupMembership { path, group }) = &check.in_group {
        let member = live_entity(ctx, path)
            .and_then(|e| ctx.world.get::<Groups>(e))
            .is_some_and(|g| g.contains(group));
        if !member {
            issues.push(format!("Object '{}' is not in group '{}'", path, group));
        }
    }

    if let Some(item) = &check.has_item {
        let held = ctx
            .registry
            .player
            .and_then(|p| ctx.world.get::<Inventory>(p))
            .is_some_and(|inv| inv.contains(item));
        if !held {
            issues.push(format!("Player does not have item '{}'", item));
        }
    }
}

fn live_entity(ctx: &ValidationContext, path: &str) -> Option<Entity> {
    ctx.registry
        .by_path(path)
        .filter(|&e| is_live(ctx.world, e))
}

/// Numbers compare with a small epsilon (1 == 1.0), everything else structurally
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() <= PROPERTY_FLOAT_EPSILON,
        _ => actual == expected,
    }
}
