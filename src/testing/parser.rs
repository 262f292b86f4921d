//! Test document parsing (JSON or TOML) and the default movement suite

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::RunnerError;

/// Complete test document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
}

/// One named test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_test_type")]
    pub test_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub validate: ValidationSpec,
}

fn default_test_type() -> String {
    "movement".to_string()
}

/// One timed instruction within a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Wait {
        #[serde(default)]
        duration: f32,
    },
    Input {
        #[serde(default)]
        inputs: Vec<String>,
        #[serde(default)]
        duration: f32,
    },
    MoveTo {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<[f32; 3]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_group: Option<String>,
        #[serde(default)]
        duration: f32,
    },
    Interact {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_group: Option<String>,
        #[serde(default)]
        duration: f32,
    },
    /// Releases inputs while running; the condition is checked with the test's validation
    WaitFor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<StateCheck>,
        #[serde(default)]
        duration: f32,
    },
    CallMethod {
        path: String,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        duration: f32,
    },
}

impl Step {
    pub fn duration(&self) -> f32 {
        match self {
            Step::Wait { duration }
            | Step::Input { duration, .. }
            | Step::MoveTo { duration, .. }
            | Step::Interact { duration, .. }
            | Step::WaitFor { duration, .. }
            | Step::CallMethod { duration, .. } => *duration,
        }
    }

    /// Action name as written in test documents
    pub fn action(&self) -> &'static str {
        match self {
            Step::Wait { .. } => "wait",
            Step::Input { .. } => "input",
            Step::MoveTo { .. } => "move_to",
            Step::Interact { .. } => "interact",
            Step::WaitFor { .. } => "wait_for",
            Step::CallMethod { .. } => "call_method",
        }
    }

    pub fn wait(duration: f32) -> Self {
        Step::Wait { duration }
    }

    pub fn input(inputs: &[&str], duration: f32) -> Self {
        Step::Input {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            duration,
        }
    }
}

/// Post-test assertions. Every present predicate is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_floor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<[f32; 3]>,
    /// Tolerance for target_position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near_group: Option<String>,
    /// Distance for near_group (the configured margin is added on top)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_in_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_in_group_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_check: Option<StateCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload_exists: Option<String>,
}

impl ValidationSpec {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Scene state predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateCheck {
    /// Path of an object that must exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_exists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_equals: Option<PropertyEquals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_group: Option<GroupMembership>,
    /// Item that must be in the player's inventory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEquals {
    pub path: String,
    pub property: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub path: String,
    pub group: String,
}

impl TestSuite {
    /// Built-in movement suite used when no usable test document exists
    pub fn default_movement() -> Self {
        let movement = |name: &str, description: &str, action: &str, duration: f32| TestDefinition {
            name: name.to_string(),
            test_type: "movement".to_string(),
            description: description.to_string(),
            duration,
            steps: vec![Step::input(&[action], duration)],
            validate: ValidationSpec {
                min_distance: Some(0.5),
                ..Default::default()
            },
        };

        Self {
            feature: Some("basic_movement".to_string()),
            tests: vec![
                TestDefinition {
                    name: "initial_position".to_string(),
                    test_type: "state".to_string(),
                    description: "Capture starting position".to_string(),
                    duration: 2.0,
                    steps: vec![Step::wait(2.0)],
                    validate: ValidationSpec::default(),
                },
                movement("move_forward", "Walk forward", ACTION_MOVE_FORWARD, 3.0),
                movement("move_backward", "Walk backward", ACTION_MOVE_BACKWARD, 3.0),
                movement("move_left", "Strafe left", ACTION_MOVE_LEFT, 2.0),
                movement("move_right", "Strafe right", ACTION_MOVE_RIGHT, 2.0),
                TestDefinition {
                    name: "jump".to_string(),
                    test_type: "movement".to_string(),
                    description: "Test jump".to_string(),
                    duration: 2.0,
                    steps: vec![Step::input(&[ACTION_JUMP], 2.0)],
                    validate: ValidationSpec {
                        left_floor: Some(true),
                        ..Default::default()
                    },
                },
            ],
        }
    }

    /// Look up a test by name; with duplicate names the last one wins
    pub fn find(&self, name: &str) -> Option<&TestDefinition> {
        self.tests.iter().rev().find(|t| t.name == name)
    }

    /// Give step-less tests a single wait of their declared duration and fill in
    /// missing test durations from their steps
    pub fn normalize(&mut self) {
        for test in &mut self.tests {
            if test.steps.is_empty() && test.duration > 0.0 {
                test.steps.push(Step::wait(test.duration));
            }
            if test.duration <= 0.0 {
                test.duration = test.steps.iter().map(Step::duration).sum();
            }
        }
    }

    /// Sum of all step durations in the suite (simulated seconds)
    pub fn total_step_duration(&self) -> f32 {
        self.tests
            .iter()
            .flat_map(|t| t.steps.iter())
            .map(Step::duration)
            .sum()
    }
}

/// Where a loaded suite came from
#[derive(Debug, Clone, PartialEq)]
pub enum SuiteSource {
    File(PathBuf),
    Defaults { reason: String },
}

/// Suite plus its provenance
#[derive(Debug, Clone)]
pub struct LoadedSuite {
    pub suite: TestSuite,
    pub source: SuiteSource,
}

/// Parse a test document, choosing the format from the file extension
pub fn parse_suite_file(path: &Path) -> Result<TestSuite, RunnerError> {
    let content = fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;

    let mut suite: TestSuite = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|source| RunnerError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| RunnerError::json(path, e))?
    };

    if suite.tests.is_empty() {
        return Err(RunnerError::EmptySuite {
            path: path.to_path_buf(),
        });
    }
    suite.normalize();
    Ok(suite)
}

/// Find `tests.json` (preferred) or `tests.toml` in a build directory
pub fn find_suite_file(build_dir: &Path) -> Option<PathBuf> {
    [TESTS_FILE_JSON, TESTS_FILE_TOML]
        .iter()
        .map(|name| build_dir.join(name))
        .find(|path| path.is_file())
}

/// Load a suite, falling back to the default movement suite on any error
pub fn load_suite(path: Option<&Path>) -> LoadedSuite {
    let Some(path) = path else {
        info!("No test document found, using default movement suite");
        return LoadedSuite {
            suite: TestSuite::default_movement(),
            source: SuiteSource::Defaults {
                reason: "no test document".to_string(),
            },
        };
    };

    match parse_suite_file(path) {
        Ok(suite) => {
            info!("Loaded {} tests from {}", suite.tests.len(), path.display());
            LoadedSuite {
                suite,
                source: SuiteSource::File(path.to_path_buf()),
            }
        }
        Err(e) => {
            warn!("Test loader error: {}, using default movement suite", e);
            LoadedSuite {
                suite: TestSuite::default_movement(),
                source: SuiteSource::Defaults {
                    reason: e.to_string(),
                },
            }
        }
    }
}
