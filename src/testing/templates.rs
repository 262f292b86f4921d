//! Canned test documents for common feature types

use serde_json::json;

use crate::error::RunnerError;

use super::parser::TestSuite;

/// Feature types with a built-in template
pub const FEATURE_TEMPLATES: [&str; 4] = ["door", "pickup", "door_with_key", "movement"];

/// Test document for a feature type
pub fn template_for(feature: &str) -> Result<TestSuite, RunnerError> {
    let doc = match feature {
        "door" => json!({
            "feature": "door",
            "tests": [
                {
                    "name": "find_door",
                    "type": "discovery",
                    "description": "Verify door exists in scene",
                    "duration": 2.0,
                    "steps": [{ "action": "wait", "duration": 2.0 }],
                    "validate": { "object_in_group": "door" }
                },
                {
                    "name": "door_initially_closed",
                    "type": "state",
                    "description": "Door should start closed",
                    "duration": 1.0,
                    "steps": [{ "action": "wait", "duration": 1.0 }],
                    "validate": { "state_check": { "property_equals": door_open(false) } }
                },
                approach("approach_door", "Move player toward door", "door", 3.0),
                interact("open_door", "Interact with door to open it", "door",
                    json!({ "state_check": { "property_equals": door_open(true) } })),
            ]
        }),
        "pickup" => json!({
            "feature": "pickup",
            "tests": [
                {
                    "name": "find_item",
                    "type": "discovery",
                    "description": "Verify collectible exists",
                    "duration": 2.0,
                    "steps": [{ "action": "wait", "duration": 2.0 }],
                    "validate": { "object_in_group": "pickup" }
                },
                approach("approach_item", "Move toward item", "pickup", 2.0),
                interact("collect_item", "Pick up the item", "pickup",
                    json!({ "state_check": { "has_item": "key" } })),
            ]
        }),
        "door_with_key" => json!({
            "feature": "door_with_key",
            "tests": [
                {
                    "name": "initial_state",
                    "type": "state",
                    "description": "Verify initial game state",
                    "duration": 2.0,
                    "steps": [{ "action": "wait", "duration": 2.0 }],
                    "validate": { "object_in_group": "door", "object_in_group_2": "pickup" }
                },
                approach("find_key", "Move to key location", "pickup", 2.0),
                interact("pickup_key", "Collect the key", "pickup", json!({})),
                approach("approach_door", "Move to door", "door", 3.0),
                interact("unlock_door", "Use key to open door", "door",
                    json!({ "state_check": { "property_equals": door_open(true) } })),
            ]
        }),
        "movement" => json!({
            "feature": "basic_movement",
            "tests": [
                held("move_forward", "Test forward movement", "move_forward", 3.0, json!({ "min_distance": 0.5 })),
                held("move_backward", "Test backward movement", "move_backward", 3.0, json!({ "min_distance": 0.5 })),
                held("jump", "Test jump", "jump", 2.0, json!({ "left_floor": true })),
            ]
        }),
        other => return Err(RunnerError::UnknownFeature(other.to_string())),
    };

    let mut suite: TestSuite = serde_json::from_value(doc)
        .map_err(|e| RunnerError::json(format!("<{} template>", feature), e))?;
    suite.normalize();
    Ok(suite)
}

fn door_open(open: bool) -> serde_json::Value {
    json!({ "path": "/root/Main/Door", "property": "is_open", "value": open })
}

fn approach(name: &str, description: &str, group: &str, max_distance: f32) -> serde_json::Value {
    json!({
        "name": name,
        "type": "movement",
        "description": description,
        "duration": 5.0,
        "steps": [{ "action": "move_to", "target_group": group, "duration": 5.0 }],
        "validate": { "near_group": group, "max_distance": max_distance }
    })
}

fn interact(name: &str, description: &str, group: &str, validate: serde_json::Value) -> serde_json::Value {
    json!({
        "name": name,
        "type": "interaction",
        "description": description,
        "duration": 2.0,
        "steps": [
            { "action": "interact", "target_group": group, "duration": 0.5 },
            { "action": "wait", "duration": 1.5 }
        ],
        "validate": validate
    })
}

fn held(name: &str, description: &str, action: &str, duration: f32, validate: serde_json::Value) -> serde_json::Value {
    json!({
        "name": name,
        "type": "movement",
        "description": description,
        "duration": duration,
        "steps": [{ "action": "input", "inputs": [action], "duration": duration }],
        "validate": validate
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::parser::Step;

    #[test]
    fn test_every_template_parses() {
        for feature in FEATURE_TEMPLATES {
            let suite = template_for(feature).unwrap();
            assert!(!suite.tests.is_empty(), "{} has no tests", feature);
            for test in &suite.tests {
                assert!(!test.steps.is_empty(), "{}/{} has no steps", feature, test.name);
            }
        }
    }

    #[test]
    fn test_door_with_key_order() {
        let suite = template_for("door_with_key").unwrap();
        let names: Vec<_> = suite.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["initial_state", "find_key", "pickup_key", "approach_door", "unlock_door"]
        );
        assert!(suite.tests[2].validate.is_empty());
        assert_eq!(
            suite.tests[4].steps[0],
            Step::Interact {
                target_group: Some("door".to_string()),
                duration: 0.5
            }
        );
    }

    #[test]
    fn test_unknown_feature() {
        let err = template_for("spaceship").unwrap_err();
        assert!(matches!(err, RunnerError::UnknownFeature(ref f) if f == "spaceship"));
    }
}
