//! Scene-side components: addressable objects, their groups, capabilities and properties

use bevy::prelude::*;
use serde_json::{Map, Value};

mod capability;
mod interaction;
mod scene;

pub use capability::Capability;
pub use interaction::{InteractionError, InteractionOutcome, invoke_capability, set_property};
pub use scene::{ObjectDef, PlayerDef, SceneDescription, spawn_scene};

/// Marker for every entity spawned from a scene description (player included)
#[derive(Component, Default)]
pub struct SceneObject;

/// Absolute path of a scene object, e.g. `/root/Main/Door`
#[derive(Component, Debug, Clone)]
#[require(SceneObject)]
pub struct NodePath(pub String);

/// Semantic group membership ("door", "pickup", ...)
#[derive(Component, Debug, Clone, Default)]
pub struct Groups(pub Vec<String>);

impl Groups {
    pub fn contains(&self, group: &str) -> bool {
        self.0.iter().any(|g| g == group)
    }
}

/// Interaction capabilities an object exposes
#[derive(Component, Debug, Clone, Default)]
pub struct Capabilities(pub Vec<Capability>);

/// Free-form object state ("is_open", "health", "item", ...)
#[derive(Component, Debug, Clone, Default)]
pub struct Properties(pub Map<String, Value>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }
}

/// Height of the flat floor the movement simulation collides with
#[derive(Resource, Debug, Clone, Copy)]
pub struct FloorHeight(pub f32);

/// Named scene singletons (the equivalent of engine autoloads)
#[derive(Resource, Debug, Clone, Default)]
pub struct Autoloads(pub Vec<String>);
