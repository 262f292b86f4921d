//! Scene description parsing and spawning
//!
//! A build directory carries a `scene.json` describing the player and the
//! objects the generated feature added. Unreadable scenes are logged and
//! replaced by an empty scene, which later surfaces as a `no_player` run.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::constants::DEFAULT_FLOOR_Y;
use crate::error::RunnerError;
use crate::helpers::vec3_from_array;
use crate::player::{Grounded, Inventory, Player, Velocity};

use super::{Autoloads, Capabilities, Capability, FloorHeight, Groups, NodePath, Properties};

/// Player spawn definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDef {
    #[serde(default = "default_player_path")]
    pub path: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation about +Y; 0 faces -Z
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub inventory: Vec<String>,
}

fn default_player_path() -> String {
    "/root/Main/Player".to_string()
}

impl Default for PlayerDef {
    fn default() -> Self {
        Self {
            path: default_player_path(),
            position: [0.0; 3],
            yaw_degrees: 0.0,
            inventory: Vec::new(),
        }
    }
}

/// Scene object definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub path: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Complete scene description from `scene.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_floor_y")]
    pub floor_y: f32,
    #[serde(default)]
    pub autoloads: Vec<String>,
    #[serde(default)]
    pub player: Option<PlayerDef>,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
}

fn default_floor_y() -> f32 {
    DEFAULT_FLOOR_Y
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            name: None,
            floor_y: DEFAULT_FLOOR_Y,
            autoloads: Vec::new(),
            player: None,
            objects: Vec::new(),
        }
    }
}

impl SceneDescription {
    /// Parse a scene file from path
    pub fn from_file(path: &Path) -> Result<Self, RunnerError> {
        let content = fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| RunnerError::json(path, e))
    }

    /// Load a scene, returning an empty scene on error
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(scene) => {
                info!(
                    "Loaded scene {} ({} objects, player: {})",
                    scene.name.as_deref().unwrap_or("<unnamed>"),
                    scene.objects.len(),
                    scene.player.is_some()
                );
                scene
            }
            Err(e) => {
                warn!("Failed to load scene: {}, using an empty scene", e);
                Self::default()
            }
        }
    }
}

/// Spawn the player and all objects into `world`. Returns the player entity, if any.
pub fn spawn_scene(world: &mut World, scene: &SceneDescription) -> Option<Entity> {
    world.insert_resource(FloorHeight(scene.floor_y));
    world.insert_resource(Autoloads(scene.autoloads.clone()));

    for object in &scene.objects {
        world.spawn((
            Transform::from_translation(vec3_from_array(object.position)),
            NodePath(object.path.clone()),
            Groups(object.groups.clone()),
            Capabilities(object.capabilities.clone()),
            Properties(object.properties.clone()),
        ));
    }

    scene.player.as_ref().map(|player| {
        let position = vec3_from_array(player.position);
        world
            .spawn((
                Transform::from_translation(position)
                    .with_rotation(Quat::from_rotation_y(player.yaw_degrees.to_radians())),
                Player,
                Velocity::default(),
                Grounded(position.y <= scene.floor_y),
                Inventory(player.inventory.clone()),
                NodePath(player.path.clone()),
                Groups(vec!["player".to_string()]),
            ))
            .id()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SceneObject;

    const DOOR_ROOM: &str = r#"{
        "name": "door_room",
        "autoloads": ["GameState"],
        "player": { "position": [0, 0, 0], "yaw_degrees": 90 },
        "objects": [
            { "path": "/root/Main/Door", "position": [0, 0, -8], "groups": ["door"],
              "capabilities": ["interactable"], "properties": { "is_open": false } },
            { "path": "/root/Main/Key", "position": [3, 0, 0], "groups": ["pickup"],
              "capabilities": ["pickupable"], "properties": { "item": "key" } }
        ]
    }"#;

    #[test]
    fn test_parse_scene() {
        let scene: SceneDescription = serde_json::from_str(DOOR_ROOM).unwrap();
        assert_eq!(scene.name.as_deref(), Some("door_room"));
        assert_eq!(scene.floor_y, DEFAULT_FLOOR_Y);
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[1].capabilities, vec![Capability::Pickupable]);
        assert_eq!(scene.player.as_ref().unwrap().path, "/root/Main/Player");
    }

    #[test]
    fn test_spawn_scene() {
        let scene: SceneDescription = serde_json::from_str(DOOR_ROOM).unwrap();
        let mut world = World::new();
        let player = spawn_scene(&mut world, &scene).unwrap();

        assert!(world.get::<Player>(player).is_some());
        assert!(world.get::<Grounded>(player).unwrap().0);
        let forward = *world.get::<Transform>(player).unwrap().forward();
        assert!((forward - Vec3::NEG_X).length() < 1e-4, "yaw 90 should face -X, got {:?}", forward);

        let mut objects = world.query::<&SceneObject>();
        assert_eq!(objects.iter(&world).count(), 3);
        assert_eq!(world.resource::<Autoloads>().0, vec!["GameState".to_string()]);
    }

    #[test]
    fn test_missing_scene_is_empty() {
        let scene = SceneDescription::load_or_empty(Path::new("no/such/scene.json"));
        assert_eq!(scene, SceneDescription::default());

        let mut world = World::new();
        assert!(spawn_scene(&mut world, &scene).is_none());
    }
}
