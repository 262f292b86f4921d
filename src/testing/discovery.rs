//! Scene object discovery
//!
//! Walks the scene once after it settles and builds an index from category
//! (semantic group or capability tag) to entities. The executor and validator
//! only ever query this registry; they never re-scan the world.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::player::Player;
use crate::world::{Capabilities, Capability, Groups, NodePath, SceneObject};

/// Semantic groups generated features commonly use
pub const KNOWN_GROUPS: [&str; 16] = [
    "door",
    "pickup",
    "collectible",
    "key",
    "enemy",
    "npc",
    "interactable",
    "switch",
    "lever",
    "button",
    "chest",
    "item",
    "weapon",
    "vehicle",
    "checkpoint",
    "goal",
];

/// A scene entity and the categories it was found under
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredObject {
    pub entity: Entity,
    pub path: String,
    pub categories: Vec<String>,
}

/// One-time index of the scene, built by `discover`
#[derive(Resource, Debug, Clone, Default)]
pub struct DiscoveryRegistry {
    pub player: Option<Entity>,
    categories: HashMap<String, Vec<Entity>>,
    paths: HashMap<String, Entity>,
    capabilities: HashMap<Entity, Vec<Capability>>,
    objects: Vec<DiscoveredObject>,
}

impl DiscoveryRegistry {
    /// Members of a group or capability tag, in discovery order (may include despawned entities)
    pub fn category(&self, name: &str) -> &[Entity] {
        self.categories.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Members of a category that still exist in `world`
    pub fn live_members(&self, world: &World, name: &str) -> Vec<Entity> {
        self.category(name)
            .iter()
            .copied()
            .filter(|&e| is_live(world, e))
            .collect()
    }

    pub fn by_path(&self, path: &str) -> Option<Entity> {
        self.paths.get(path).copied()
    }

    pub fn capabilities_of(&self, entity: Entity) -> &[Capability] {
        self.capabilities
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First capability an `interact` step would use on this entity
    pub fn interaction_capability(&self, entity: Entity) -> Option<Capability> {
        let caps = self.capabilities_of(entity);
        Capability::INTERACTION_PRIORITY
            .into_iter()
            .find(|c| caps.contains(c))
    }

    /// Entities carrying any interaction capability (the `interact` fallback set)
    pub fn interaction_fallback(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();
        for capability in Capability::INTERACTION_PRIORITY {
            for &entity in self.category(capability.tag()) {
                if !entities.contains(&entity) {
                    entities.push(entity);
                }
            }
        }
        entities
    }

    pub fn path_of(&self, entity: Entity) -> Option<&str> {
        self.objects
            .iter()
            .find(|o| o.entity == entity)
            .map(|o| o.path.as_str())
    }

    pub fn objects(&self) -> &[DiscoveredObject] {
        &self.objects
    }

    /// Category name → member count, sorted by name (for logs and reports)
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<_> = self
            .categories
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(name, members)| (name.clone(), members.len()))
            .collect();
        counts.sort();
        counts
    }
}

/// True while the entity has not been despawned
pub fn is_live(world: &World, entity: Entity) -> bool {
    world.get::<SceneObject>(entity).is_some()
}

/// Build the registry with a single pass over scene objects
pub fn discover(world: &mut World) -> DiscoveryRegistry {
    let mut registry = DiscoveryRegistry::default();
    let mut by_group: HashMap<String, Vec<Entity>> = HashMap::new();
    let mut tagged_player: Option<Entity> = None;

    let mut query = world.query_filtered::<(
        Entity,
        Option<&NodePath>,
        Option<&Groups>,
        Option<&Capabilities>,
        Has<Player>,
    ), With<SceneObject>>();

    for (entity, path, groups, capabilities, is_player) in query.iter(world) {
        let path = path
            .map(|p| p.0.clone())
            .unwrap_or_else(|| format!("{:?}", entity));
        let mut categories = Vec::new();

        if is_player && registry.player.is_none() {
            registry.player = Some(entity);
        }

        if let Some(groups) = groups {
            for group in &groups.0 {
                by_group.entry(group.clone()).or_default().push(entity);
                categories.push(group.clone());
                if group == "player" && tagged_player.is_none() {
                    tagged_player = Some(entity);
                }
            }
        }

        if let Some(capabilities) = capabilities {
            let mut caps = capabilities.0.clone();
            caps.sort();
            caps.dedup();
            for capability in &caps {
                registry
                    .categories
                    .entry(capability.tag().to_string())
                    .or_default()
                    .push(entity);
                categories.push(capability.tag().to_string());
            }
            registry.capabilities.insert(entity, caps);
        }

        debug!("  {} [{}]", path, categories.join(", "));
        registry.paths.insert(path.clone(), entity);
        registry.objects.push(DiscoveredObject {
            entity,
            path,
            categories,
        });
    }

    // Indexed lookup per known category; unknown groups are kept too so any
    // group a test names resolves
    for group in KNOWN_GROUPS {
        let members = by_group.remove(group).unwrap_or_default();
        registry.categories.insert(group.to_string(), members);
    }
    registry.categories.extend(by_group);

    if registry.player.is_none() {
        registry.player = tagged_player;
    }

    match registry.player {
        Some(player) => info!(
            "Discovered {} scene objects, player at {}",
            registry.objects.len(),
            registry.path_of(player).unwrap_or("?")
        ),
        None => warn!(
            "Discovered {} scene objects, no player node found",
            registry.objects.len()
        ),
    }
    for (category, count) in registry.category_counts() {
        debug!("  {}: {}", category, count);
    }

    registry
}
