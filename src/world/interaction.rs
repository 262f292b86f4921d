//! Capability dispatch - what happens when a step acts on a scene object

use bevy::prelude::*;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::constants::DAMAGE_PER_HIT;
use crate::player::Inventory;

use super::{Capabilities, Capability, NodePath, Properties, SceneObject};

/// Observable result of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Toggled { property: String, value: bool },
    /// Interactable gated on an item the actor does not hold
    Locked { requires: String },
    Collected { item: String },
    Damaged { health: f64, destroyed: bool },
    Activated { count: u64 },
    PropertySet { property: String, value: Value },
}

impl fmt::Display for InteractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionOutcome::Toggled { property, value } => write!(f, "{} -> {}", property, value),
            InteractionOutcome::Locked { requires } => write!(f, "locked (requires '{}')", requires),
            InteractionOutcome::Collected { item } => write!(f, "collected '{}'", item),
            InteractionOutcome::Damaged { health, destroyed } => {
                if *destroyed {
                    write!(f, "destroyed")
                } else {
                    write!(f, "health {}", health)
                }
            }
            InteractionOutcome::Activated { count } => write!(f, "activated ({})", count),
            InteractionOutcome::PropertySet { property, value } => write!(f, "{} = {}", property, value),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InteractionError {
    #[error("object no longer exists")]
    Missing,
    #[error("object does not support '{0}'")]
    Unsupported(Capability),
    #[error("'{0}' needs a player to act on it")]
    NeedsActor(Capability),
    #[error("invalid arguments for '{method}': {reason}")]
    BadArguments { method: String, reason: String },
}

/// Invoke `capability` on `target`.
///
/// `actor` is only consulted for capabilities whose `accepts_actor` is true;
/// callers pass the player in that case and `None` otherwise.
pub fn invoke_capability(
    world: &mut World,
    target: Entity,
    capability: Capability,
    actor: Option<Entity>,
    args: &[Value],
) -> Result<InteractionOutcome, InteractionError> {
    if world.get::<SceneObject>(target).is_none() {
        return Err(InteractionError::Missing);
    }
    let supported = world
        .get::<Capabilities>(target)
        .is_some_and(|caps| caps.0.contains(&capability));
    if !supported {
        return Err(InteractionError::Unsupported(capability));
    }

    match capability {
        Capability::Interactable => interact(world, target, actor),
        Capability::Pickupable => pickup(world, target, actor),
        Capability::Damageable => damage(world, target, args),
        Capability::Activatable => activate(world, target),
    }
}

/// `set [property, value]` - direct state mutation for test setup
pub fn set_property(
    world: &mut World,
    target: Entity,
    args: &[Value],
) -> Result<InteractionOutcome, InteractionError> {
    let (Some(name), Some(value)) = (args.first().and_then(Value::as_str), args.get(1)) else {
        return Err(InteractionError::BadArguments {
            method: "set".to_string(),
            reason: "expected [property, value]".to_string(),
        });
    };
    let mut props = properties_mut(world, target)?;
    props.set(name, value.clone());
    Ok(InteractionOutcome::PropertySet {
        property: name.to_string(),
        value: value.clone(),
    })
}

fn interact(
    world: &mut World,
    target: Entity,
    actor: Option<Entity>,
) -> Result<InteractionOutcome, InteractionError> {
    let (toggle, requires) = {
        let props = world.get::<Properties>(target);
        (
            props
                .and_then(|p| p.get_str("toggle"))
                .unwrap_or("is_open")
                .to_string(),
            props
                .and_then(|p| p.get_str("requires_item"))
                .map(str::to_string),
        )
    };

    if let Some(requires) = requires {
        let holds_item = actor
            .and_then(|a| world.get::<Inventory>(a))
            .is_some_and(|inv| inv.contains(&requires));
        if !holds_item {
            return Ok(InteractionOutcome::Locked { requires });
        }
    }

    let mut props = properties_mut(world, target)?;
    let value = !props.get_bool(&toggle).unwrap_or(false);
    props.set(&toggle, Value::Bool(value));
    let count = props.get_f64("interact_count").unwrap_or(0.0) as u64 + 1;
    props.set("interact_count", Value::from(count));

    Ok(InteractionOutcome::Toggled {
        property: toggle,
        value,
    })
}

fn pickup(
    world: &mut World,
    target: Entity,
    actor: Option<Entity>,
) -> Result<InteractionOutcome, InteractionError> {
    let actor = actor.ok_or(InteractionError::NeedsActor(Capability::Pickupable))?;

    let item = world
        .get::<Properties>(target)
        .and_then(|p| p.get_str("item"))
        .map(str::to_string)
        .or_else(|| {
            world
                .get::<NodePath>(target)
                .and_then(|p| p.0.rsplit('/').next().map(str::to_lowercase))
        })
        .unwrap_or_else(|| "item".to_string());

    if let Some(mut inventory) = world.get_mut::<Inventory>(actor) {
        inventory.0.push(item.clone());
    } else if world.get::<SceneObject>(actor).is_some() {
        world.entity_mut(actor).insert(Inventory(vec![item.clone()]));
    } else {
        return Err(InteractionError::NeedsActor(Capability::Pickupable));
    }

    world.despawn(target);
    Ok(InteractionOutcome::Collected { item })
}

fn damage(
    world: &mut World,
    target: Entity,
    args: &[Value],
) -> Result<InteractionOutcome, InteractionError> {
    let amount = match args.first() {
        Some(arg) => arg.as_f64().ok_or_else(|| InteractionError::BadArguments {
            method: "damage".to_string(),
            reason: format!("amount must be a number, got {}", arg),
        })?,
        None => world
            .get::<Properties>(target)
            .and_then(|p| p.get_f64("damage_per_hit"))
            .unwrap_or(DAMAGE_PER_HIT),
    };

    let health = {
        let mut props = properties_mut(world, target)?;
        let health = props.get_f64("health").unwrap_or(1.0) - amount;
        props.set("health", Value::from(health));
        health
    };

    let destroyed = health <= 0.0;
    if destroyed {
        world.despawn(target);
    }
    Ok(InteractionOutcome::Damaged { health, destroyed })
}

fn activate(world: &mut World, target: Entity) -> Result<InteractionOutcome, InteractionError> {
    let mut props = properties_mut(world, target)?;
    props.set("active", Value::Bool(true));
    let count = props.get_f64("activation_count").unwrap_or(0.0) as u64 + 1;
    props.set("activation_count", Value::from(count));
    Ok(InteractionOutcome::Activated { count })
}

fn properties_mut(world: &mut World, target: Entity) -> Result<Mut<'_, Properties>, InteractionError> {
    if world.get::<SceneObject>(target).is_none() {
        return Err(InteractionError::Missing);
    }
    if world.get::<Properties>(target).is_none() {
        world.entity_mut(target).insert(Properties::default());
    }
    world
        .get_mut::<Properties>(target)
        .ok_or(InteractionError::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Groups;
    use serde_json::json;

    fn spawn_object(world: &mut World, path: &str, caps: &[Capability], props: Value) -> Entity {
        let props = match props {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        world
            .spawn((
                NodePath(path.to_string()),
                Groups::default(),
                Capabilities(caps.to_vec()),
                Properties(props),
            ))
            .id()
    }

    fn spawn_actor(world: &mut World) -> Entity {
        world
            .spawn((NodePath("/root/Main/Player".to_string()), Inventory::default()))
            .id()
    }

    #[test]
    fn test_interact_toggles_door() {
        let mut world = World::new();
        let door = spawn_object(&mut world, "/root/Main/Door", &[Capability::Interactable], json!({"is_open": false}));

        let outcome = invoke_capability(&mut world, door, Capability::Interactable, None, &[]).unwrap();
        assert_eq!(
            outcome,
            InteractionOutcome::Toggled {
                property: "is_open".to_string(),
                value: true
            }
        );
        assert_eq!(world.get::<Properties>(door).unwrap().get_bool("is_open"), Some(true));
    }

    #[test]
    fn test_locked_door_needs_item() {
        let mut world = World::new();
        let door = spawn_object(
            &mut world,
            "/root/Main/Door",
            &[Capability::Interactable],
            json!({"is_open": false, "requires_item": "key"}),
        );
        let player = spawn_actor(&mut world);

        let outcome = invoke_capability(&mut world, door, Capability::Interactable, Some(player), &[]).unwrap();
        assert_eq!(outcome, InteractionOutcome::Locked { requires: "key".to_string() });

        world.get_mut::<Inventory>(player).unwrap().0.push("key".to_string());
        invoke_capability(&mut world, door, Capability::Interactable, Some(player), &[]).unwrap();
        assert_eq!(world.get::<Properties>(door).unwrap().get_bool("is_open"), Some(true));
    }

    #[test]
    fn test_pickup_moves_item_and_despawns() {
        let mut world = World::new();
        let key = spawn_object(&mut world, "/root/Main/Key", &[Capability::Pickupable], json!({"item": "key"}));
        let player = spawn_actor(&mut world);

        let outcome = invoke_capability(&mut world, key, Capability::Pickupable, Some(player), &[]).unwrap();
        assert_eq!(outcome, InteractionOutcome::Collected { item: "key".to_string() });
        assert!(world.get::<Inventory>(player).unwrap().contains("key"));
        assert!(world.get::<SceneObject>(key).is_none());

        let again = invoke_capability(&mut world, key, Capability::Pickupable, Some(player), &[]);
        assert_eq!(again, Err(InteractionError::Missing));
    }

    #[test]
    fn test_pickup_without_actor_fails() {
        let mut world = World::new();
        let coin = spawn_object(&mut world, "/root/Main/Coin", &[Capability::Pickupable], json!({}));
        let result = invoke_capability(&mut world, coin, Capability::Pickupable, None, &[]);
        assert_eq!(result, Err(InteractionError::NeedsActor(Capability::Pickupable)));
    }

    #[test]
    fn test_damage_destroys_at_zero() {
        let mut world = World::new();
        let crate_entity = spawn_object(&mut world, "/root/Main/Crate", &[Capability::Damageable], json!({"health": 2}));

        let first = invoke_capability(&mut world, crate_entity, Capability::Damageable, None, &[]).unwrap();
        assert_eq!(first, InteractionOutcome::Damaged { health: 1.0, destroyed: false });

        let second = invoke_capability(&mut world, crate_entity, Capability::Damageable, None, &[json!(5)]).unwrap();
        assert_eq!(second, InteractionOutcome::Damaged { health: -4.0, destroyed: true });
        assert!(world.get::<SceneObject>(crate_entity).is_none());
    }

    #[test]
    fn test_unsupported_capability() {
        let mut world = World::new();
        let lever = spawn_object(&mut world, "/root/Main/Lever", &[Capability::Activatable], json!({}));
        let result = invoke_capability(&mut world, lever, Capability::Pickupable, None, &[]);
        assert_eq!(result, Err(InteractionError::Unsupported(Capability::Pickupable)));

        let outcome = invoke_capability(&mut world, lever, Capability::Activatable, None, &[]).unwrap();
        assert_eq!(outcome, InteractionOutcome::Activated { count: 1 });
    }

    #[test]
    fn test_set_property() {
        let mut world = World::new();
        let door = spawn_object(&mut world, "/root/Main/Door", &[], json!({}));
        set_property(&mut world, door, &[json!("is_open"), json!(true)]).unwrap();
        assert_eq!(world.get::<Properties>(door).unwrap().get_bool("is_open"), Some(true));

        let bad = set_property(&mut world, door, &[json!(3)]);
        assert!(matches!(bad, Err(InteractionError::BadArguments { .. })));
    }
}
