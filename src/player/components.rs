//! Player-related components

use bevy::prelude::*;

/// Marker for the player entity driven by the executor
#[derive(Component)]
pub struct Player;

/// 3D velocity vector (units per second)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec3);

/// Whether player is on the floor
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Grounded(pub bool);

/// Items the player has collected, in pickup order
#[derive(Component, Debug, Clone, Default)]
pub struct Inventory(pub Vec<String>);

impl Inventory {
    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|held| held == item)
    }
}
