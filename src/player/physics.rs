//! Player movement simulation
//!
//! A small kinematic controller standing in for the game's own movement code:
//! published input → horizontal velocity in the player's local frame, gravity,
//! integration, and a flat floor.

use bevy::prelude::*;

use crate::config::MovementTuning;
use crate::constants::*;
use crate::helpers::move_toward_vec;
use crate::input::SimulatedInput;
use crate::player::components::*;
use crate::world::FloorHeight;

/// Runs first in the movement chain: turn pressed actions into velocity.
pub fn apply_input(
    tuning: Res<MovementTuning>,
    input: Option<Res<SimulatedInput>>,
    mut players: Query<(&Transform, &mut Velocity, &Grounded), With<Player>>,
    time: Res<Time>,
) {
    let Some(input) = input else {
        return;
    };
    let input = &input.0;

    for (transform, mut velocity, grounded) in &mut players {
        let forward_axis = input.axis(ACTION_MOVE_BACKWARD, ACTION_MOVE_FORWARD);
        let right_axis = input.axis(ACTION_MOVE_LEFT, ACTION_MOVE_RIGHT);

        let mut forward = *transform.forward();
        forward.y = 0.0;
        let mut right = *transform.right();
        right.y = 0.0;

        let wish = (forward.normalize_or_zero() * forward_axis
            + right.normalize_or_zero() * right_axis)
            .normalize_or_zero();

        let mut speed = tuning.move_speed;
        if input.is_pressed("sprint") {
            speed *= tuning.sprint_multiplier;
        }
        let target = wish * speed;

        let accel = if grounded.0 {
            tuning.ground_accel
        } else {
            tuning.air_accel
        };
        let horizontal = Vec3::new(velocity.0.x, 0.0, velocity.0.z);
        let next = move_toward_vec(horizontal, target, accel * time.delta_secs());
        velocity.0.x = next.x;
        velocity.0.z = next.z;

        // Holding jump re-jumps on every landing
        if grounded.0 && input.is_pressed(ACTION_JUMP) {
            velocity.0.y = tuning.jump_velocity;
        }
    }
}

/// Apply gravity to airborne players
pub fn apply_gravity(
    tuning: Res<MovementTuning>,
    mut query: Query<(&mut Velocity, &Grounded), With<Player>>,
    time: Res<Time>,
) {
    for (mut velocity, grounded) in &mut query {
        if !grounded.0 || velocity.0.y > 0.0 {
            velocity.0.y -= tuning.gravity * time.delta_secs();
        }
    }
}

/// Integrate velocity into position
pub fn apply_velocity(mut query: Query<(&mut Transform, &Velocity), With<Player>>, time: Res<Time>) {
    for (mut transform, velocity) in &mut query {
        transform.translation += velocity.0 * time.delta_secs();
    }
}

/// Clamp players to the floor and update the grounded flag
pub fn floor_contact(
    floor: Option<Res<FloorHeight>>,
    mut query: Query<(&mut Transform, &mut Velocity, &mut Grounded), With<Player>>,
) {
    let floor_y = floor.map(|f| f.0).unwrap_or(DEFAULT_FLOOR_Y);

    for (mut transform, mut velocity, mut grounded) in &mut query {
        if transform.translation.y <= floor_y && velocity.0.y <= 0.0 {
            transform.translation.y = floor_y;
            velocity.0.y = 0.0;
            grounded.0 = true;
        } else {
            grounded.0 = false;
        }
    }
}
