//! Utility functions shared by the movement simulation, executor and validator

use bevy::prelude::*;

/// Move a vector toward a target by at most `max_delta` length
pub fn move_toward_vec(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let diff = target - current;
    let dist = diff.length();
    if dist <= max_delta || dist <= f32::EPSILON {
        target
    } else {
        current + diff / dist * max_delta
    }
}

/// Distance on the XZ plane, ignoring height
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Convert a `[x, y, z]` triple from a document into a vector
pub fn vec3_from_array(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// Round for reporting so result documents stay readable
pub fn round_to(value: f32, places: i32) -> f32 {
    let factor = 10f32.powi(places);
    (value * factor).round() / factor
}
