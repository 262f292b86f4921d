//! Input module - the executor's pressed-action set and its published resource

use bevy::prelude::*;
use std::collections::BTreeSet;

use crate::constants::SIMULATED_ACTIONS;

/// Set of currently asserted input actions.
///
/// Owned by the executor; pressing an action that is already pressed is a no-op,
/// so re-applying a step every frame leaves the same set behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pressed: BTreeSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: &str) {
        if !self.pressed.contains(action) {
            self.pressed.insert(action.to_string());
        }
    }

    /// Release every simulated action, plus any non-standard action a test pressed
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    /// Pressed actions outside `SIMULATED_ACTIONS` (ignored by the movement simulation)
    pub fn unknown_actions(&self) -> Vec<&str> {
        self.pressed()
            .filter(|action| !SIMULATED_ACTIONS.contains(action))
            .collect()
    }

    /// Release everything, then press exactly `actions`
    pub fn set_only<S: AsRef<str>>(&mut self, actions: &[S]) {
        self.release_all();
        for action in actions {
            self.press(action.as_ref());
        }
    }

    pub fn is_pressed(&self, action: &str) -> bool {
        self.pressed.contains(action)
    }

    pub fn pressed(&self) -> impl Iterator<Item = &str> {
        self.pressed.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    /// -1.0, 0.0 or 1.0 from a negative/positive action pair
    pub fn axis(&self, negative: &str, positive: &str) -> f32 {
        let mut value = 0.0;
        if self.is_pressed(negative) {
            value -= 1.0;
        }
        if self.is_pressed(positive) {
            value += 1.0;
        }
        value
    }
}

/// Snapshot of the executor's input state read by the movement simulation
#[derive(Resource, Debug, Clone, Default)]
pub struct SimulatedInput(pub InputState);

/// Copy `input` into the world's `SimulatedInput`, inserting it if needed
pub fn publish_input(world: &mut World, input: &InputState) {
    if let Some(mut published) = world.get_resource_mut::<SimulatedInput>() {
        if published.0 != *input {
            published.0.clone_from(input);
        }
    } else {
        world.insert_resource(SimulatedInput(input.clone()));
    }
}
