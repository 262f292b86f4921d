//! Player module - components and movement simulation systems

mod components;
mod physics;

pub use components::*;
pub use physics::*;
