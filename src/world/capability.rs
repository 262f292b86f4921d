//! Interaction capabilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a scene object can do when the player (or a test) acts on it.
///
/// Objects declare these explicitly; discovery indexes them under their tag so
/// nothing is probed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Toggles a boolean property (doors, levers), optionally gated on an inventory item
    Interactable,
    /// Moves an item into the actor's inventory and removes the object
    Pickupable,
    /// Loses health per hit, removed at zero
    Damageable,
    /// Switches on and counts activations
    Activatable,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Interactable,
        Capability::Pickupable,
        Capability::Damageable,
        Capability::Activatable,
    ];

    /// Order in which an `interact` step picks among an object's capabilities
    pub const INTERACTION_PRIORITY: [Capability; 3] = [
        Capability::Pickupable,
        Capability::Interactable,
        Capability::Activatable,
    ];

    /// Discovery category for objects exposing this capability
    pub fn tag(self) -> &'static str {
        match self {
            Capability::Interactable => "has_interact",
            Capability::Pickupable => "has_pickup",
            Capability::Damageable => "has_damage",
            Capability::Activatable => "has_activate",
        }
    }

    /// Method name used by `call_method` steps
    pub fn method(self) -> &'static str {
        match self {
            Capability::Interactable => "interact",
            Capability::Pickupable => "pickup",
            Capability::Damageable => "damage",
            Capability::Activatable => "activate",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "interact" | "use" | "open" | "toggle" => Some(Capability::Interactable),
            "pickup" | "collect" => Some(Capability::Pickupable),
            "damage" | "hit" | "take_damage" => Some(Capability::Damageable),
            "activate" => Some(Capability::Activatable),
            _ => None,
        }
    }

    /// Whether invoking this capability takes the acting player as an argument
    pub fn accepts_actor(self) -> bool {
        matches!(self, Capability::Interactable | Capability::Pickupable)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_round_trip() {
        for capability in Capability::ALL {
            assert_eq!(Capability::from_method(capability.method()), Some(capability));
        }
        assert_eq!(Capability::from_method("collect"), Some(Capability::Pickupable));
        assert_eq!(Capability::from_method("explode"), None);
    }

    #[test]
    fn test_tags_are_distinct() {
        let mut tags: Vec<_> = Capability::ALL.iter().map(|c| c.tag()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), Capability::ALL.len());
    }

    #[test]
    fn test_deserialize_snake_case() {
        let caps: Vec<Capability> = serde_json::from_str(r#"["pickupable", "damageable"]"#).unwrap();
        assert_eq!(caps, vec![Capability::Pickupable, Capability::Damageable]);
    }
}
