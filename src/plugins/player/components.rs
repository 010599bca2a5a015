//! Player-specific components.

use bevy::prelude::*;

// =============================================================================
// Components
// =============================================================================

/// The avatar the player walks around with.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PlayerAvatar {
    pub character_id: String,
}

impl PlayerAvatar {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
        }
    }
}

/// Pulsing ring around the interactable the player is engaged with.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct HighlightRing {
    pub center: Vec2,
    pub spawned_at: f64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_keeps_character_id() {
        let avatar = PlayerAvatar::new("bram");
        assert_eq!(avatar.character_id, "bram");
    }
}
