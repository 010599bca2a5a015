//! Avatar movement.

use bevy::prelude::*;

use crate::plugins::core::{InputBindings, NavConfig};
use crate::world::WorldView;

use super::components::PlayerAvatar;

// =============================================================================
// Systems
// =============================================================================

pub fn player_movement(
    time: Res<Time>,
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    config: Res<NavConfig>,
    world_view: Res<WorldView>,
    mut players: Query<&mut Transform, With<PlayerAvatar>>,
) {
    let direction = movement_direction(&input, &bindings);
    if direction == Vec2::ZERO {
        return;
    }

    let step = direction * config.player_speed * time.delta_secs();
    for mut transform in players.iter_mut() {
        let next = (transform.translation.truncate() + step).clamp(Vec2::ZERO, world_view.size);
        transform.translation.x = next.x;
        transform.translation.y = next.y;
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Unit direction from the held movement keys; diagonals are normalized.
pub fn movement_direction(input: &ButtonInput<KeyCode>, bindings: &InputBindings) -> Vec2 {
    let held = |primary: KeyCode, alternate: KeyCode| {
        input.pressed(primary) || input.pressed(alternate)
    };

    let mut direction = Vec2::ZERO;
    if held(bindings.move_up, bindings.alt_up) {
        direction.y += 1.0;
    }
    if held(bindings.move_down, bindings.alt_down) {
        direction.y -= 1.0;
    }
    if held(bindings.move_left, bindings.alt_left) {
        direction.x -= 1.0;
    }
    if held(bindings.move_right, bindings.alt_right) {
        direction.x += 1.0;
    }
    direction.normalize_or_zero()
}

// =============================================================================
// Tests
// =============================================================================
