//! Visual marker components for map entities.

use bevy::prelude::*;

/// Ground plane covering the whole map.
#[derive(Component)]
pub struct GroundVisual;

#[derive(Component)]
pub struct NpcVisual;

/// Ring color is fixed by the lock state captured at activation.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalVisual {
    pub locked: bool,
}

#[derive(Component)]
pub struct WorldLabel;

pub fn portal_ring_color(locked: bool) -> Color {
    if locked {
        Color::srgb(0.9, 0.3, 0.28)
    } else {
        Color::srgb(0.3, 0.85, 0.4)
    }
}
