//! Gizmo overlays: portal rings, the proximity highlight and map bounds.

use bevy::prelude::*;

use crate::plugins::core::NavConfig;
use crate::plugins::player::HighlightRing;
use crate::world::WorldView;

use super::components::{portal_ring_color, PortalVisual};

// =============================================================================
// Constants
// =============================================================================

const HIGHLIGHT_PULSE_HZ: f64 = 1.5;
const HIGHLIGHT_PULSE_AMPLITUDE: f32 = 6.0;

// =============================================================================
// Systems
// =============================================================================

pub fn draw_portal_rings(
    mut gizmos: Gizmos,
    config: Res<NavConfig>,
    portals: Query<(&Transform, &PortalVisual)>,
) {
    for (transform, visual) in portals.iter() {
        gizmos.circle_2d(
            transform.translation.truncate(),
            config.portal_radius,
            portal_ring_color(visual.locked),
        );
    }
}

pub fn draw_highlight_ring(
    mut gizmos: Gizmos,
    time: Res<Time>,
    config: Res<NavConfig>,
    rings: Query<&HighlightRing>,
) {
    let now = time.elapsed_secs_f64();
    for ring in rings.iter() {
        let radius = pulse_radius(config.trigger_radius * 0.5, now - ring.spawned_at);
        gizmos.circle_2d(ring.center, radius, Color::srgba(1.0, 0.92, 0.5, 0.8));
    }
}

pub fn draw_world_bounds(mut gizmos: Gizmos, world_view: Res<WorldView>) {
    if world_view.size == Vec2::ZERO {
        return;
    }
    gizmos.rect_2d(
        Isometry2d::from_translation(world_view.size * 0.5),
        world_view.size,
        Color::srgba(0.9, 0.9, 0.85, 0.4),
    );
}

// =============================================================================
// Helpers
// =============================================================================

fn pulse_radius(base: f32, age: f64) -> f32 {
    let phase = (age.max(0.0) * HIGHLIGHT_PULSE_HZ * std::f64::consts::TAU).sin() as f32;
    base + phase * HIGHLIGHT_PULSE_AMPLITUDE
}

// =============================================================================
// Tests
// =============================================================================
