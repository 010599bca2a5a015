//! 2D rendering plugin for the world view.

mod camera;
mod components;
mod effects;
mod entities;

use bevy::ecs::schedule::IntoScheduleConfigs;
use bevy::prelude::*;

use crate::plugins::core::MapScreenSet;

// Re-export public types
pub use camera::{camera_view, world_zoom_range, WorldZoom};
pub use entities::spawn_map_entities;

// =============================================================================
// Plugin
// =============================================================================

pub struct Render2DPlugin;

impl Plugin for Render2DPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldZoom>()
            .add_systems(Startup, camera::setup_camera)
            .add_systems(
                Update,
                (camera::sync_camera_zoom, camera::follow_player_camera)
                    .chain()
                    .in_set(MapScreenSet::Presentation),
            )
            .add_systems(
                Update,
                (
                    effects::draw_world_bounds,
                    effects::draw_portal_rings,
                    effects::draw_highlight_ring,
                )
                    .after(camera::follow_player_camera)
                    .in_set(MapScreenSet::Presentation),
            );
    }
}
