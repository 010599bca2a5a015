//! World camera: zoom, follow and the snapshot used for screen/world mapping.

use bevy::camera::{OrthographicProjection, Projection};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::plugins::core::NavConfig;
use crate::plugins::gestures::ZoomRange;
use crate::plugins::player::PlayerAvatar;
use crate::viewport::{clamp_camera_center, CameraView};
use crate::world::WorldView;

// =============================================================================
// Resources
// =============================================================================

/// World camera zoom. Values above 1 magnify; the projection scale is the inverse.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldZoom {
    pub zoom: f32,
}

impl Default for WorldZoom {
    fn default() -> Self {
        Self { zoom: 1.0 }
    }
}

impl WorldZoom {
    pub fn set(&mut self, zoom: f32, range: ZoomRange) {
        self.zoom = range.clamp(zoom);
    }

    pub fn projection_scale(&self) -> f32 {
        if self.zoom > 0.0 {
            1.0 / self.zoom
        } else {
            1.0
        }
    }

    pub fn label(&self) -> String {
        format!("{:.2}x", self.zoom)
    }
}

pub fn world_zoom_range(config: &NavConfig) -> ZoomRange {
    ZoomRange::new(config.world_zoom_min, config.world_zoom_max)
}

// =============================================================================
// Systems
// =============================================================================

pub fn setup_camera(mut commands: Commands) {
    info!("Setting up world camera");

    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection::default_2d()),
        Camera {
            order: 0,
            ..default()
        },
        Name::new("WorldCamera"),
    ));
}

pub fn sync_camera_zoom(
    zoom: Res<WorldZoom>,
    mut projections: Query<&mut Projection, With<Camera2d>>,
) {
    if !zoom.is_changed() {
        return;
    }
    let scale = zoom.projection_scale();
    for mut projection in projections.iter_mut() {
        if let Projection::Orthographic(orthographic) = &mut *projection {
            if orthographic.scale != scale {
                debug!("sync_camera_zoom: scale {:.3} ({})", scale, zoom.label());
                orthographic.scale = scale;
            }
        }
    }
}

/// Keeps the camera on the avatar while staying inside the world bounds.
pub fn follow_player_camera(
    zoom: Res<WorldZoom>,
    world_view: Res<WorldView>,
    windows: Query<&Window, With<PrimaryWindow>>,
    player: Query<&Transform, (With<PlayerAvatar>, Without<Camera2d>)>,
    mut cameras: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(player_transform) = player.single() else {
        return;
    };
    let viewport = windows
        .single()
        .map(|window| window.size())
        .unwrap_or(Vec2::ZERO);
    let view = CameraView {
        center: player_transform.translation.truncate(),
        zoom: zoom.zoom,
        viewport,
    };
    let center = clamp_camera_center(view.center, view.visible_world_size(), world_view.size);

    for mut camera_transform in cameras.iter_mut() {
        camera_transform.translation.x = center.x;
        camera_transform.translation.y = center.y;
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Current camera state as a pure value for projection math.
pub fn camera_view(camera: &Transform, zoom: &WorldZoom, viewport: Vec2) -> CameraView {
    CameraView {
        center: camera.translation.truncate(),
        zoom: zoom.zoom,
        viewport,
    }
}

// =============================================================================
// Tests
// =============================================================================
