//! Coordinate conversions between world, screen and minimap space.
//!
//! World space is Bevy's: x right, y up, one unit per logical pixel at zoom 1.
//! Screen space is the window's: origin top-left, y down, logical pixels.
//! Minimap space is a uniform scale of world space; callers flip y against the
//! world height when laying out UI nodes (see [`flip_y`]).

use bevy::prelude::*;

/// Snapshot of the world camera needed for screen projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// World position under the viewport center.
    pub center: Vec2,
    /// Magnification; 2.0 shows half as much world.
    pub zoom: f32,
    /// Viewport size in logical pixels.
    pub viewport: Vec2,
}

impl CameraView {
    /// World-space size covered by the viewport.
    pub fn visible_world_size(&self) -> Vec2 {
        self.viewport / self.zoom.max(f32::EPSILON)
    }
}

pub fn world_to_screen(camera: &CameraView, point: Vec2) -> Vec2 {
    let offset = (point - camera.center) * camera.zoom;
    Vec2::new(
        camera.viewport.x * 0.5 + offset.x,
        camera.viewport.y * 0.5 - offset.y,
    )
}

pub fn screen_to_world(camera: &CameraView, point: Vec2) -> Vec2 {
    let zoom = camera.zoom.max(f32::EPSILON);
    let offset = Vec2::new(
        point.x - camera.viewport.x * 0.5,
        camera.viewport.y * 0.5 - point.y,
    );
    camera.center + offset / zoom
}

/// Scale factor projecting a world of `world_width` onto a minimap of `minimap_width`.
pub fn minimap_scale(minimap_width: f32, world_width: f32) -> f32 {
    if world_width <= 0.0 {
        return 0.0;
    }
    minimap_width / world_width
}

/// Minimap height preserving the world aspect ratio.
pub fn minimap_height(minimap_width: f32, world_size: Vec2) -> f32 {
    if world_size.x <= 0.0 {
        return 0.0;
    }
    minimap_width * world_size.y / world_size.x
}

pub fn world_to_minimap(scale: f32, point: Vec2) -> Vec2 {
    point * scale
}

pub fn minimap_to_world(scale: f32, point: Vec2) -> Vec2 {
    if scale == 0.0 {
        return Vec2::ZERO;
    }
    point / scale
}

/// Converts a y-up world point into y-down map coordinates.
pub fn flip_y(point: Vec2, world_height: f32) -> Vec2 {
    Vec2::new(point.x, world_height - point.y)
}

/// Keeps a camera center inside the world when the world is larger than the view.
/// Axes where the view is wider than the world are centered instead.
pub fn clamp_camera_center(center: Vec2, visible: Vec2, world_size: Vec2) -> Vec2 {
    let clamp_axis = |value: f32, visible: f32, extent: f32| {
        if visible >= extent {
            extent * 0.5
        } else {
            value.clamp(visible * 0.5, extent - visible * 0.5)
        }
    };

    Vec2::new(
        clamp_axis(center.x, visible.x, world_size.x),
        clamp_axis(center.y, visible.y, world_size.y),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec2, b: Vec2) {
        assert!(
            (a - b).length() < 1e-3,
            "expected {:?} close to {:?}",
            a,
            b
        );
    }

    fn camera() -> CameraView {
        CameraView {
            center: Vec2::new(400.0, 300.0),
            zoom: 1.5,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }

    #[test]
    fn camera_center_maps_to_viewport_center() {
        let view = camera();
        assert_vec_close(world_to_screen(&view, view.center), Vec2::new(640.0, 360.0));
    }

    #[test]
    fn screen_y_grows_downward() {
        let view = camera();
        let above = world_to_screen(&view, view.center + Vec2::new(0.0, 10.0));
        assert!(above.y < 360.0);
        assert!((above.y - (360.0 - 15.0)).abs() < 1e-4);
    }

    #[test]
    fn screen_round_trip_is_identity() {
        let view = camera();
        for point in [
            Vec2::new(0.0, 0.0),
            Vec2::new(1234.5, -87.25),
            Vec2::new(-500.0, 4000.0),
        ] {
            let back = screen_to_world(&view, world_to_screen(&view, point));
            assert_vec_close(back, point);
        }
    }

    #[test]
    fn minimap_scale_uses_width_ratio() {
        let scale = minimap_scale(160.0, 3200.0);
        assert!((scale - 0.05).abs() < 1e-6);
        assert_vec_close(
            world_to_minimap(scale, Vec2::new(1600.0, 800.0)),
            Vec2::new(80.0, 40.0),
        );
    }

    #[test]
    fn minimap_round_trip_is_identity() {
        let scale = minimap_scale(160.0, 2400.0);
        let point = Vec2::new(1111.0, 333.0);
        assert_vec_close(minimap_to_world(scale, world_to_minimap(scale, point)), point);
    }

    #[test]
    fn minimap_height_follows_world_aspect() {
        let height = minimap_height(160.0, Vec2::new(3200.0, 1600.0));
        assert!((height - 80.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_world_width_yields_zero_scale() {
        assert_eq!(minimap_scale(160.0, 0.0), 0.0);
        assert_eq!(minimap_height(160.0, Vec2::new(0.0, 10.0)), 0.0);
        assert_eq!(minimap_to_world(0.0, Vec2::new(5.0, 5.0)), Vec2::ZERO);
    }

    #[test]
    fn camera_clamp_keeps_view_inside_world() {
        let world = Vec2::new(2000.0, 1000.0);
        let visible = Vec2::new(800.0, 600.0);
        let clamped = clamp_camera_center(Vec2::new(-100.0, 990.0), visible, world);
        assert_vec_close(clamped, Vec2::new(400.0, 700.0));
    }

    #[test]
    fn camera_clamp_centers_small_worlds() {
        let world = Vec2::new(600.0, 400.0);
        let visible = Vec2::new(1280.0, 720.0);
        let clamped = clamp_camera_center(Vec2::new(10.0, 10.0), visible, world);
        assert_vec_close(clamped, Vec2::new(300.0, 200.0));
    }
}
