//! Pinch and wheel zoom routing.

use bevy::prelude::*;

/// The one consumer a zoom gesture drives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ZoomTarget {
    World,
    Minimap,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomRange {
    pub min: f32,
    pub max: f32,
}

impl ZoomRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomUpdate {
    pub target: ZoomTarget,
    pub zoom: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Pinching {
        start_distance: f32,
        start_zoom: f32,
        target: ZoomTarget,
    },
}

/// Two-pointer pinch state machine.
///
/// The target is captured when the pinch starts and never re-read, so toggling
/// the minimap mid-gesture keeps driving whatever the pinch began on.
///
/// A touch becomes a tap only when it lifts without another pointer having
/// landed during its lifetime.
#[derive(Resource, Debug, Default)]
pub struct GestureRouter {
    state: GestureState,
    tap_candidate: Option<u64>,
    released_tap: Option<Vec2>,
}

impl GestureRouter {
    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.state, GestureState::Pinching { .. })
    }

    pub fn bound_target(&self) -> Option<ZoomTarget> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Pinching { target, .. } => Some(target),
        }
    }

    /// Starts a pinch when two pointers are down. A second pointer-down while
    /// already pinching keeps the original binding.
    pub fn pointer_down(
        &mut self,
        pointers: &[Vec2],
        minimap_expanded: bool,
        world_zoom: f32,
        minimap_zoom: f32,
    ) {
        if self.is_pinching() {
            return;
        }
        let [first, second, ..] = pointers else {
            return;
        };

        let (target, start_zoom) = if minimap_expanded {
            (ZoomTarget::Minimap, minimap_zoom)
        } else {
            (ZoomTarget::World, world_zoom)
        };

        self.state = GestureState::Pinching {
            start_distance: first.distance(*second),
            start_zoom,
            target,
        };
        self.tap_candidate = None;
    }

    /// A finger landed while `other_pointers` others were already down.
    pub fn touch_started(&mut self, id: u64, other_pointers: usize) {
        self.tap_candidate = (other_pointers == 0 && !self.is_pinching()).then_some(id);
    }

    pub fn touch_ended(&mut self, id: u64, position: Vec2) {
        if self.tap_candidate == Some(id) {
            self.tap_candidate = None;
            self.released_tap = Some(position);
        }
    }

    pub fn touch_canceled(&mut self, id: u64) {
        if self.tap_candidate == Some(id) {
            self.tap_candidate = None;
        }
    }

    /// Screen position of a completed single-finger tap, consumed once.
    pub fn take_tap(&mut self) -> Option<Vec2> {
        self.released_tap.take()
    }

    /// Returns the new zoom for the bound target, or `None` when the move does
    /// not amount to a pinch (one pointer, idle, or too small a start spread).
    pub fn pointer_move(
        &self,
        pointers: &[Vec2],
        min_start_distance: f32,
        range_for: impl Fn(ZoomTarget) -> ZoomRange,
    ) -> Option<ZoomUpdate> {
        let GestureState::Pinching {
            start_distance,
            start_zoom,
            target,
        } = self.state
        else {
            return None;
        };
        let [first, second, ..] = pointers else {
            return None;
        };
        if start_distance < min_start_distance {
            return None;
        }

        let ratio = first.distance(*second) / start_distance;
        Some(ZoomUpdate {
            target,
            zoom: range_for(target).clamp(start_zoom * ratio),
        })
    }

    /// Any pointer release ends the pinch.
    pub fn pointer_up(&mut self) {
        self.state = GestureState::Idle;
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.tap_candidate = None;
        self.released_tap = None;
    }
}

/// Applies one wheel step to a zoom value. Negative `delta_y` (scrolling up)
/// zooms in, matching browser wheel deltas.
pub fn wheel_zoom(current: f32, delta_y: f32, factor: f32, range: ZoomRange) -> f32 {
    range.clamp(current - delta_y * factor)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(target: ZoomTarget) -> ZoomRange {
        match target {
            ZoomTarget::World => ZoomRange::new(0.5, 2.0),
            ZoomTarget::Minimap => ZoomRange::new(0.5, 3.0),
        }
    }

    fn pair(distance: f32) -> [Vec2; 2] {
        [Vec2::new(100.0, 100.0), Vec2::new(100.0 + distance, 100.0)]
    }

    #[test]
    fn single_pointer_does_not_start_pinch() {
        let mut router = GestureRouter::default();
        router.pointer_down(&[Vec2::ZERO], false, 1.0, 1.0);
        assert!(!router.is_pinching());
    }

    #[test]
    fn collapsed_minimap_binds_world_zoom() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(100.0), false, 1.2, 2.0);
        assert_eq!(router.bound_target(), Some(ZoomTarget::World));

        let update = router
            .pointer_move(&pair(150.0), 10.0, ranges)
            .expect("pinch update");
        assert_eq!(update.target, ZoomTarget::World);
        assert!((update.zoom - 1.8).abs() < 1e-5);
    }

    #[test]
    fn expanded_minimap_binds_minimap_zoom() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(200.0), true, 1.0, 1.0);
        let update = router
            .pointer_move(&pair(100.0), 10.0, ranges)
            .expect("pinch update");
        assert_eq!(update.target, ZoomTarget::Minimap);
        assert!((update.zoom - 0.5).abs() < 1e-5);
    }

    #[test]
    fn binding_survives_mode_change_mid_pinch() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(100.0), true, 1.0, 1.0);
        // The minimap collapses; a second pointer-down report must not rebind.
        router.pointer_down(&pair(100.0), false, 1.0, 1.0);
        for distance in [120.0, 180.0, 60.0] {
            let update = router
                .pointer_move(&pair(distance), 10.0, ranges)
                .expect("pinch update");
            assert_eq!(update.target, ZoomTarget::Minimap);
        }
    }

    #[test]
    fn zoom_saturates_at_range_bounds() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(20.0), false, 1.0, 1.0);
        let huge = router.pointer_move(&pair(5000.0), 10.0, ranges).unwrap();
        assert_eq!(huge.zoom, 2.0);
        let tiny = router.pointer_move(&pair(0.0), 10.0, ranges).unwrap();
        assert_eq!(tiny.zoom, 0.5);
    }

    #[test]
    fn short_start_spread_is_ignored() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(4.0), false, 1.0, 1.0);
        assert!(router.is_pinching());
        assert!(router.pointer_move(&pair(200.0), 10.0, ranges).is_none());
    }

    #[test]
    fn zero_distance_pinch_never_produces_nan() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(0.0), false, 1.0, 1.0);
        assert!(router.pointer_move(&pair(50.0), 0.0, ranges).map_or(true, |u| !u.zoom.is_nan()));
    }

    #[test]
    fn pointer_up_returns_to_idle() {
        let mut router = GestureRouter::default();
        router.pointer_down(&pair(100.0), false, 1.0, 1.0);
        router.pointer_up();
        assert_eq!(router.state(), GestureState::Idle);
        assert!(router.pointer_move(&pair(150.0), 10.0, ranges).is_none());
    }

    #[test]
    fn lone_touch_becomes_tap_on_release() {
        let mut router = GestureRouter::default();
        router.touch_started(1, 0);
        assert_eq!(router.take_tap(), None);
        router.touch_ended(1, Vec2::new(40.0, 60.0));
        assert_eq!(router.take_tap(), Some(Vec2::new(40.0, 60.0)));
        assert_eq!(router.take_tap(), None);
    }

    #[test]
    fn second_finger_cancels_pending_tap() {
        let mut router = GestureRouter::default();
        router.touch_started(1, 0);
        router.touch_started(2, 1);
        router.pointer_down(&pair(100.0), true, 1.0, 1.0);
        router.pointer_up();
        router.touch_ended(1, Vec2::ZERO);
        router.touch_ended(2, Vec2::ZERO);
        assert_eq!(router.take_tap(), None);
    }

    #[test]
    fn canceled_touch_is_not_a_tap() {
        let mut router = GestureRouter::default();
        router.touch_started(7, 0);
        router.touch_canceled(7);
        router.touch_ended(7, Vec2::ZERO);
        assert_eq!(router.take_tap(), None);
    }

    #[test]
    fn wheel_up_zooms_in_and_clamps() {
        let range = ZoomRange::new(0.5, 3.0);
        let raised = wheel_zoom(1.0, -500.0, 0.002, ZoomRange::new(0.5, 10.0));
        assert!((raised - 2.0).abs() < 1e-5);
        assert_eq!(wheel_zoom(2.5, -500.0, 0.002, range), 3.0);
        assert_eq!(wheel_zoom(1.0, 100_000.0, 0.002, range), 0.5);
    }
}
