//! Pointer input for the map screen.
//!
//! Pinch and wheel zoom drive exactly one target: the world camera while the
//! minimap is collapsed, the minimap while it is expanded. Taps are routed to
//! the topmost overlay that claims them before reaching the world.

mod router;

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::plugins::core::{InputBindings, MapScreenSet, NavConfig};
use crate::plugins::player::{GreetingModal, InteractionAffordance};
use crate::plugins::render2d::{camera_view, world_zoom_range, WorldZoom};
use crate::plugins::screens::map_screen_active;
use crate::plugins::ui::{minimap_zoom_range, HudLayout, MinimapState};
use crate::viewport::screen_to_world;

pub use router::{wheel_zoom, GestureRouter, GestureState, ZoomRange, ZoomTarget, ZoomUpdate};

// =============================================================================
// Messages
// =============================================================================

/// A tap no overlay claimed, in both coordinate spaces.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct WorldTap {
    pub screen: Vec2,
    pub world: Vec2,
}

/// The on-screen interaction button was pressed.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct AffordancePressed;

// =============================================================================
// Plugin
// =============================================================================

pub struct GesturePlugin;

impl Plugin for GesturePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GestureRouter>()
            .add_message::<WorldTap>()
            .add_message::<AffordancePressed>()
            .add_systems(
                Update,
                (
                    route_touch_gestures,
                    route_wheel_zoom,
                    toggle_minimap_key,
                    route_taps,
                )
                    .chain()
                    .in_set(MapScreenSet::Input)
                    .run_if(map_screen_active),
            );
    }
}

// =============================================================================
// Tap classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    DismissModal,
    ModalContent,
    CloseMinimap,
    ToggleMinimap,
    Affordance,
    Hud,
    World,
}

/// Picks the single receiver of a tap at `screen`.
pub fn classify_tap(
    screen: Vec2,
    modal_open: bool,
    layout: &HudLayout,
    minimap: &MinimapState,
    affordance_visible: bool,
) -> TapOutcome {
    if modal_open {
        return if layout.modal_content.contains(screen) {
            TapOutcome::ModalContent
        } else {
            TapOutcome::DismissModal
        };
    }
    if minimap.is_expanded() && layout.close_button.contains(screen) {
        return TapOutcome::CloseMinimap;
    }
    if minimap.contains(screen) {
        return TapOutcome::ToggleMinimap;
    }
    if affordance_visible && layout.affordance.contains(screen) {
        return TapOutcome::Affordance;
    }
    if !layout.gesture_zone.contains(screen) {
        return TapOutcome::Hud;
    }
    TapOutcome::World
}

// =============================================================================
// Systems
// =============================================================================

fn apply_zoom_update(
    update: ZoomUpdate,
    config: &NavConfig,
    world_zoom: &mut WorldZoom,
    minimap: &mut MinimapState,
) {
    match update.target {
        ZoomTarget::World => world_zoom.set(update.zoom, world_zoom_range(config)),
        ZoomTarget::Minimap => minimap.set_zoom(update.zoom, minimap_zoom_range(config)),
    }
}

pub fn route_touch_gestures(
    touches: Res<Touches>,
    config: Res<NavConfig>,
    mut router: ResMut<GestureRouter>,
    mut world_zoom: ResMut<WorldZoom>,
    mut minimap: ResMut<MinimapState>,
) {
    for touch in touches.iter_just_pressed() {
        let others = touches.iter().filter(|other| other.id() != touch.id()).count();
        router.touch_started(touch.id(), others);
    }

    if touches.any_just_released() || touches.any_just_canceled() {
        for touch in touches.iter_just_canceled() {
            router.touch_canceled(touch.id());
        }
        for touch in touches.iter_just_released() {
            router.touch_ended(touch.id(), touch.position());
        }
        router.pointer_up();
        return;
    }

    let pointers: Vec<Vec2> = touches.iter().map(|touch| touch.position()).collect();
    if touches.any_just_pressed() {
        router.pointer_down(
            &pointers,
            minimap.is_expanded(),
            world_zoom.zoom,
            minimap.zoom(),
        );
        return;
    }

    let update = router.pointer_move(&pointers, config.pinch_min_distance, |target| match target {
        ZoomTarget::World => world_zoom_range(&config),
        ZoomTarget::Minimap => minimap_zoom_range(&config),
    });
    if let Some(update) = update {
        apply_zoom_update(update, &config, &mut world_zoom, &mut minimap);
    }
}

pub fn route_wheel_zoom(
    mut wheel: MessageReader<MouseWheel>,
    config: Res<NavConfig>,
    mut world_zoom: ResMut<WorldZoom>,
    mut minimap: ResMut<MinimapState>,
) {
    for event in wheel.read() {
        // Bevy reports scroll-up as positive; browser-style deltas are the inverse.
        let delta_y = match event.unit {
            MouseScrollUnit::Line => -event.y * config.wheel_line_pixels,
            MouseScrollUnit::Pixel => -event.y,
        };
        let update = if minimap.is_expanded() {
            ZoomUpdate {
                target: ZoomTarget::Minimap,
                zoom: wheel_zoom(
                    minimap.zoom(),
                    delta_y,
                    config.wheel_factor,
                    minimap_zoom_range(&config),
                ),
            }
        } else {
            ZoomUpdate {
                target: ZoomTarget::World,
                zoom: wheel_zoom(
                    world_zoom.zoom,
                    delta_y,
                    config.wheel_factor,
                    world_zoom_range(&config),
                ),
            }
        };
        apply_zoom_update(update, &config, &mut world_zoom, &mut minimap);
    }
}

pub fn toggle_minimap_key(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    layout: Res<HudLayout>,
    mut minimap: ResMut<MinimapState>,
) {
    if input.just_pressed(bindings.toggle_minimap) {
        let expanded = minimap.toggle(layout.minimap_inline_origin);
        debug!("Minimap expanded: {}", expanded);
    }
}

/// Mouse clicks resolve on press; touches resolve on release so the first
/// finger of a pinch is never taken for a tap.
fn tap_position(
    mouse: &ButtonInput<MouseButton>,
    router: &mut GestureRouter,
    window: &Window,
) -> Option<Vec2> {
    let touch_tap = router.take_tap();
    if mouse.just_pressed(MouseButton::Left) {
        return window.cursor_position();
    }
    touch_tap
}

#[allow(clippy::too_many_arguments)]
pub fn route_taps(
    mouse: Res<ButtonInput<MouseButton>>,
    mut router: ResMut<GestureRouter>,
    layout: Res<HudLayout>,
    zoom: Res<WorldZoom>,
    affordance: Res<InteractionAffordance>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<&Transform, With<Camera2d>>,
    mut minimap: ResMut<MinimapState>,
    mut modal: ResMut<GreetingModal>,
    mut world_taps: MessageWriter<WorldTap>,
    mut affordance_presses: MessageWriter<AffordancePressed>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(screen) = tap_position(&mouse, &mut router, window) else {
        return;
    };

    match classify_tap(
        screen,
        modal.is_open(),
        &layout,
        &minimap,
        affordance.is_visible(),
    ) {
        TapOutcome::DismissModal => modal.close(),
        TapOutcome::ModalContent | TapOutcome::Hud => {}
        TapOutcome::CloseMinimap => minimap.collapse(layout.minimap_inline_origin),
        TapOutcome::ToggleMinimap => {
            minimap.toggle(layout.minimap_inline_origin);
        }
        TapOutcome::Affordance => {
            affordance_presses.write(AffordancePressed);
        }
        TapOutcome::World => {
            let Ok(camera) = cameras.single() else {
                return;
            };
            let view = camera_view(camera, &zoom, window.size());
            world_taps.write(WorldTap {
                screen,
                world: screen_to_world(&view, screen),
            });
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
