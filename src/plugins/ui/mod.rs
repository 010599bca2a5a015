//! UI plugin for the map screen overlay.
//!
//! This module provides:
//! - Viewport-relative layout and resize handling
//! - HUD bar (map name, level, experience, coins) and directional hints
//! - Log panel
//! - Minimap (inline and expanded)
//! - Prompts: interaction affordance, locked toast, greeting modal, sub-screens, fades

mod components;
mod hud;
mod layout;
mod log;
mod minimap;
mod prompts;

use bevy::prelude::*;

use crate::plugins::core::{GameState, MapScreenSet};

// Re-export public types
pub use layout::HudLayout;
pub use minimap::{minimap_zoom_range, MinimapState};

// =============================================================================
// Plugin
// =============================================================================

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudLayout>()
            .init_resource::<MinimapState>()
            .init_resource::<hud::DirectionalHints>()
            .add_systems(
                Startup,
                (
                    layout::init_layout_from_window,
                    hud::setup_hud,
                    prompts::setup_prompts,
                    minimap::setup_minimap_overlay,
                ),
            )
            .add_systems(OnEnter(GameState::InGame), layout::init_layout_from_window)
            .add_systems(
                Update,
                layout::handle_viewport_resize.in_set(MapScreenSet::Activation),
            )
            .add_systems(
                Update,
                (
                    (layout::place_new_anchors, layout::apply_anchors).chain(),
                    (
                        minimap::spawn_minimap,
                        minimap::track_player_on_minimap,
                        minimap::sync_minimap_nodes,
                        minimap::sync_minimap_overlay,
                    )
                        .chain(),
                    (hud::refresh_directional_hints, hud::update_hud_text).chain(),
                    log::update_log_panel,
                    prompts::sync_affordance,
                    prompts::sync_locked_toast,
                    prompts::sync_greeting_panel,
                    prompts::sync_sub_screen_panel,
                    prompts::sync_screen_overlays,
                )
                    .in_set(MapScreenSet::Presentation),
            );
    }
}
