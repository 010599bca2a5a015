//! Player plugin for avatar control and interactions.
//!
//! This module provides:
//! - Avatar movement inside the world bounds
//! - Proximity tracking with a grace period and the interaction prompt
//! - NPC interaction dispatch (mission, dialogue, greeting)
//! - Portal and gate evaluation
//! - Character switching

mod components;
mod gates;
mod interactions;
mod movement;
mod proximity;
mod switching;

use bevy::prelude::*;

use crate::plugins::core::MapScreenSet;
use crate::plugins::screens::{map_screen_active, TransitionGuard};

// Re-export public types
pub use components::{HighlightRing, PlayerAvatar};
pub use gates::{LockedMessages, PortalClass, PortalRecord, PortalRegistry};
pub use interactions::{GreetingModal, InteractionHistory};
pub use proximity::{InteractionAffordance, ProximityState};

// =============================================================================
// Plugin
// =============================================================================

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProximityState>()
            .init_resource::<InteractionAffordance>()
            .init_resource::<GreetingModal>()
            .init_resource::<InteractionHistory>()
            .init_resource::<PortalRegistry>()
            .init_resource::<LockedMessages>()
            .add_systems(
                Update,
                movement::player_movement
                    .in_set(MapScreenSet::Movement)
                    .run_if(map_screen_active)
                    .run_if(guard_unlocked),
            )
            .add_systems(
                Update,
                (
                    proximity::detect_npc_overlap,
                    proximity::update_proximity,
                    interactions::dispatch_on_press,
                    interactions::dispatch_on_tap,
                )
                    .chain()
                    .in_set(MapScreenSet::Proximity)
                    .run_if(map_screen_active),
            )
            .add_systems(
                Update,
                (
                    gates::handle_portal_taps,
                    gates::handle_portal_overlap,
                    switching::request_character_switch,
                )
                    .chain()
                    .in_set(MapScreenSet::Transitions)
                    .run_if(map_screen_active),
            )
            // Rewards and notice expiry keep running while a sub-screen is open.
            .add_systems(
                Update,
                (
                    interactions::grant_dialogue_rewards,
                    gates::expire_locked_messages,
                )
                    .in_set(MapScreenSet::Transitions),
            );
    }
}

// =============================================================================
// Run Conditions
// =============================================================================

fn guard_unlocked(guard: Res<TransitionGuard>) -> bool {
    !guard.is_locked()
}
