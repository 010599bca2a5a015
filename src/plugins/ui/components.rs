//! Shared UI markers.

use bevy::prelude::*;

// =============================================================================
// HUD Components
// =============================================================================

#[derive(Component)]
pub struct HudBar;

#[derive(Component)]
pub struct MapNameText;

#[derive(Component)]
pub struct ExperienceText;

#[derive(Component)]
pub struct CoinsText;

/// Edge label naming the map reachable in one direction.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintText {
    North,
    East,
    South,
    West,
}

// =============================================================================
// Log Components
// =============================================================================

#[derive(Component)]
pub struct LogPanelMarker;

#[derive(Component)]
pub struct LogContentText;

// =============================================================================
// Prompt Components
// =============================================================================

#[derive(Component)]
pub struct AffordanceButton;

#[derive(Component)]
pub struct AffordanceLabel;

#[derive(Component)]
pub struct LockedToast;

#[derive(Component)]
pub struct GreetingPanel;

#[derive(Component)]
pub struct GreetingText;

#[derive(Component)]
pub struct SubScreenPanel;

#[derive(Component)]
pub struct SubScreenText;

#[derive(Component)]
pub struct FadeOverlay;

#[derive(Component)]
pub struct FlashOverlay;
