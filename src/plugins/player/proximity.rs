//! Proximity tracking with a short grace period before the prompt hides.
//!
//! Overlap detection picks the interactable; distance evaluation decides
//! whether the prompt stays. Leaving the trigger radius starts a grace timer
//! and only a continuous absence past the deadline clears the target, so
//! boundary jitter never flickers the prompt.

use bevy::prelude::*;

use crate::plugins::core::NavConfig;
use crate::world::{Interactable, MapScoped};

use super::components::{HighlightRing, PlayerAvatar};

// =============================================================================
// Resources
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct TrackedInteractable {
    pub entity: Entity,
    pub id: String,
    pub label: String,
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProximityStatus {
    Idle,
    InRange,
    Grace,
    Cleared,
}

/// A grace deadline only exists while a target is tracked.
#[derive(Resource, Debug, Default)]
pub struct ProximityState {
    current: Option<TrackedInteractable>,
    grace_deadline: Option<f64>,
}

impl ProximityState {
    pub fn current(&self) -> Option<&TrackedInteractable> {
        self.current.as_ref()
    }

    pub fn grace_deadline(&self) -> Option<f64> {
        self.grace_deadline
    }

    /// Tracked and not counting down.
    pub fn is_engaged(&self) -> bool {
        self.current.is_some() && self.grace_deadline.is_none()
    }

    pub fn set_current(&mut self, target: TrackedInteractable) {
        self.current = Some(target);
        self.grace_deadline = None;
    }

    pub fn evaluate(&mut self, player: Vec2, now: f64, radius: f32, grace_seconds: f64) -> ProximityStatus {
        let Some(current) = &self.current else {
            self.grace_deadline = None;
            return ProximityStatus::Idle;
        };

        if player.distance(current.position) < radius {
            self.grace_deadline = None;
            return ProximityStatus::InRange;
        }

        match self.grace_deadline {
            None => {
                self.grace_deadline = Some(now + grace_seconds);
                ProximityStatus::Grace
            }
            Some(deadline) if now < deadline => ProximityStatus::Grace,
            Some(_) => {
                self.reset();
                ProximityStatus::Cleared
            }
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.grace_deadline = None;
    }
}

/// The interaction prompt. It fades in on show and hides instantly.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct InteractionAffordance {
    visible: bool,
    shown_at: f64,
    label: String,
}

impl InteractionAffordance {
    pub fn show(&mut self, label: &str, now: f64) {
        if !self.visible {
            self.shown_at = now;
        }
        self.visible = true;
        if self.label != label {
            self.label = label.to_string();
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shown_at(&self) -> f64 {
        self.shown_at
    }

    pub fn alpha(&self, now: f64, fade_seconds: f64) -> f32 {
        if !self.visible {
            return 0.0;
        }
        if fade_seconds <= 0.0 {
            return 1.0;
        }
        ((now - self.shown_at) / fade_seconds).clamp(0.0, 1.0) as f32
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Tracks the nearest NPC whose trigger zone the avatar overlaps.
pub fn detect_npc_overlap(
    config: Res<NavConfig>,
    players: Query<&Transform, With<PlayerAvatar>>,
    interactables: Query<(Entity, &Interactable)>,
    mut proximity: ResMut<ProximityState>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let position = player.translation.truncate();

    let nearest = interactables
        .iter()
        .filter(|(_, interactable)| interactable.npc().is_some())
        .map(|(entity, interactable)| {
            (entity, interactable, position.distance(interactable.position))
        })
        .filter(|(_, _, distance)| *distance < config.trigger_radius)
        .min_by(|a, b| a.2.total_cmp(&b.2));

    let Some((entity, interactable, _)) = nearest else {
        return;
    };
    if proximity.current().is_some_and(|current| current.entity == entity) {
        return;
    }
    proximity.set_current(TrackedInteractable {
        entity,
        id: interactable.id.clone(),
        label: interactable.label().to_string(),
        position: interactable.position,
    });
}

pub fn update_proximity(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<NavConfig>,
    players: Query<&Transform, With<PlayerAvatar>>,
    mut proximity: ResMut<ProximityState>,
    mut affordance: ResMut<InteractionAffordance>,
    mut rings: Query<(Entity, &mut HighlightRing)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let now = time.elapsed_secs_f64();
    let status = proximity.evaluate(
        player.translation.truncate(),
        now,
        config.trigger_radius,
        config.grace_seconds,
    );

    match status {
        ProximityStatus::InRange => {
            let Some(current) = proximity.current() else {
                return;
            };
            affordance.show(&current.label, now);
            match rings.iter_mut().next() {
                Some((_, mut ring)) => ring.center = current.position,
                None => {
                    commands.spawn((
                        HighlightRing {
                            center: current.position,
                            spawned_at: now,
                        },
                        MapScoped,
                    ));
                }
            }
        }
        ProximityStatus::Grace => {}
        ProximityStatus::Cleared | ProximityStatus::Idle => {
            if affordance.is_visible() {
                affordance.hide();
            }
            for (entity, _) in rings.iter() {
                commands.entity(entity).despawn();
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
