//! Character switching.

use bevy::prelude::*;

use crate::plugins::core::{EventLog, InputBindings, NavConfig};
use crate::plugins::screens::{MapScreenScope, ScreenFlash, TransitionGuard};
use crate::progression::{Progression, ProgressionStore, SavedPosition};
use crate::world::{ActivationPayload, TransitionRequest, WorldView};

use super::components::PlayerAvatar;

// =============================================================================
// Planning
// =============================================================================

/// The character after `current` in roster order, wrapping around.
pub fn next_character<'a>(characters: &'a [String], current: &str) -> Option<&'a str> {
    if characters.len() < 2 {
        return None;
    }
    let next = match characters.iter().position(|id| id == current) {
        Some(index) => &characters[(index + 1) % characters.len()],
        None => &characters[0],
    };
    (next != current).then_some(next.as_str())
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchPlan {
    pub next_character: String,
    pub request: TransitionRequest,
}

/// Inside a place the switch returns to the parent map; elsewhere it reloads
/// the current map, placing the new character where they were last saved on it.
pub fn plan_switch(
    store: &dyn ProgressionStore,
    characters: &[String],
    world_view: &WorldView,
    position: Vec2,
) -> Option<SwitchPlan> {
    let next = next_character(characters, store.current_character_id())?;
    let mut payload = ActivationPayload::from_origin(world_view.map_id.clone());

    let target_map_id = match world_view.parent.as_deref() {
        Some(parent) => {
            payload.from_place = Some(world_view.map_id.clone());
            store.return_map_id().unwrap_or(parent).to_string()
        }
        None => {
            let saved = store
                .character_position(next)
                .filter(|saved| saved.map_id == world_view.map_id)
                .map(|saved| Vec2::new(saved.x, saved.y));
            payload.spawn = Some(saved.unwrap_or(position));
            world_view.map_id.clone()
        }
    };

    Some(SwitchPlan {
        next_character: next.to_string(),
        request: TransitionRequest {
            target_map_id,
            payload,
        },
    })
}

// =============================================================================
// Systems
// =============================================================================

#[allow(clippy::too_many_arguments)]
pub fn request_character_switch(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    config: Res<NavConfig>,
    time: Res<Time>,
    scope: Res<MapScreenScope>,
    world_view: Res<WorldView>,
    mut guard: ResMut<TransitionGuard>,
    mut progression: ResMut<Progression>,
    mut flash: ResMut<ScreenFlash>,
    mut players: Query<(&Transform, &mut PlayerAvatar)>,
    mut log: ResMut<EventLog>,
) {
    if !input.just_pressed(bindings.switch_character) || guard.is_locked() {
        return;
    }
    let Ok((transform, mut avatar)) = players.single_mut() else {
        return;
    };
    let position = transform.translation.truncate();
    let Some(plan) = plan_switch(
        progression.0.as_ref(),
        &config.characters,
        &world_view,
        position,
    ) else {
        return;
    };

    let now = time.elapsed_secs_f64();
    let deadline = scope.deadline(now, config.switch_delay_seconds);
    if !guard.try_begin_switch(plan.request, deadline) {
        return;
    }

    let previous = avatar.character_id.clone();
    progression.0.set_character_position(
        &previous,
        SavedPosition {
            map_id: world_view.map_id.clone(),
            x: position.x,
            y: position.y,
        },
    );
    progression.0.set_current_character_id(&plan.next_character);
    if world_view.is_sub_place() {
        progression.0.set_return_map_id(None);
    }
    if !progression.persist() {
        log.push("Progress could not be saved".to_string());
    }

    avatar.character_id = plan.next_character.clone();
    flash.start(now, config.flash_seconds);
    info!("Switching character {} -> {}", previous, plan.next_character);
    log.push(format!("Now playing as {}", plan.next_character));
}

// =============================================================================
// Tests
// =============================================================================
