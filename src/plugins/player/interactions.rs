//! NPC interaction dispatch, the greeting modal and dialogue rewards.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use std::collections::HashSet;

use crate::content::{Content, ContentCache};
use crate::plugins::core::{EventLog, InputBindings, NavConfig};
use crate::plugins::gestures::{AffordancePressed, WorldTap};
use crate::plugins::screens::{LaunchSubScreen, SubScreen, SubScreenClosed};
use crate::progression::Progression;
use crate::world::{Interactable, NpcInfo, WorldView};

use super::proximity::{ProximityState, TrackedInteractable};

// =============================================================================
// Resources
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Greeting {
    pub npc_name: String,
    pub text: String,
}

/// Centered greeting card. Tapping outside its content closes it.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct GreetingModal {
    greeting: Option<Greeting>,
}

impl GreetingModal {
    pub fn open(&mut self, npc_name: &str, text: &str) {
        self.greeting = Some(Greeting {
            npc_name: npc_name.to_string(),
            text: text.to_string(),
        });
    }

    pub fn close(&mut self) {
        self.greeting = None;
    }

    pub fn is_open(&self) -> bool {
        self.greeting.is_some()
    }

    pub fn greeting(&self) -> Option<&Greeting> {
        self.greeting.as_ref()
    }
}

/// NPCs whose dialogue already paid out during this activation.
#[derive(Resource, Debug, Default)]
pub struct InteractionHistory {
    rewarded: HashSet<String>,
}

impl InteractionHistory {
    /// True the first time `npc_id` completes a dialogue this activation.
    pub fn first_completion(&mut self, npc_id: &str) -> bool {
        self.rewarded.insert(npc_id.to_string())
    }

    pub fn clear(&mut self) {
        self.rewarded.clear();
    }
}

// =============================================================================
// Resolution
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionAction {
    Launch(SubScreen),
    Greeting { npc_name: String, text: String },
}

/// Mission beats dialogue beats greeting. Missing content falls through to
/// the next option so the player always gets a response.
pub fn resolve_interaction(npc_id: &str, npc: &NpcInfo, content: &dyn ContentCache) -> InteractionAction {
    if npc.has_mission {
        let missions = content.missions_for(npc.chapter, npc.lesson);
        if !missions.is_empty() {
            return InteractionAction::Launch(SubScreen::Mission {
                npc_id: npc_id.to_string(),
                chapter: npc.chapter,
                lesson: npc.lesson,
                chapter_name: content.chapter_meta(npc.chapter).map(|meta| meta.name),
                missions,
            });
        }
        warn!(
            "No missions for chapter {} lesson {} ({})",
            npc.chapter, npc.lesson, npc_id
        );
    }

    if npc.has_dialogue {
        if let Some(script) = content.dialogue_for(npc.chapter, npc.lesson) {
            return InteractionAction::Launch(SubScreen::Dialogue {
                npc_id: npc_id.to_string(),
                script,
            });
        }
        warn!(
            "No dialogue for chapter {} lesson {} ({})",
            npc.chapter, npc.lesson, npc_id
        );
    }

    InteractionAction::Greeting {
        npc_name: npc.name.clone(),
        text: npc.greeting.clone(),
    }
}

#[derive(SystemParam)]
pub struct InteractionDispatch<'w> {
    content: Res<'w, Content>,
    world_view: Res<'w, WorldView>,
    modal: ResMut<'w, GreetingModal>,
    launches: MessageWriter<'w, LaunchSubScreen>,
    log: ResMut<'w, EventLog>,
}

impl InteractionDispatch<'_> {
    pub fn dispatch(&mut self, npc_id: &str, npc: &NpcInfo) {
        match resolve_interaction(npc_id, npc, self.content.0.as_ref()) {
            InteractionAction::Launch(screen) => {
                info!("Opening {} for {}", screen.title(), npc.name);
                self.log.push(format!("{}: {}", npc.name, screen.title()));
                self.launches.write(LaunchSubScreen {
                    screen,
                    return_map: self.world_view.map_id.clone(),
                });
            }
            InteractionAction::Greeting { npc_name, text } => {
                self.modal.open(&npc_name, &text);
            }
        }
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Key or on-screen button press while engaged with an NPC.
pub fn dispatch_on_press(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut presses: MessageReader<AffordancePressed>,
    proximity: Res<ProximityState>,
    interactables: Query<&Interactable>,
    mut dispatch: InteractionDispatch,
) {
    let button_pressed = presses.read().count() > 0;
    let pressed = input.just_pressed(bindings.interact) || button_pressed;
    if !pressed || dispatch.modal.is_open() || !proximity.is_engaged() {
        return;
    }
    let Some(current) = proximity.current() else {
        return;
    };
    let Ok(interactable) = interactables.get(current.entity) else {
        return;
    };
    if let Some(npc) = interactable.npc() {
        dispatch.dispatch(&interactable.id, npc);
    }
}

/// Tapping an NPC interacts immediately regardless of distance.
pub fn dispatch_on_tap(
    config: Res<NavConfig>,
    mut taps: MessageReader<WorldTap>,
    interactables: Query<(Entity, &Interactable)>,
    mut proximity: ResMut<ProximityState>,
    mut dispatch: InteractionDispatch,
) {
    for tap in taps.read() {
        let hit = interactables
            .iter()
            .filter_map(|(entity, interactable)| {
                interactable
                    .npc()
                    .map(|npc| (entity, interactable, npc, tap.world.distance(interactable.position)))
            })
            .filter(|(_, _, _, distance)| *distance <= config.tap_radius)
            .min_by(|a, b| a.3.total_cmp(&b.3));

        let Some((entity, interactable, npc, _)) = hit else {
            continue;
        };
        proximity.set_current(TrackedInteractable {
            entity,
            id: interactable.id.clone(),
            label: interactable.label().to_string(),
            position: interactable.position,
        });
        dispatch.dispatch(&interactable.id, npc);
    }
}

/// Pays the dialogue reward the first time each NPC's dialogue completes.
pub fn grant_dialogue_rewards(
    config: Res<NavConfig>,
    mut closed: MessageReader<SubScreenClosed>,
    mut history: ResMut<InteractionHistory>,
    mut progression: ResMut<Progression>,
    mut log: ResMut<EventLog>,
) {
    for event in closed.read() {
        let SubScreen::Dialogue { npc_id, .. } = &event.screen else {
            continue;
        };
        if !history.first_completion(npc_id) {
            continue;
        }
        progression.0.add_experience(config.dialogue_reward_experience);
        progression.0.add_coins(config.dialogue_reward_coins);
        if !progression.persist() {
            log.push("Progress could not be saved".to_string());
        }
        log.push(format!(
            "+{} XP, +{} coins",
            config.dialogue_reward_experience, config.dialogue_reward_coins
        ));
    }
}

// =============================================================================
// Tests
// =============================================================================
