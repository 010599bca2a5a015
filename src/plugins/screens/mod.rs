//! Map-screen lifecycle: activation, teardown, transition handoff and the
//! sub-screen protocol.
//!
//! Every activation tears down the previous map's entities, starts a new
//! [`MapScreenScope`] and resets per-activation state. Deferred work (fades,
//! switch delays, locked notices) carries a scope token and is dropped once
//! its activation ends.

mod guard;
mod scope;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::content::{Content, DialogueScript, Mission};
use crate::plugins::core::{EventLog, GameState, InputBindings, MapScreenSet, NavConfig};
use crate::plugins::gestures::GestureRouter;
use crate::plugins::player::{
    GreetingModal, InteractionAffordance, InteractionHistory, LockedMessages, PortalRegistry,
    ProximityState,
};
use crate::plugins::render2d::{spawn_map_entities, WorldZoom};
use crate::plugins::ui::MinimapState;
use crate::progression::Progression;
use crate::world::{ActivationPayload, MapId, MapScoped, WorldView};

pub use guard::{LockState, TransitionGuard};
pub use scope::{Deadline, MapScreenScope, ScopeToken};

// =============================================================================
// Messages
// =============================================================================

/// Request to show a map. The last request in a frame wins.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ActivateMap {
    pub map_id: MapId,
    pub payload: ActivationPayload,
}

/// Sent once a map's entities have been spawned.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct MapActivated {
    pub map_id: MapId,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubScreen {
    Mission {
        npc_id: String,
        chapter: u32,
        lesson: u32,
        chapter_name: Option<String>,
        missions: Vec<Mission>,
    },
    Dialogue {
        npc_id: String,
        script: DialogueScript,
    },
}

impl SubScreen {
    pub fn title(&self) -> &'static str {
        match self {
            SubScreen::Mission { .. } => "Mission",
            SubScreen::Dialogue { .. } => "Dialogue",
        }
    }

    pub fn npc_id(&self) -> &str {
        match self {
            SubScreen::Mission { npc_id, .. } | SubScreen::Dialogue { npc_id, .. } => npc_id,
        }
    }
}

/// Hands control to a sub-screen; the map resumes when it closes.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct LaunchSubScreen {
    pub screen: SubScreen,
    pub return_map: MapId,
}

#[derive(Message, Debug, Clone, PartialEq)]
pub struct SubScreenClosed {
    pub screen: SubScreen,
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub enum ScreenMode {
    #[default]
    Map,
    SubScreen(LaunchSubScreen),
}

/// Fade to black ahead of a map transition.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ScreenFade {
    started_at: f64,
    duration: f64,
    active: bool,
}

impl ScreenFade {
    pub fn start(&mut self, now: f64, duration: f64) {
        self.started_at = now;
        self.duration = duration;
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn alpha(&self, now: f64) -> f32 {
        if !self.active {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn clear(&mut self) {
        self.active = false;
    }
}

/// White flash on character switch; decays to nothing.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ScreenFlash {
    started_at: f64,
    duration: f64,
    active: bool,
}

impl ScreenFlash {
    pub fn start(&mut self, now: f64, duration: f64) {
        self.started_at = now;
        self.duration = duration;
        self.active = true;
    }

    pub fn alpha(&self, now: f64) -> f32 {
        if !self.active || self.duration <= 0.0 {
            return 0.0;
        }
        (1.0 - (now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn clear(&mut self) {
        self.active = false;
    }
}

// =============================================================================
// Plugin
// =============================================================================

pub struct ScreensPlugin;

impl Plugin for ScreensPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapScreenScope>()
            .init_resource::<TransitionGuard>()
            .init_resource::<ScreenMode>()
            .init_resource::<ScreenFade>()
            .init_resource::<ScreenFlash>()
            .init_resource::<WorldView>()
            .add_message::<ActivateMap>()
            .add_message::<MapActivated>()
            .add_message::<LaunchSubScreen>()
            .add_message::<SubScreenClosed>()
            .add_systems(OnEnter(GameState::InGame), request_initial_activation)
            .add_systems(OnExit(GameState::InGame), teardown_map_screen)
            .add_systems(
                Update,
                activate_map_screen.in_set(MapScreenSet::Activation),
            )
            .add_systems(
                Update,
                (
                    poll_transition_guard,
                    close_sub_screen.run_if(sub_screen_active),
                    open_sub_screen,
                )
                    .chain()
                    .in_set(MapScreenSet::Transitions),
            );
    }
}

// =============================================================================
// Run Conditions
// =============================================================================

pub fn map_screen_active(mode: Res<ScreenMode>) -> bool {
    matches!(*mode, ScreenMode::Map)
}

fn sub_screen_active(mode: Res<ScreenMode>) -> bool {
    matches!(*mode, ScreenMode::SubScreen(_))
}

// =============================================================================
// Activation
// =============================================================================

/// Per-activation state reset on every teardown.
#[derive(SystemParam)]
pub struct ActivationState<'w> {
    scope: ResMut<'w, MapScreenScope>,
    guard: ResMut<'w, TransitionGuard>,
    world_view: ResMut<'w, WorldView>,
    registry: ResMut<'w, PortalRegistry>,
    minimap: ResMut<'w, MinimapState>,
    zoom: ResMut<'w, WorldZoom>,
    fade: ResMut<'w, ScreenFade>,
    flash: ResMut<'w, ScreenFlash>,
}

#[derive(SystemParam)]
pub struct InteractionReset<'w> {
    proximity: ResMut<'w, ProximityState>,
    affordance: ResMut<'w, InteractionAffordance>,
    locked: ResMut<'w, LockedMessages>,
    modal: ResMut<'w, GreetingModal>,
    router: ResMut<'w, GestureRouter>,
    history: ResMut<'w, InteractionHistory>,
}

impl InteractionReset<'_> {
    fn reset(&mut self) {
        self.proximity.reset();
        self.affordance.hide();
        self.locked.clear();
        self.modal.close();
        self.router.reset();
        self.history.clear();
    }
}

fn end_activation(state: &mut ActivationState, interaction: &mut InteractionReset) {
    state.scope.end();
    state.guard.reset();
    state.fade.clear();
    state.flash.clear();
    interaction.reset();
}

fn request_initial_activation(
    content: Res<Content>,
    progression: Res<Progression>,
    mut requests: MessageWriter<ActivateMap>,
) {
    let store = &progression.0;
    let map_id = store
        .current_map_id()
        .unwrap_or_else(|| content.0.default_map_id())
        .to_string();
    let spawn = store
        .character_position(store.current_character_id())
        .filter(|saved| saved.map_id == map_id)
        .map(|saved| Vec2::new(saved.x, saved.y));

    requests.write(ActivateMap {
        map_id,
        payload: ActivationPayload {
            spawn,
            ..Default::default()
        },
    });
}

#[allow(clippy::too_many_arguments)]
pub fn activate_map_screen(
    mut commands: Commands,
    mut requests: MessageReader<ActivateMap>,
    time: Res<Time>,
    config: Res<NavConfig>,
    content: Res<Content>,
    mut progression: ResMut<Progression>,
    mut state: ActivationState,
    mut interaction: InteractionReset,
    scoped: Query<Entity, With<MapScoped>>,
    mut activated: MessageWriter<MapActivated>,
    mut log: ResMut<EventLog>,
) {
    let Some(request) = requests.read().last().cloned() else {
        return;
    };

    for entity in scoped.iter() {
        commands.entity(entity).despawn();
    }
    end_activation(&mut state, &mut interaction);

    let map = match content.map_or_default(&request.map_id) {
        Ok(map) => map,
        Err(error) => {
            error!("Map activation failed: {}", error);
            log.push(format!("Cannot open map: {}", error));
            return;
        }
    };
    if map.id != request.map_id {
        warn!("Unknown map {}, showing {}", request.map_id, map.id);
    }

    let now = time.elapsed_secs_f64();
    state.scope.begin();
    state.world_view.reset_for(map);
    if let Some(place) = request.payload.from_place.as_deref() {
        state
            .world_view
            .arm_immunity(place, now, config.place_immunity_seconds);
    }
    state.minimap.configure_world(map.size());
    state.zoom.zoom = config.world_zoom_default;

    let store = &mut progression.0;
    *state.registry = PortalRegistry::build(map, store.current_level());
    let spawn = map.resolve_spawn(&request.payload);
    spawn_map_entities(
        &mut commands,
        map,
        &state.registry,
        spawn,
        store.current_character_id(),
    );

    store.set_current_map_id(&map.id);
    store.mark_map_visited(&map.id);
    if !progression.persist() {
        log.push("Progress could not be saved".to_string());
    }

    info!("Map screen active: {} ({})", map.name, map.id);
    log.push(format!("Arrived: {}", map.name));
    activated.write(MapActivated {
        map_id: map.id.clone(),
    });
}

fn teardown_map_screen(
    mut commands: Commands,
    mut state: ActivationState,
    mut interaction: InteractionReset,
    mut mode: ResMut<ScreenMode>,
    scoped: Query<Entity, With<MapScoped>>,
) {
    for entity in scoped.iter() {
        commands.entity(entity).despawn();
    }
    end_activation(&mut state, &mut interaction);
    *mode = ScreenMode::Map;
}

/// Fires due handoffs as map activations.
pub fn poll_transition_guard(
    time: Res<Time>,
    scope: Res<MapScreenScope>,
    mut guard: ResMut<TransitionGuard>,
    mut requests: MessageWriter<ActivateMap>,
) {
    if let Some(request) = guard.poll(time.elapsed_secs_f64(), &scope) {
        requests.write(ActivateMap {
            map_id: request.target_map_id,
            payload: request.payload,
        });
    }
}

// =============================================================================
// Sub-screens
// =============================================================================

fn open_sub_screen(
    mut launches: MessageReader<LaunchSubScreen>,
    guard: Res<TransitionGuard>,
    mut mode: ResMut<ScreenMode>,
) {
    let Some(launch) = launches.read().last().cloned() else {
        return;
    };
    if guard.is_locked() {
        debug!("Ignoring {} launch during transition", launch.screen.title());
        return;
    }
    info!("Sub-screen open: {}", launch.screen.title());
    *mode = ScreenMode::SubScreen(launch);
}

/// Closes the sub-screen on the close key or any tap, resuming the map.
fn close_sub_screen(
    input: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<bevy::input::touch::Touches>,
    bindings: Res<InputBindings>,
    mut mode: ResMut<ScreenMode>,
    mut closed: MessageWriter<SubScreenClosed>,
) {
    let dismissed = input.just_pressed(bindings.close_screen)
        || mouse.just_pressed(MouseButton::Left)
        || touches.any_just_pressed();
    if !dismissed {
        return;
    }
    let ScreenMode::SubScreen(launch) = std::mem::take(&mut *mode) else {
        return;
    };
    info!("Sub-screen closed, resuming {}", launch.return_map);
    closed.write(SubScreenClosed {
        screen: launch.screen,
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::sample_content;
    use crate::progression::{ProgressData, RonProgressionStore};
    use crate::world::TransitionRequest;
    use bevy::ecs::system::SystemState;
    use std::time::Duration;

    #[test]
    fn fade_rises_and_flash_decays() {
        let mut fade = ScreenFade::default();
        assert_eq!(fade.alpha(0.0), 0.0);
        fade.start(1.0, 0.4);
        assert!((fade.alpha(1.2) - 0.5).abs() < 1e-5);
        assert_eq!(fade.alpha(2.0), 1.0);

        let mut flash = ScreenFlash::default();
        flash.start(1.0, 0.15);
        assert_eq!(flash.alpha(1.0), 1.0);
        assert_eq!(flash.alpha(1.5), 0.0);
    }

    #[test]
    fn sub_screen_reports_npc() {
        let screen = SubScreen::Mission {
            npc_id: "guide".to_string(),
            chapter: 1,
            lesson: 2,
            chapter_name: None,
            missions: Vec::new(),
        };
        assert_eq!(screen.npc_id(), "guide");
        assert_eq!(screen.title(), "Mission");
    }

    fn activation_world() -> World {
        let mut world = World::default();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs(10));
        world.insert_resource(time);
        world.insert_resource(NavConfig::default());
        world.insert_resource(Content::new(sample_content().expect("sample content")));
        world.insert_resource(Progression::new(RonProgressionStore::in_memory(
            ProgressData::default(),
        )));
        world.init_resource::<MapScreenScope>();
        world.init_resource::<TransitionGuard>();
        world.init_resource::<WorldView>();
        world.init_resource::<PortalRegistry>();
        world.init_resource::<MinimapState>();
        world.init_resource::<WorldZoom>();
        world.init_resource::<ScreenFade>();
        world.init_resource::<ScreenFlash>();
        world.init_resource::<ProximityState>();
        world.init_resource::<InteractionAffordance>();
        world.init_resource::<LockedMessages>();
        world.init_resource::<GreetingModal>();
        world.init_resource::<GestureRouter>();
        world.init_resource::<InteractionHistory>();
        world.init_resource::<EventLog>();
        world.init_resource::<Messages<ActivateMap>>();
        world.init_resource::<Messages<MapActivated>>();
        world
    }

    fn activate(world: &mut World, map_id: &str, payload: ActivationPayload) {
        world
            .resource_mut::<Messages<ActivateMap>>()
            .write(ActivateMap {
                map_id: map_id.to_string(),
                payload,
            });
        let mut system_state: SystemState<(
            Commands,
            MessageReader<ActivateMap>,
            Res<Time>,
            Res<NavConfig>,
            Res<Content>,
            ResMut<Progression>,
            ActivationState,
            InteractionReset,
            Query<Entity, With<MapScoped>>,
            MessageWriter<MapActivated>,
            ResMut<EventLog>,
        )> = SystemState::new(world);
        let (commands, requests, time, config, content, progression, state, interaction, scoped, activated, log) =
            system_state.get_mut(world);
        activate_map_screen(
            commands,
            requests,
            time,
            config,
            content,
            progression,
            state,
            interaction,
            scoped,
            activated,
            log,
        );
        system_state.apply(world);
    }

    fn scoped_count(world: &mut World) -> usize {
        world
            .query_filtered::<Entity, With<MapScoped>>()
            .iter(world)
            .count()
    }

    #[test]
    fn activation_spawns_map_and_records_visit() {
        let mut world = activation_world();
        activate(&mut world, "plaza", ActivationPayload::default());

        let view = world.resource::<WorldView>();
        assert_eq!(view.map_id, "plaza");
        assert!(world.resource::<MapScreenScope>().is_active());
        assert_eq!(world.resource::<PortalRegistry>().records().len(), 3);
        let progression = world.resource::<Progression>();
        assert!(progression.0.has_visited("plaza"));
        assert_eq!(progression.0.current_map_id(), Some("plaza"));
        assert!(scoped_count(&mut world) > 0);
    }

    #[test]
    fn reactivation_replaces_previous_entities() {
        let mut world = activation_world();
        activate(&mut world, "plaza", ActivationPayload::default());
        let first = scoped_count(&mut world);
        activate(&mut world, "plaza", ActivationPayload::default());
        assert_eq!(scoped_count(&mut world), first);
    }

    #[test]
    fn activation_invalidates_pending_handoffs_and_resets_lock() {
        let mut world = activation_world();
        activate(&mut world, "plaza", ActivationPayload::default());
        {
            let deadline = world.resource::<MapScreenScope>().deadline(10.0, 0.4);
            let mut guard = world.resource_mut::<TransitionGuard>();
            guard.try_begin_transition(
                TransitionRequest {
                    target_map_id: "harbor".to_string(),
                    payload: ActivationPayload::default(),
                },
                deadline,
            );
        }
        activate(&mut world, "bakery", ActivationPayload::default());

        let guard = world.resource::<TransitionGuard>();
        assert_eq!(guard.state(), LockState::Idle);
        assert!(!guard.has_pending());
    }

    #[test]
    fn returning_from_place_arms_immunity() {
        let mut world = activation_world();
        let payload = ActivationPayload {
            from_place: Some("bakery".to_string()),
            ..Default::default()
        };
        activate(&mut world, "plaza", payload);
        let view = world.resource::<WorldView>();
        assert!(view.is_immune("bakery", 10.2));
        assert!(!view.is_immune("bakery", 10.6));
    }

    #[test]
    fn unknown_map_falls_back_to_default() {
        let mut world = activation_world();
        activate(&mut world, "atlantis", ActivationPayload::default());
        assert_eq!(world.resource::<WorldView>().map_id, "plaza");
    }
}
