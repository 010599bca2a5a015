//! Portal and gate evaluation: lock checks, locked notices and travel requests.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::plugins::core::{EventLog, NavConfig};
use crate::plugins::gestures::WorldTap;
use crate::plugins::screens::{Deadline, MapScreenScope, ScreenFade, TransitionGuard};
use crate::progression::Progression;
use crate::world::{ActivationPayload, MapDefinition, MapId, TransitionRequest, WorldView};

use super::components::PlayerAvatar;

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalClass {
    /// Walkway to another top-level map.
    Portal,
    /// Door into an enterable place.
    Place,
    /// Station gate; arrival uses the destination's station spawn table.
    /// International gates fade out slower than subway ones.
    Gate,
}

/// A portal or gate as evaluated at activation time.
#[derive(Clone, Debug, PartialEq)]
pub struct PortalRecord {
    pub id: String,
    pub label: String,
    pub position: Vec2,
    pub target_map_id: MapId,
    pub required_level: u32,
    pub locked: bool,
    pub class: PortalClass,
    pub station_id: Option<String>,
    pub international: bool,
}

pub fn is_locked(player_level: u32, required_level: u32) -> bool {
    player_level < required_level
}

/// Portals of the active map. Locks are computed once when the map activates
/// and do not change if the player levels up mid-visit.
#[derive(Resource, Debug, Default)]
pub struct PortalRegistry {
    records: Vec<PortalRecord>,
}

impl PortalRegistry {
    pub fn build(map: &MapDefinition, player_level: u32) -> Self {
        let portals = map.portals.iter().map(|portal| PortalRecord {
            id: portal.id.clone(),
            label: portal.label.clone(),
            position: Vec2::new(portal.x, portal.y),
            target_map_id: portal.target_map_id.clone(),
            required_level: portal.required_level,
            locked: is_locked(player_level, portal.required_level),
            class: if portal.place {
                PortalClass::Place
            } else {
                PortalClass::Portal
            },
            station_id: None,
            international: false,
        });
        let gates = map.gates.iter().map(|gate| PortalRecord {
            id: gate.id.clone(),
            label: gate.label.clone(),
            position: Vec2::new(gate.x, gate.y),
            target_map_id: gate.target_map_id.clone(),
            required_level: gate.required_level,
            locked: is_locked(player_level, gate.required_level),
            class: PortalClass::Gate,
            station_id: Some(gate.station_id.clone()),
            international: gate.international,
        });
        Self {
            records: portals.chain(gates).collect(),
        }
    }

    pub fn records(&self) -> &[PortalRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&PortalRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Nearest record within `radius` of `point`.
    pub fn nearest_within(&self, point: Vec2, radius: f32) -> Option<&PortalRecord> {
        self.records
            .iter()
            .map(|record| (record, record.position.distance(point)))
            .filter(|(_, distance)| *distance < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(record, _)| record)
    }
}

// =============================================================================
// Decisions
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum PortalDecision {
    Travel {
        request: TransitionRequest,
        fade_seconds: f64,
    },
    Locked {
        required_level: u32,
    },
    /// The player just left this place; entering it again is suppressed.
    Immune,
}

pub fn evaluate_portal(
    record: &PortalRecord,
    world_view: &WorldView,
    now: f64,
    config: &NavConfig,
) -> PortalDecision {
    if record.class == PortalClass::Place && world_view.is_immune(&record.target_map_id, now) {
        return PortalDecision::Immune;
    }
    if record.locked {
        return PortalDecision::Locked {
            required_level: record.required_level,
        };
    }

    let mut payload = ActivationPayload::from_origin(world_view.map_id.clone());
    let fade_seconds = match record.class {
        PortalClass::Gate => {
            payload.from_station = record.station_id.clone();
            if record.international {
                config.international_fade_seconds
            } else {
                config.gate_fade_seconds
            }
        }
        PortalClass::Place => config.portal_fade_seconds,
        PortalClass::Portal => {
            if world_view.parent.as_deref() == Some(record.target_map_id.as_str()) {
                payload.from_place = Some(world_view.map_id.clone());
            }
            config.portal_fade_seconds
        }
    };

    PortalDecision::Travel {
        request: TransitionRequest {
            target_map_id: record.target_map_id.clone(),
            payload,
        },
        fade_seconds,
    }
}

// =============================================================================
// Locked notices
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct LockedNotice {
    pub portal_id: String,
    pub text: String,
    pub deadline: Deadline,
}

/// At most one visible notice per portal; each expires on its own deadline.
#[derive(Resource, Debug, Default)]
pub struct LockedMessages {
    notices: Vec<LockedNotice>,
}

impl LockedMessages {
    pub fn try_show(&mut self, portal_id: &str, text: String, deadline: Deadline) -> bool {
        if self.is_showing(portal_id) {
            return false;
        }
        self.notices.push(LockedNotice {
            portal_id: portal_id.to_string(),
            text,
            deadline,
        });
        true
    }

    pub fn is_showing(&self, portal_id: &str) -> bool {
        self.notices.iter().any(|notice| notice.portal_id == portal_id)
    }

    pub fn latest(&self) -> Option<&LockedNotice> {
        self.notices.last()
    }

    pub fn expire(&mut self, now: f64, scope: &MapScreenScope) {
        self.notices
            .retain(|notice| scope.is_live(notice.deadline.token) && !notice.deadline.is_due(now));
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

// =============================================================================
// Travel
// =============================================================================

#[derive(SystemParam)]
pub struct PortalTravel<'w> {
    time: Res<'w, Time>,
    config: Res<'w, NavConfig>,
    scope: Res<'w, MapScreenScope>,
    world_view: Res<'w, WorldView>,
    guard: ResMut<'w, TransitionGuard>,
    fade: ResMut<'w, ScreenFade>,
    locked: ResMut<'w, LockedMessages>,
    progression: ResMut<'w, Progression>,
    log: ResMut<'w, EventLog>,
}

impl PortalTravel<'_> {
    /// Returns `true` when a transition was started. Nothing is posted while
    /// another transition holds the guard.
    pub fn enter(&mut self, record: &PortalRecord) -> bool {
        if self.guard.is_locked() {
            return false;
        }
        let now = self.time.elapsed_secs_f64();
        match evaluate_portal(record, &self.world_view, now, &self.config) {
            PortalDecision::Immune => false,
            PortalDecision::Locked { required_level } => {
                let text = format!("{} is locked (level {} required)", record.label, required_level);
                let deadline = self.scope.deadline(now, self.config.locked_message_seconds);
                if self.locked.try_show(&record.id, text.clone(), deadline) {
                    self.log.push(text);
                }
                false
            }
            PortalDecision::Travel {
                request,
                fade_seconds,
            } => {
                let deadline = self.scope.deadline(now, fade_seconds);
                if !self.guard.try_begin_transition(request, deadline) {
                    return false;
                }
                self.fade.start(now, fade_seconds);
                self.record_departure(record);
                info!("Travelling to {} via {}", record.target_map_id, record.id);
                let verb = if record.international {
                    "Boarding"
                } else {
                    "Travelling"
                };
                self.log.push(format!("{}: {}", verb, record.label));
                true
            }
        }
    }

    fn record_departure(&mut self, record: &PortalRecord) {
        let store = &mut self.progression.0;
        match record.class {
            PortalClass::Gate => {
                if let Some(station) = record.station_id.as_deref() {
                    store.set_last_station_id(station);
                }
            }
            PortalClass::Place => store.set_return_map_id(Some(&self.world_view.map_id)),
            PortalClass::Portal => {
                if self.world_view.is_sub_place() {
                    store.set_return_map_id(None);
                }
            }
        }
        if !self.progression.persist() {
            self.log.push("Progress could not be saved".to_string());
        }
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn handle_portal_overlap(
    players: Query<&Transform, With<PlayerAvatar>>,
    registry: Res<PortalRegistry>,
    mut travel: PortalTravel,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let radius = travel.config.portal_radius;
    if let Some(record) = registry.nearest_within(player.translation.truncate(), radius) {
        travel.enter(record);
    }
}

pub fn handle_portal_taps(
    mut taps: MessageReader<WorldTap>,
    registry: Res<PortalRegistry>,
    mut travel: PortalTravel,
) {
    for tap in taps.read() {
        let radius = travel.config.portal_radius;
        if let Some(record) = registry.nearest_within(tap.world, radius) {
            travel.enter(record);
        }
    }
}

pub fn expire_locked_messages(
    time: Res<Time>,
    scope: Res<MapScreenScope>,
    mut locked: ResMut<LockedMessages>,
) {
    locked.expire(time.elapsed_secs_f64(), &scope);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{sample_content, ContentCache};
    use crate::plugins::screens::LockState;
    use crate::progression::{ProgressData, ProgressionStore, RonProgressionStore};
    use bevy::ecs::system::SystemState;
    use std::time::Duration;

    fn plaza() -> MapDefinition {
        sample_content()
            .expect("sample content")
            .map("plaza")
            .cloned()
            .expect("plaza map")
    }

    fn bakery() -> MapDefinition {
        sample_content()
            .expect("sample content")
            .map("bakery")
            .cloned()
            .expect("bakery map")
    }

    fn harbor() -> MapDefinition {
        sample_content()
            .expect("sample content")
            .map("harbor")
            .cloned()
            .expect("harbor map")
    }

    fn view_of(map: &MapDefinition) -> WorldView {
        let mut view = WorldView::default();
        view.reset_for(map);
        view
    }

    #[test]
    fn lock_compares_level_strictly() {
        assert!(is_locked(1, 2));
        assert!(!is_locked(2, 2));
        assert!(!is_locked(0, 0));
    }

    #[test]
    fn registry_evaluates_locks_at_build() {
        let registry = PortalRegistry::build(&plaza(), 1);
        assert!(!registry.get("bakery_door").expect("bakery door").locked);
        assert!(registry.get("harbor_road").expect("harbor road").locked);
        assert!(!registry.get("plaza_station").expect("station").locked);
        assert_eq!(
            registry.get("plaza_station").map(|record| record.class),
            Some(PortalClass::Gate)
        );
    }

    #[test]
    fn locked_portal_never_travels() {
        let map = plaza();
        let registry = PortalRegistry::build(&map, 0);
        let record = registry.get("harbor_road").expect("harbor road");
        assert_eq!(
            evaluate_portal(record, &view_of(&map), 0.0, &NavConfig::default()),
            PortalDecision::Locked { required_level: 2 }
        );
    }

    #[test]
    fn gate_carries_station_and_slower_fade() {
        let map = plaza();
        let registry = PortalRegistry::build(&map, 1);
        let record = registry.get("plaza_station").expect("station");
        let PortalDecision::Travel {
            request,
            fade_seconds,
        } = evaluate_portal(record, &view_of(&map), 0.0, &NavConfig::default())
        else {
            panic!("expected travel");
        };
        assert_eq!(fade_seconds, 0.45);
        assert_eq!(request.target_map_id, "harbor");
        assert_eq!(request.payload.from_station.as_deref(), Some("plaza_station"));
        assert_eq!(request.payload.origin.as_deref(), Some("plaza"));
    }

    #[test]
    fn exiting_place_marks_from_place() {
        let map = bakery();
        let registry = PortalRegistry::build(&map, 0);
        let record = registry.get("bakery_exit").expect("exit");
        let PortalDecision::Travel { request, .. } =
            evaluate_portal(record, &view_of(&map), 0.0, &NavConfig::default())
        else {
            panic!("expected travel");
        };
        assert_eq!(request.target_map_id, "plaza");
        assert_eq!(request.payload.from_place.as_deref(), Some("bakery"));
    }

    #[test]
    fn returning_player_is_immune_to_place_door() {
        let map = plaza();
        let mut view = view_of(&map);
        view.arm_immunity("bakery", 10.0, 0.5);
        let registry = PortalRegistry::build(&map, 0);
        let door = registry.get("bakery_door").expect("door");
        let config = NavConfig::default();
        assert_eq!(evaluate_portal(door, &view, 10.1, &config), PortalDecision::Immune);
        assert!(matches!(
            evaluate_portal(door, &view, 10.6, &config),
            PortalDecision::Travel { .. }
        ));
    }

    #[test]
    fn nearest_within_uses_strict_radius() {
        let registry = PortalRegistry::build(&plaza(), 0);
        assert_eq!(
            registry
                .nearest_within(Vec2::new(620.0, 1100.0), 40.0)
                .map(|record| record.id.as_str()),
            Some("bakery_door")
        );
        assert!(registry.nearest_within(Vec2::new(620.0, 1080.0), 40.0).is_none());
    }

    #[test]
    fn locked_notice_shows_once_until_expired() {
        let mut scope = MapScreenScope::default();
        scope.begin();
        let mut messages = LockedMessages::default();
        assert!(messages.try_show("harbor_road", "locked".to_string(), scope.deadline(0.0, 2.0)));
        assert!(!messages.try_show("harbor_road", "locked".to_string(), scope.deadline(0.5, 2.0)));
        assert!(messages.try_show("other", "locked".to_string(), scope.deadline(0.5, 2.0)));

        messages.expire(2.0, &scope);
        assert!(!messages.is_showing("harbor_road"));
        assert!(messages.is_showing("other"));

        scope.end();
        messages.expire(2.1, &scope);
        assert!(messages.latest().is_none());
    }

    fn travel_world(map: &MapDefinition, level_experience: u32) -> World {
        let mut world = World::default();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs(5));
        world.insert_resource(time);
        world.insert_resource(NavConfig::default());
        let mut scope = MapScreenScope::default();
        scope.begin();
        world.insert_resource(scope);
        world.insert_resource(view_of(map));
        world.init_resource::<TransitionGuard>();
        world.init_resource::<ScreenFade>();
        world.init_resource::<LockedMessages>();
        world.init_resource::<EventLog>();
        let mut data = ProgressData::default();
        data.experience = level_experience;
        world.insert_resource(Progression::new(RonProgressionStore::in_memory(data)));
        world
    }

    fn enter(world: &mut World, record: &PortalRecord) -> bool {
        let mut system_state: SystemState<PortalTravel> = SystemState::new(world);
        let mut travel = system_state.get_mut(world);
        let started = travel.enter(record);
        system_state.apply(world);
        started
    }

    #[test]
    fn entering_place_records_return_map_and_locks_guard() {
        let map = plaza();
        let mut world = travel_world(&map, 0);
        let registry = PortalRegistry::build(&map, 0);
        let door = registry.get("bakery_door").expect("door").clone();

        assert!(enter(&mut world, &door));
        assert!(!enter(&mut world, &door));

        assert_eq!(world.resource::<TransitionGuard>().state(), LockState::Transitioning);
        assert!(world.resource::<ScreenFade>().is_active());
        let progression = world.resource::<Progression>();
        assert_eq!(progression.0.return_map_id(), Some("plaza"));
    }

    #[test]
    fn locked_gate_posts_single_notice() {
        let map = plaza();
        let mut world = travel_world(&map, 0);
        let registry = PortalRegistry::build(&map, 0);
        let gate = registry.get("plaza_station").expect("gate").clone();

        assert!(!enter(&mut world, &gate));
        assert!(!enter(&mut world, &gate));

        assert!(!world.resource::<TransitionGuard>().is_locked());
        assert_eq!(world.resource::<EventLog>().entries().len(), 1);
        assert!(world.resource::<LockedMessages>().is_showing("plaza_station"));
    }

    #[test]
    fn locked_portal_is_silent_during_another_fade() {
        let map = plaza();
        let mut world = travel_world(&map, 0);
        let registry = PortalRegistry::build(&map, 0);
        let door = registry.get("bakery_door").expect("door").clone();
        let gate = registry.get("plaza_station").expect("gate").clone();

        assert!(enter(&mut world, &door));
        assert!(!enter(&mut world, &gate));

        assert!(!world.resource::<LockedMessages>().is_showing("plaza_station"));
        assert_eq!(world.resource::<EventLog>().entries().len(), 1);
    }

    #[test]
    fn international_gate_boards_with_longer_fade() {
        let map = harbor();
        let registry = PortalRegistry::build(&map, 0);
        let gate = registry.get("harbor_station").expect("ferry gate").clone();
        assert!(gate.international);

        let config = NavConfig::default();
        let PortalDecision::Travel { fade_seconds, .. } =
            evaluate_portal(&gate, &view_of(&map), 0.0, &config)
        else {
            panic!("expected travel");
        };
        assert_eq!(fade_seconds, config.international_fade_seconds);
        assert!(fade_seconds > config.gate_fade_seconds);

        let mut world = travel_world(&map, 0);
        assert!(enter(&mut world, &gate));
        assert_eq!(
            world.resource::<EventLog>().entries().last().map(String::as_str),
            Some("Boarding: Ferry Terminal")
        );
        assert_eq!(
            world.resource::<Progression>().0.last_station_id(),
            Some("harbor_line")
        );
    }
}
