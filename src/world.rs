use bevy::prelude::*;

pub type MapId = String;

// =============================================================================
// Static map content
// =============================================================================

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapDefinition {
    pub id: MapId,
    pub name: String,
    pub width: f32,
    pub height: f32,
    /// Parent map for enterable places; `None` for top-level maps.
    #[serde(default)]
    pub parent: Option<MapId>,
    pub spawn: (f32, f32),
    #[serde(default)]
    pub station_spawns: Vec<SpawnPoint>,
    #[serde(default)]
    pub place_spawns: Vec<SpawnPoint>,
    #[serde(default)]
    pub npcs: Vec<NpcDef>,
    #[serde(default)]
    pub portals: Vec<PortalDef>,
    #[serde(default)]
    pub gates: Vec<GateDef>,
    #[serde(default)]
    pub buildings: Vec<BuildingDef>,
}

impl MapDefinition {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn is_sub_place(&self) -> bool {
        self.parent.is_some()
    }

    pub fn default_spawn(&self) -> Vec2 {
        Vec2::new(self.spawn.0, self.spawn.1)
    }

    /// Picks the arrival point: explicit coordinates win, then the station table
    /// for `from_station`, then the place table for `from_place`, then the default.
    pub fn resolve_spawn(&self, payload: &ActivationPayload) -> Vec2 {
        if let Some(spawn) = payload.spawn {
            return self.clamp_to_bounds(spawn);
        }
        if let Some(station) = payload.from_station.as_deref() {
            if let Some(point) = find_spawn(&self.station_spawns, station) {
                return point;
            }
        }
        if let Some(place) = payload.from_place.as_deref() {
            if let Some(point) = find_spawn(&self.place_spawns, place) {
                return point;
            }
        }
        self.default_spawn()
    }

    pub fn clamp_to_bounds(&self, point: Vec2) -> Vec2 {
        point.clamp(Vec2::ZERO, self.size().max(Vec2::ZERO))
    }
}

fn find_spawn(points: &[SpawnPoint], key: &str) -> Option<Vec2> {
    points
        .iter()
        .find(|point| point.key == key)
        .map(|point| Vec2::new(point.x, point.y))
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpawnPoint {
    pub key: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NpcDef {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub greeting: String,
    #[serde(default)]
    pub has_mission: bool,
    #[serde(default)]
    pub has_dialogue: bool,
    #[serde(default)]
    pub chapter: u32,
    #[serde(default)]
    pub lesson: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PortalDef {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub target_map_id: MapId,
    #[serde(default)]
    pub required_level: u32,
    /// Target is an enterable place whose exit returns here.
    #[serde(default)]
    pub place: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GateDef {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub target_map_id: MapId,
    #[serde(default)]
    pub required_level: u32,
    pub station_id: String,
    #[serde(default)]
    pub international: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BuildingDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

// =============================================================================
// Activation payloads
// =============================================================================

/// Data handed to the next map-screen activation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivationPayload {
    /// Map the player is leaving, used for contextual spawning.
    pub origin: Option<MapId>,
    pub from_station: Option<String>,
    pub from_place: Option<MapId>,
    pub spawn: Option<Vec2>,
}

impl ActivationPayload {
    pub fn from_origin(origin: impl Into<MapId>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRequest {
    pub target_map_id: MapId,
    pub payload: ActivationPayload,
}

// =============================================================================
// Map-scoped entities
// =============================================================================

/// Marker for every entity that lives exactly as long as one map-screen activation.
#[derive(Component, Debug, Default)]
pub struct MapScoped;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Interactable {
    pub id: String,
    pub position: Vec2,
    pub kind: InteractableKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractableKind {
    Npc(NpcInfo),
    Portal(PortalInfo),
    Gate(GateInfo),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NpcInfo {
    pub name: String,
    pub greeting: String,
    pub has_mission: bool,
    pub has_dialogue: bool,
    pub chapter: u32,
    pub lesson: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortalInfo {
    pub label: String,
    pub target_map_id: MapId,
    pub required_level: u32,
    pub place: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GateInfo {
    pub label: String,
    pub target_map_id: MapId,
    pub required_level: u32,
    pub station_id: String,
}

impl Interactable {
    pub fn from_npc(def: &NpcDef) -> Self {
        Self {
            id: def.id.clone(),
            position: Vec2::new(def.x, def.y),
            kind: InteractableKind::Npc(NpcInfo {
                name: def.name.clone(),
                greeting: def.greeting.clone(),
                has_mission: def.has_mission,
                has_dialogue: def.has_dialogue,
                chapter: def.chapter,
                lesson: def.lesson,
            }),
        }
    }

    pub fn from_portal(def: &PortalDef) -> Self {
        Self {
            id: def.id.clone(),
            position: Vec2::new(def.x, def.y),
            kind: InteractableKind::Portal(PortalInfo {
                label: def.label.clone(),
                target_map_id: def.target_map_id.clone(),
                required_level: def.required_level,
                place: def.place,
            }),
        }
    }

    pub fn from_gate(def: &GateDef) -> Self {
        Self {
            id: def.id.clone(),
            position: Vec2::new(def.x, def.y),
            kind: InteractableKind::Gate(GateInfo {
                label: def.label.clone(),
                target_map_id: def.target_map_id.clone(),
                required_level: def.required_level,
                station_id: def.station_id.clone(),
            }),
        }
    }

    pub fn npc(&self) -> Option<&NpcInfo> {
        match &self.kind {
            InteractableKind::Npc(info) => Some(info),
            InteractableKind::Portal(_) | InteractableKind::Gate(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match &self.kind {
            InteractableKind::Npc(info) => &info.name,
            InteractableKind::Portal(info) => &info.label,
            InteractableKind::Gate(info) => &info.label,
        }
    }
}

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Building {
    pub size: Vec2,
}

// =============================================================================
// Active map
// =============================================================================

/// Blocks the portal leading back into a just-exited place.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceImmunity {
    pub place_id: MapId,
    pub until: f64,
}

/// The map the current activation shows.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct WorldView {
    pub map_id: MapId,
    pub map_name: String,
    pub size: Vec2,
    pub parent: Option<MapId>,
    pub place_immunity: Option<PlaceImmunity>,
}

impl WorldView {
    pub fn reset_for(&mut self, map: &MapDefinition) {
        self.map_id = map.id.clone();
        self.map_name = map.name.clone();
        self.size = map.size();
        self.parent = map.parent.clone();
        self.place_immunity = None;
    }

    pub fn is_sub_place(&self) -> bool {
        self.parent.is_some()
    }

    pub fn arm_immunity(&mut self, place_id: &str, now: f64, seconds: f64) {
        self.place_immunity = Some(PlaceImmunity {
            place_id: place_id.to_string(),
            until: now + seconds,
        });
    }

    pub fn is_immune(&self, place_id: &str, now: f64) -> bool {
        self.place_immunity
            .as_ref()
            .is_some_and(|immunity| immunity.place_id == place_id && now < immunity.until)
    }
}
