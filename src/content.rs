//! Static map, mission and dialogue content.
//!
//! Content is read from `assets/content.ron` when present; otherwise the built-in
//! sample world is used so the map screen never blocks on a missing file.

use bevy::prelude::*;
use std::fs;
use std::path::Path;

use crate::error::NavError;
use crate::world::MapDefinition;

pub const CONTENT_PATH: &str = "assets/content.ron";

// =============================================================================
// Content types
// =============================================================================

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChapterMeta {
    pub id: u32,
    pub name: String,
    pub cefr: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mission {
    pub id: String,
    pub chapter: u32,
    pub lesson: u32,
    pub title: String,
    #[serde(default)]
    pub reward_experience: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DialogueScript {
    pub chapter: u32,
    pub lesson: u32,
    pub speaker: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContentPack {
    pub default_map: String,
    pub maps: Vec<MapDefinition>,
    #[serde(default)]
    pub chapters: Vec<ChapterMeta>,
    #[serde(default)]
    pub missions: Vec<Mission>,
    #[serde(default)]
    pub dialogues: Vec<DialogueScript>,
}

// =============================================================================
// Cache interface
// =============================================================================

/// Read-only lookups into static content.
pub trait ContentCache: Send + Sync {
    fn map(&self, id: &str) -> Option<&MapDefinition>;
    fn default_map_id(&self) -> &str;
    fn missions_for(&self, chapter: u32, lesson: u32) -> Vec<Mission>;
    fn dialogue_for(&self, chapter: u32, lesson: u32) -> Option<DialogueScript>;
    fn chapter_meta(&self, id: u32) -> Option<ChapterMeta>;
}

impl ContentCache for ContentPack {
    fn map(&self, id: &str) -> Option<&MapDefinition> {
        self.maps.iter().find(|map| map.id == id)
    }

    fn default_map_id(&self) -> &str {
        &self.default_map
    }

    fn missions_for(&self, chapter: u32, lesson: u32) -> Vec<Mission> {
        self.missions
            .iter()
            .filter(|mission| mission.chapter == chapter && mission.lesson == lesson)
            .cloned()
            .collect()
    }

    fn dialogue_for(&self, chapter: u32, lesson: u32) -> Option<DialogueScript> {
        self.dialogues
            .iter()
            .find(|dialogue| dialogue.chapter == chapter && dialogue.lesson == lesson)
            .cloned()
    }

    fn chapter_meta(&self, id: u32) -> Option<ChapterMeta> {
        self.chapters.iter().find(|chapter| chapter.id == id).cloned()
    }
}

#[derive(Resource)]
pub struct Content(pub Box<dyn ContentCache>);

impl Content {
    pub fn new(cache: impl ContentCache + 'static) -> Self {
        Self(Box::new(cache))
    }

    /// Looks up a map, falling back to the default map for unknown ids.
    pub fn map_or_default(&self, id: &str) -> Result<&MapDefinition, NavError> {
        if let Some(map) = self.0.map(id) {
            return Ok(map);
        }
        let fallback = self.0.default_map_id();
        self.0
            .map(fallback)
            .ok_or_else(|| NavError::unknown_map(id))
    }
}

// =============================================================================
// Loading
// =============================================================================

pub fn parse_content(source: &str, contents: &str) -> Result<ContentPack, NavError> {
    ron::de::from_str::<ContentPack>(contents).map_err(|error| NavError::parse(source, error))
}

pub fn load_content_from_file(path: &Path) -> Result<Option<ContentPack>, NavError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents =
        fs::read_to_string(path).map_err(|error| NavError::read(path.display().to_string(), error))?;
    parse_content(&path.display().to_string(), &contents).map(Some)
}

pub fn sample_content() -> Result<ContentPack, NavError> {
    parse_content("built-in sample", SAMPLE_RON)
}

/// Loads content from disk, degrading to the built-in sample on any failure.
pub fn load_content_or_sample(path: &Path) -> Result<ContentPack, NavError> {
    match load_content_from_file(path) {
        Ok(Some(pack)) => {
            info!(
                "Loaded content from {} (maps: {})",
                path.display(),
                pack.maps.len()
            );
            Ok(pack)
        }
        Ok(None) => {
            info!("No content file at {}, using sample world", path.display());
            sample_content()
        }
        Err(error) => {
            warn!("Content load failed, using sample world: {}", error);
            sample_content()
        }
    }
}

const SAMPLE_RON: &str = r#"
(
    default_map: "plaza",
    maps: [
        (
            id: "plaza",
            name: "Old Town Plaza",
            width: 2400.0,
            height: 1600.0,
            spawn: (1200.0, 500.0),
            station_spawns: [
                (key: "harbor_line", x: 2060.0, y: 420.0),
            ],
            place_spawns: [
                (key: "bakery", x: 620.0, y: 1040.0),
            ],
            npcs: [
                (
                    id: "florist",
                    name: "Florist",
                    x: 980.0,
                    y: 640.0,
                    greeting: "Fresh tulips today!",
                    has_dialogue: true,
                    chapter: 1,
                    lesson: 1,
                ),
                (
                    id: "guide",
                    name: "Town Guide",
                    x: 1420.0,
                    y: 720.0,
                    greeting: "Welcome to the plaza.",
                    has_mission: true,
                    has_dialogue: true,
                    chapter: 1,
                    lesson: 2,
                ),
                (
                    id: "busker",
                    name: "Busker",
                    x: 1700.0,
                    y: 980.0,
                    greeting: "Any requests?",
                ),
            ],
            portals: [
                (
                    id: "bakery_door",
                    label: "Bakery",
                    x: 620.0,
                    y: 1120.0,
                    target_map_id: "bakery",
                    place: true,
                ),
                (
                    id: "harbor_road",
                    label: "Harbor Road",
                    x: 2340.0,
                    y: 800.0,
                    target_map_id: "harbor",
                    required_level: 2,
                ),
            ],
            gates: [
                (
                    id: "plaza_station",
                    label: "Harbor Line",
                    x: 2060.0,
                    y: 320.0,
                    target_map_id: "harbor",
                    required_level: 1,
                    station_id: "plaza_station",
                ),
            ],
            buildings: [
                (x: 620.0, y: 1240.0, width: 260.0, height: 180.0),
                (x: 1200.0, y: 1300.0, width: 420.0, height: 220.0),
                (x: 1800.0, y: 1280.0, width: 300.0, height: 200.0),
            ],
        ),
        (
            id: "bakery",
            name: "Corner Bakery",
            width: 800.0,
            height: 600.0,
            parent: Some("plaza"),
            spawn: (400.0, 140.0),
            npcs: [
                (
                    id: "baker",
                    name: "Baker",
                    x: 400.0,
                    y: 420.0,
                    greeting: "Mind the oven.",
                    has_mission: true,
                    chapter: 1,
                    lesson: 3,
                ),
            ],
            portals: [
                (
                    id: "bakery_exit",
                    label: "Exit",
                    x: 400.0,
                    y: 40.0,
                    target_map_id: "plaza",
                ),
            ],
        ),
        (
            id: "harbor",
            name: "Harbor",
            width: 3200.0,
            height: 1800.0,
            spawn: (300.0, 900.0),
            station_spawns: [
                (key: "plaza_station", x: 420.0, y: 1500.0),
            ],
            npcs: [
                (
                    id: "fisher",
                    name: "Fisher",
                    x: 1600.0,
                    y: 700.0,
                    greeting: "The tide is turning.",
                    has_dialogue: true,
                    chapter: 2,
                    lesson: 1,
                ),
            ],
            portals: [
                (
                    id: "plaza_road",
                    label: "Old Town",
                    x: 60.0,
                    y: 900.0,
                    target_map_id: "plaza",
                ),
            ],
            gates: [
                (
                    id: "harbor_station",
                    label: "Ferry Terminal",
                    x: 420.0,
                    y: 1600.0,
                    target_map_id: "plaza",
                    station_id: "harbor_line",
                    international: true,
                ),
            ],
        ),
    ],
    chapters: [
        (id: 1, name: "First Steps", cefr: "A1"),
        (id: 2, name: "By the Sea", cefr: "A2"),
    ],
    missions: [
        (id: "find-fountain", chapter: 1, lesson: 2, title: "Find the fountain", reward_experience: 20),
        (id: "buy-bread", chapter: 1, lesson: 3, title: "Buy a loaf of bread", reward_experience: 30),
    ],
    dialogues: [
        (
            chapter: 1,
            lesson: 1,
            speaker: "Florist",
            lines: ["Hello!", "Would you like some flowers?"],
        ),
        (
            chapter: 1,
            lesson: 2,
            speaker: "Town Guide",
            lines: ["The fountain is north of here."],
        ),
        (
            chapter: 2,
            lesson: 1,
            speaker: "Fisher",
            lines: ["Boats leave at dawn."],
        ),
    ],
)
"#;

// =============================================================================
// Tests
// =============================================================================
