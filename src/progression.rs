//! Player progression: experience, coins, visited maps and avatar positions.

use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::NavError;

pub const SAVE_PATH: &str = "saves/progress.ron";
pub const EXPERIENCE_PER_LEVEL: u32 = 100;
pub const DEFAULT_CHARACTER: &str = "aria";

/// Read/mutate/save access to persistent progression.
pub trait ProgressionStore: Send + Sync {
    fn current_level(&self) -> u32;
    fn experience(&self) -> u32;
    fn coins(&self) -> u32;
    fn add_experience(&mut self, amount: u32);
    fn add_coins(&mut self, amount: u32);
    fn mark_map_visited(&mut self, map_id: &str);
    fn has_visited(&self, map_id: &str) -> bool;
    /// Best-effort write; callers log failures and carry on.
    fn save(&mut self) -> Result<(), NavError>;

    fn current_character_id(&self) -> &str;
    fn set_current_character_id(&mut self, character_id: &str);
    fn current_map_id(&self) -> Option<&str>;
    fn set_current_map_id(&mut self, map_id: &str);
    fn last_station_id(&self) -> Option<&str>;
    fn set_last_station_id(&mut self, station_id: &str);
    /// Parent map to return to when leaving an enterable place.
    fn return_map_id(&self) -> Option<&str>;
    fn set_return_map_id(&mut self, map_id: Option<&str>);
    fn character_position(&self, character_id: &str) -> Option<SavedPosition>;
    fn set_character_position(&mut self, character_id: &str, position: SavedPosition);
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SavedPosition {
    pub map_id: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProgressData {
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub visited_maps: Vec<String>,
    pub character_id: String,
    #[serde(default)]
    pub current_map_id: Option<String>,
    #[serde(default)]
    pub last_station_id: Option<String>,
    #[serde(default)]
    pub return_map_id: Option<String>,
    #[serde(default)]
    pub positions: Vec<(String, SavedPosition)>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            experience: 0,
            coins: 0,
            visited_maps: Vec::new(),
            character_id: DEFAULT_CHARACTER.to_string(),
            current_map_id: None,
            last_station_id: None,
            return_map_id: None,
            positions: Vec::new(),
        }
    }
}

/// Progression backed by a RON file. A store without a path never touches disk.
#[derive(Debug, Default)]
pub struct RonProgressionStore {
    pub data: ProgressData,
    path: Option<PathBuf>,
}

impl RonProgressionStore {
    pub fn in_memory(data: ProgressData) -> Self {
        Self {
            data,
            path: None,
        }
    }

    pub fn at_path(data: ProgressData, path: impl Into<PathBuf>) -> Self {
        Self {
            data,
            path: Some(path.into()),
        }
    }

    /// Loads progression from disk, starting fresh when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        let data = match read_progress(path) {
            Ok(Some(data)) => {
                info!("Loaded progression from {}", path.display());
                data
            }
            Ok(None) => ProgressData::default(),
            Err(error) => {
                warn!("Progression load failed, starting fresh: {}", error);
                ProgressData::default()
            }
        };
        Self::at_path(data, path)
    }
}

fn read_progress(path: &Path) -> Result<Option<ProgressData>, NavError> {
    if !path.exists() {
        return Ok(None);
    }
    let source = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|error| NavError::read(&source, error))?;
    ron::de::from_str::<ProgressData>(&contents)
        .map(Some)
        .map_err(|error| NavError::parse(source, error))
}

fn write_progress(path: &Path, data: &ProgressData) -> Result<(), NavError> {
    let source = path.display().to_string();
    let config = ron::ser::PrettyConfig::default();
    let contents = ron::ser::to_string_pretty(data, config)
        .map_err(|error| NavError::write(&source, error))?;

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|error| NavError::write(&source, error))?;
        }
    }

    fs::write(path, contents).map_err(|error| NavError::write(source, error))
}

impl ProgressionStore for RonProgressionStore {
    fn current_level(&self) -> u32 {
        self.data.experience / EXPERIENCE_PER_LEVEL
    }

    fn experience(&self) -> u32 {
        self.data.experience
    }

    fn coins(&self) -> u32 {
        self.data.coins
    }

    fn add_experience(&mut self, amount: u32) {
        self.data.experience = self.data.experience.saturating_add(amount);
    }

    fn add_coins(&mut self, amount: u32) {
        self.data.coins = self.data.coins.saturating_add(amount);
    }

    fn mark_map_visited(&mut self, map_id: &str) {
        if !self.has_visited(map_id) {
            self.data.visited_maps.push(map_id.to_string());
        }
    }

    fn has_visited(&self, map_id: &str) -> bool {
        self.data.visited_maps.iter().any(|id| id == map_id)
    }

    fn save(&mut self) -> Result<(), NavError> {
        match &self.path {
            Some(path) => write_progress(path, &self.data),
            None => Ok(()),
        }
    }

    fn current_character_id(&self) -> &str {
        &self.data.character_id
    }

    fn set_current_character_id(&mut self, character_id: &str) {
        self.data.character_id = character_id.to_string();
    }

    fn current_map_id(&self) -> Option<&str> {
        self.data.current_map_id.as_deref()
    }

    fn set_current_map_id(&mut self, map_id: &str) {
        self.data.current_map_id = Some(map_id.to_string());
    }

    fn last_station_id(&self) -> Option<&str> {
        self.data.last_station_id.as_deref()
    }

    fn set_last_station_id(&mut self, station_id: &str) {
        self.data.last_station_id = Some(station_id.to_string());
    }

    fn return_map_id(&self) -> Option<&str> {
        self.data.return_map_id.as_deref()
    }

    fn set_return_map_id(&mut self, map_id: Option<&str>) {
        self.data.return_map_id = map_id.map(str::to_string);
    }

    fn character_position(&self, character_id: &str) -> Option<SavedPosition> {
        self.data
            .positions
            .iter()
            .find(|(id, _)| id == character_id)
            .map(|(_, position)| position.clone())
    }

    fn set_character_position(&mut self, character_id: &str, position: SavedPosition) {
        match self
            .data
            .positions
            .iter_mut()
            .find(|(id, _)| id == character_id)
        {
            Some(entry) => entry.1 = position,
            None => self
                .data
                .positions
                .push((character_id.to_string(), position)),
        }
    }
}

#[derive(Resource)]
pub struct Progression(pub Box<dyn ProgressionStore>);

impl Progression {
    pub fn new(store: impl ProgressionStore + 'static) -> Self {
        Self(Box::new(store))
    }

    /// Saves and swallows failures after logging them.
    pub fn persist(&mut self) -> bool {
        match self.0.save() {
            Ok(()) => true,
            Err(error) => {
                error!("Save failed: {}", error);
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_derives_from_experience() {
        let mut store = RonProgressionStore::in_memory(ProgressData::default());
        assert_eq!(store.current_level(), 0);
        store.add_experience(150);
        assert_eq!(store.current_level(), 1);
        store.add_experience(50);
        assert_eq!(store.current_level(), 2);
    }

    #[test]
    fn visiting_twice_records_once() {
        let mut store = RonProgressionStore::in_memory(ProgressData::default());
        store.mark_map_visited("plaza");
        store.mark_map_visited("plaza");
        assert_eq!(store.data.visited_maps, vec!["plaza".to_string()]);
    }

    #[test]
    fn character_positions_overwrite_in_place() {
        let mut store = RonProgressionStore::in_memory(ProgressData::default());
        let first = SavedPosition {
            map_id: "plaza".to_string(),
            x: 1.0,
            y: 2.0,
        };
        let second = SavedPosition {
            map_id: "harbor".to_string(),
            x: 3.0,
            y: 4.0,
        };
        store.set_character_position("aria", first);
        store.set_character_position("aria", second.clone());
        assert_eq!(store.data.positions.len(), 1);
        assert_eq!(store.character_position("aria"), Some(second));
        assert!(store.character_position("bram").is_none());
    }

    #[test]
    fn in_memory_save_never_touches_disk() {
        let mut store = RonProgressionStore::in_memory(ProgressData::default());
        assert!(store.save().is_ok());
    }

    #[test]
    fn failed_save_is_swallowed() {
        let blocker = std::env::temp_dir().join("wayfarer-progress-blocker");
        fs::write(&blocker, "not a directory").expect("write blocker file");
        let store = RonProgressionStore::at_path(
            ProgressData::default(),
            blocker.join("nested").join("progress.ron"),
        );
        let mut progression = Progression::new(store);
        assert!(!progression.persist());
        let _ = fs::remove_file(&blocker);
    }

    #[test]
    fn save_then_load_restores_data() {
        let path = std::env::temp_dir()
            .join("wayfarer-progress-test")
            .join("progress.ron");
        let mut data = ProgressData::default();
        data.experience = 240;
        data.coins = 12;
        data.current_map_id = Some("harbor".to_string());
        let mut store = RonProgressionStore::at_path(data.clone(), &path);
        store.save().expect("save should succeed");

        let loaded = RonProgressionStore::load_or_default(&path);
        assert_eq!(loaded.data, data);
        let _ = fs::remove_file(&path);
    }
}
