use bevy::prelude::*;
use std::path::Path;

use crate::content::{load_content_or_sample, Content, ContentPack, CONTENT_PATH};
use crate::progression::{Progression, RonProgressionStore, SAVE_PATH};

pub struct CorePlugin;

/// Tuning values for the navigation layer.
#[derive(Resource, Debug, Clone)]
pub struct NavConfig {
    pub trigger_radius: f32,
    pub portal_radius: f32,
    pub tap_radius: f32,
    pub grace_seconds: f64,
    pub player_speed: f32,
    pub pinch_min_distance: f32,
    pub wheel_factor: f32,
    /// Pixels per wheel "line" when the platform reports line units.
    pub wheel_line_pixels: f32,
    pub world_zoom_min: f32,
    pub world_zoom_max: f32,
    pub world_zoom_default: f32,
    pub minimap_zoom_min: f32,
    pub minimap_zoom_max: f32,
    pub minimap_small_width: f32,
    pub minimap_margin: f32,
    pub minimap_expand_cap: f32,
    pub minimap_expand_fill: f32,
    pub hud_bar_height: f32,
    pub portal_fade_seconds: f64,
    pub gate_fade_seconds: f64,
    pub international_fade_seconds: f64,
    pub switch_delay_seconds: f64,
    pub flash_seconds: f64,
    pub locked_message_seconds: f64,
    pub place_immunity_seconds: f64,
    pub dialogue_reward_experience: u32,
    pub dialogue_reward_coins: u32,
    pub characters: Vec<String>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            trigger_radius: 80.0,
            portal_radius: 40.0,
            tap_radius: 36.0,
            grace_seconds: 0.3,
            player_speed: 220.0,
            pinch_min_distance: 10.0,
            wheel_factor: 0.002,
            wheel_line_pixels: 100.0,
            world_zoom_min: 0.5,
            world_zoom_max: 2.0,
            world_zoom_default: 1.0,
            minimap_zoom_min: 0.5,
            minimap_zoom_max: 3.0,
            minimap_small_width: 160.0,
            minimap_margin: 12.0,
            minimap_expand_cap: 2.5,
            minimap_expand_fill: 0.8,
            hud_bar_height: 56.0,
            portal_fade_seconds: 0.4,
            gate_fade_seconds: 0.45,
            international_fade_seconds: 0.5,
            switch_delay_seconds: 0.3,
            flash_seconds: 0.15,
            locked_message_seconds: 2.0,
            place_immunity_seconds: 0.5,
            dialogue_reward_experience: 10,
            dialogue_reward_coins: 5,
            characters: vec!["aria".to_string(), "bram".to_string()],
        }
    }
}

#[derive(Resource, Debug)]
pub struct EventLog {
    entries: Vec<String>,
    max_entries: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 8,
        }
    }
}

impl EventLog {
    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            let overflow = self.entries.len() - self.max_entries;
            self.entries.drain(0..overflow);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[derive(Resource, Debug, Clone)]
pub struct InputBindings {
    pub move_up: KeyCode,
    pub move_down: KeyCode,
    pub move_left: KeyCode,
    pub move_right: KeyCode,
    pub alt_up: KeyCode,
    pub alt_down: KeyCode,
    pub alt_left: KeyCode,
    pub alt_right: KeyCode,
    pub interact: KeyCode,
    pub toggle_minimap: KeyCode,
    pub switch_character: KeyCode,
    pub close_screen: KeyCode,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            move_up: KeyCode::KeyW,
            move_down: KeyCode::KeyS,
            move_left: KeyCode::KeyA,
            move_right: KeyCode::KeyD,
            alt_up: KeyCode::ArrowUp,
            alt_down: KeyCode::ArrowDown,
            alt_left: KeyCode::ArrowLeft,
            alt_right: KeyCode::ArrowRight,
            interact: KeyCode::KeyE,
            toggle_minimap: KeyCode::KeyM,
            switch_character: KeyCode::KeyC,
            close_screen: KeyCode::Escape,
        }
    }
}

#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Boot,
    Loading,
    InGame,
}

/// Per-frame ordering of the map screen. Proximity runs after movement and
/// before the minimap reads positions.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapScreenSet {
    Activation,
    Input,
    Movement,
    Proximity,
    Transitions,
    Presentation,
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<NavConfig>()
            .init_resource::<InputBindings>()
            .init_resource::<EventLog>()
            .configure_sets(
                Update,
                (
                    MapScreenSet::Activation,
                    MapScreenSet::Input,
                    MapScreenSet::Movement,
                    MapScreenSet::Proximity,
                    MapScreenSet::Transitions,
                    MapScreenSet::Presentation,
                )
                    .chain()
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(OnEnter(GameState::Boot), log_enter_boot)
            .add_systems(OnEnter(GameState::Boot), transition_to_loading)
            .add_systems(
                OnEnter(GameState::Loading),
                (load_external_state, setup_loading_screen),
            )
            .add_systems(OnExit(GameState::Loading), teardown_loading_screen)
            .add_systems(OnEnter(GameState::InGame), log_enter_ingame)
            .add_systems(OnExit(GameState::InGame), log_exit_ingame)
            .add_systems(Update, tick_loading.run_if(in_state(GameState::Loading)));
    }
}

fn log_enter_boot(mut log: ResMut<EventLog>) {
    log.push("State: Boot".to_string());
    info!("State: Boot");
}

fn transition_to_loading(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::Loading);
}

fn log_enter_ingame(mut log: ResMut<EventLog>) {
    log.push("State: InGame".to_string());
    info!("State: InGame");
}

fn log_exit_ingame(mut log: ResMut<EventLog>) {
    log.push("State: leaving InGame".to_string());
    info!("State: leaving InGame");
}

/// Loads the external collaborators. Failures degrade to sample content and fresh progress.
fn load_external_state(mut commands: Commands, mut log: ResMut<EventLog>) {
    let pack = match load_content_or_sample(Path::new(CONTENT_PATH)) {
        Ok(pack) => pack,
        Err(error) => {
            error!("Sample content unavailable: {}", error);
            log.push(format!("Content unavailable: {}", error));
            ContentPack {
                default_map: String::new(),
                maps: Vec::new(),
                chapters: Vec::new(),
                missions: Vec::new(),
                dialogues: Vec::new(),
            }
        }
    };
    commands.insert_resource(Content::new(pack));
    commands.insert_resource(Progression::new(RonProgressionStore::load_or_default(
        Path::new(SAVE_PATH),
    )));
}

#[derive(Component)]
struct LoadingScreen;

#[derive(Resource)]
struct LoadingTimer {
    timer: Timer,
}

fn setup_loading_screen(mut commands: Commands) {
    commands.spawn((
        LoadingScreen,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::srgb(0.08, 0.1, 0.09)),
        children![(
            Text::new("Loading..."),
            TextFont {
                font_size: 22.0,
                ..default()
            },
            TextColor(Color::srgb(0.85, 0.9, 0.85)),
        )],
    ));

    commands.insert_resource(LoadingTimer {
        timer: Timer::from_seconds(0.35, TimerMode::Once),
    });
}

fn tick_loading(
    time: Res<Time>,
    mut timer: ResMut<LoadingTimer>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    timer.timer.tick(time.delta());

    if timer.timer.is_finished() {
        next_state.set(GameState::InGame);
    }
}

fn teardown_loading_screen(mut commands: Commands, screens: Query<Entity, With<LoadingScreen>>) {
    for entity in screens.iter() {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<LoadingTimer>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::SystemState;

    #[test]
    fn nav_config_defaults_match_interaction_tuning() {
        let config = NavConfig::default();
        assert_eq!(config.trigger_radius, 80.0);
        assert_eq!(config.grace_seconds, 0.3);
        assert_eq!(config.wheel_factor, 0.002);
        assert_eq!(config.switch_delay_seconds, 0.3);
        assert_eq!(config.locked_message_seconds, 2.0);
        assert_eq!(config.place_immunity_seconds, 0.5);
    }

    #[test]
    fn event_log_push_trims_oldest_entries() {
        let mut log = EventLog::default();
        for index in 0..12 {
            log.push(format!("entry-{}", index));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 8);
        assert_eq!(entries.first().map(String::as_str), Some("entry-4"));
        assert_eq!(entries.last().map(String::as_str), Some("entry-11"));
    }

    #[test]
    fn interact_binding_is_key_e() {
        let bindings = InputBindings::default();
        assert_eq!(bindings.interact, KeyCode::KeyE);
        assert_eq!(bindings.toggle_minimap, KeyCode::KeyM);
    }

    #[test]
    fn tick_loading_enters_game_after_timer() {
        let mut world = World::default();
        let mut time = Time::<()>::default();
        time.advance_by(std::time::Duration::from_secs_f32(0.5));
        world.insert_resource(time);
        world.insert_resource(LoadingTimer {
            timer: Timer::from_seconds(0.35, TimerMode::Once),
        });
        world.insert_resource(NextState::<GameState>::default());

        let mut system_state: SystemState<(
            Res<Time>,
            ResMut<LoadingTimer>,
            ResMut<NextState<GameState>>,
        )> = SystemState::new(&mut world);
        let (time, timer, next_state) = system_state.get_mut(&mut world);
        tick_loading(time, timer, next_state);
        system_state.apply(&mut world);

        let next = world.resource::<NextState<GameState>>();
        assert!(matches!(next, NextState::Pending(GameState::InGame)));
    }
}
