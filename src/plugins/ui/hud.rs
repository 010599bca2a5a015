//! HUD bar, directional hints and the log panel.

use bevy::prelude::*;

use crate::content::{Content, ContentCache};
use crate::plugins::player::{PortalRecord, PortalRegistry};
use crate::plugins::screens::MapActivated;
use crate::progression::Progression;
use crate::world::WorldView;

use super::components::{
    CoinsText, ExperienceText, HintText, HudBar, LogContentText, LogPanelMarker, MapNameText,
};
use super::layout::Anchored;

// =============================================================================
// Resources
// =============================================================================

/// Neighbouring map names per screen edge for the active map.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct DirectionalHints {
    pub north: Option<String>,
    pub east: Option<String>,
    pub south: Option<String>,
    pub west: Option<String>,
}

impl DirectionalHints {
    fn slot(&self, hint: HintText) -> Option<&str> {
        match hint {
            HintText::North => self.north.as_deref(),
            HintText::East => self.east.as_deref(),
            HintText::South => self.south.as_deref(),
            HintText::West => self.west.as_deref(),
        }
    }
}

/// Buckets each portal by its dominant axis from the map center and keeps the
/// one reaching furthest toward that edge. World space is y-up.
pub fn directional_hints(
    records: &[PortalRecord],
    world_size: Vec2,
    content: &dyn ContentCache,
) -> DirectionalHints {
    let center = world_size * 0.5;
    let mut best: [Option<(f32, &PortalRecord)>; 4] = [None; 4];

    for record in records {
        let offset = record.position - center;
        if offset.length_squared() <= f32::EPSILON {
            continue;
        }
        let (slot, reach) = if offset.x.abs() > offset.y.abs() {
            if offset.x > 0.0 {
                (1, offset.x)
            } else {
                (3, -offset.x)
            }
        } else if offset.y > 0.0 {
            (0, offset.y)
        } else {
            (2, -offset.y)
        };
        if best[slot].is_none_or(|(current, _)| reach > current) {
            best[slot] = Some((reach, record));
        }
    }

    let name = |slot: usize| {
        best[slot].map(|(_, record)| {
            content
                .map(&record.target_map_id)
                .map(|map| map.name.clone())
                .unwrap_or_else(|| record.target_map_id.clone())
        })
    };

    DirectionalHints {
        north: name(0),
        east: name(1),
        south: name(2),
        west: name(3),
    }
}

// =============================================================================
// Setup Systems
// =============================================================================

pub fn setup_hud(mut commands: Commands) {
    commands.spawn((
        HudBar,
        Anchored::HudBar,
        Node {
            position_type: PositionType::Absolute,
            ..default()
        },
        BackgroundColor(Color::srgba(0.06, 0.08, 0.07, 0.85)),
        ZIndex(10),
    ));

    spawn_hud_text(&mut commands, MapNameText, Anchored::MapName, "--", 20.0);
    spawn_hud_text(&mut commands, ExperienceText, Anchored::Experience, "Lv 0 | XP 0", 16.0);
    spawn_hud_text(&mut commands, CoinsText, Anchored::Coins, "Coins 0", 16.0);

    for (hint, anchor) in [
        (HintText::North, Anchored::HintNorth),
        (HintText::East, Anchored::HintEast),
        (HintText::South, Anchored::HintSouth),
        (HintText::West, Anchored::HintWest),
    ] {
        commands.spawn((
            hint,
            anchor,
            Text::new(""),
            TextFont {
                font_size: 13.0,
                ..default()
            },
            TextColor(Color::srgba(0.95, 0.95, 0.85, 0.85)),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            ZIndex(9),
        ));
    }

    spawn_log_panel(&mut commands);
}

fn spawn_hud_text<M: Component>(
    commands: &mut Commands,
    marker: M,
    anchor: Anchored,
    text: &str,
    font_size: f32,
) {
    commands.spawn((
        marker,
        anchor,
        Text::new(text),
        TextFont {
            font_size,
            ..default()
        },
        TextColor(Color::srgb(0.92, 0.94, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            ..default()
        },
        ZIndex(11),
    ));
}

fn spawn_log_panel(commands: &mut Commands) {
    commands.spawn((
        LogPanelMarker,
        Anchored::LogPanel,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Px(320.0),
            padding: UiRect::all(Val::Px(6.0)),
            ..default()
        },
        BackgroundColor(Color::srgba(0.05, 0.06, 0.06, 0.6)),
        ZIndex(9),
        children![(
            LogContentText,
            Text::new(""),
            TextFont {
                font_size: 12.0,
                ..default()
            },
            TextColor(Color::srgb(0.78, 0.84, 0.8)),
        )],
    ));
}

// =============================================================================
// Update Systems
// =============================================================================

pub fn refresh_directional_hints(
    mut activated: MessageReader<MapActivated>,
    content: Res<Content>,
    registry: Res<PortalRegistry>,
    world_view: Res<WorldView>,
    mut hints: ResMut<DirectionalHints>,
) {
    if activated.read().last().is_none() {
        return;
    }
    *hints = directional_hints(registry.records(), world_view.size, content.0.as_ref());
}

#[allow(clippy::type_complexity)]
pub fn update_hud_text(
    world_view: Res<WorldView>,
    progression: Res<Progression>,
    hints: Res<DirectionalHints>,
    mut texts: ParamSet<(
        Query<&mut Text, With<MapNameText>>,
        Query<&mut Text, With<ExperienceText>>,
        Query<&mut Text, With<CoinsText>>,
        Query<(&HintText, &mut Text)>,
    )>,
) {
    if world_view.is_changed() {
        for mut text in texts.p0().iter_mut() {
            text.0 = world_view.map_name.clone();
        }
    }

    if progression.is_changed() {
        let store = progression.0.as_ref();
        let experience = format!("Lv {} | XP {}", store.current_level(), store.experience());
        for mut text in texts.p1().iter_mut() {
            text.0 = experience.clone();
        }
        let coins = format!("Coins {}", store.coins());
        for mut text in texts.p2().iter_mut() {
            text.0 = coins.clone();
        }
    }

    if hints.is_changed() {
        for (hint, mut text) in texts.p3().iter_mut() {
            text.0 = hints.slot(*hint).unwrap_or_default().to_string();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::sample_content;

    #[test]
    fn plaza_hints_point_east_and_west() {
        let pack = sample_content().expect("sample content");
        let map = pack.map("plaza").cloned().expect("plaza");
        let registry = PortalRegistry::build(&map, 0);

        let hints = directional_hints(registry.records(), map.size(), &pack);
        assert_eq!(hints.east.as_deref(), Some("Harbor"));
        assert_eq!(hints.west.as_deref(), Some("Corner Bakery"));
        assert_eq!(hints.north, None);
        assert_eq!(hints.south, None);
    }

    #[test]
    fn unknown_target_falls_back_to_id() {
        let pack = sample_content().expect("sample content");
        let mut map = pack.map("bakery").cloned().expect("bakery");
        map.portals[0].target_map_id = "cellar".to_string();
        let registry = PortalRegistry::build(&map, 0);

        let hints = directional_hints(registry.records(), map.size(), &pack);
        assert_eq!(hints.south.as_deref(), Some("cellar"));
    }
}
