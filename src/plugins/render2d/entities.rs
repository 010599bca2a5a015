//! Map entity spawning: ground, buildings, NPCs, portals and the avatar.

use bevy::prelude::*;

use crate::plugins::player::{PlayerAvatar, PortalRegistry};
use crate::world::{Building, Interactable, MapDefinition, MapScoped};

use super::components::{portal_ring_color, GroundVisual, NpcVisual, PortalVisual, WorldLabel};

// =============================================================================
// Constants
// =============================================================================

const GROUND_Z: f32 = -10.0;
const BUILDING_Z: f32 = -5.0;
const ENTITY_Z: f32 = 0.0;
const PLAYER_Z: f32 = 5.0;
const LABEL_Z: f32 = 6.0;

const NPC_SIZE: Vec2 = Vec2::new(28.0, 28.0);
const PLAYER_SIZE: Vec2 = Vec2::new(24.0, 32.0);
const PORTAL_SIZE: Vec2 = Vec2::new(36.0, 36.0);
const LABEL_OFFSET: f32 = 30.0;

// =============================================================================
// Spawning
// =============================================================================

/// Spawns every visible entity of `map`. All of them are [`MapScoped`].
pub fn spawn_map_entities(
    commands: &mut Commands,
    map: &MapDefinition,
    registry: &PortalRegistry,
    spawn: Vec2,
    character_id: &str,
) {
    let size = map.size();
    commands.spawn((
        GroundVisual,
        MapScoped,
        Sprite::from_color(Color::srgb(0.36, 0.52, 0.34), size),
        Transform::from_xyz(size.x * 0.5, size.y * 0.5, GROUND_Z),
        Name::new(format!("Ground:{}", map.id)),
    ));

    for building in &map.buildings {
        let footprint = Vec2::new(building.width, building.height);
        commands.spawn((
            Building { size: footprint },
            MapScoped,
            Sprite::from_color(Color::srgb(0.55, 0.45, 0.38), footprint),
            Transform::from_xyz(building.x, building.y, BUILDING_Z),
        ));
    }

    for npc in &map.npcs {
        let interactable = Interactable::from_npc(npc);
        spawn_label(commands, &npc.name, interactable.position);
        commands.spawn((
            NpcVisual,
            MapScoped,
            Sprite::from_color(Color::srgb(0.95, 0.82, 0.35), NPC_SIZE),
            Transform::from_xyz(npc.x, npc.y, ENTITY_Z),
            interactable,
        ));
    }

    let portal_defs = map.portals.iter().map(Interactable::from_portal);
    let gate_defs = map.gates.iter().map(Interactable::from_gate);
    for interactable in portal_defs.chain(gate_defs) {
        let locked = registry
            .get(&interactable.id)
            .is_some_and(|record| record.locked);
        spawn_label(commands, interactable.label(), interactable.position);
        commands.spawn((
            PortalVisual { locked },
            MapScoped,
            Sprite::from_color(
                portal_ring_color(locked).with_alpha(0.35),
                PORTAL_SIZE,
            ),
            Transform::from_xyz(interactable.position.x, interactable.position.y, ENTITY_Z),
            interactable,
        ));
    }

    commands.spawn((
        PlayerAvatar::new(character_id),
        MapScoped,
        Sprite::from_color(Color::srgb(0.35, 0.75, 1.0), PLAYER_SIZE),
        Transform::from_xyz(spawn.x, spawn.y, PLAYER_Z),
        Name::new("Player"),
    ));
}

fn spawn_label(commands: &mut Commands, text: &str, position: Vec2) {
    commands.spawn((
        WorldLabel,
        MapScoped,
        Text2d::new(text),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.95, 0.95, 0.92)),
        Transform::from_xyz(position.x, position.y + LABEL_OFFSET, LABEL_Z),
    ));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{sample_content, ContentCache};
    use bevy::ecs::system::SystemState;

    #[test]
    fn spawns_scoped_entities_with_lock_colors() {
        let pack = sample_content().expect("sample content");
        let map = pack.map("plaza").cloned().expect("plaza");
        let registry = PortalRegistry::build(&map, 0);

        let mut world = World::default();
        let mut system_state: SystemState<Commands> = SystemState::new(&mut world);
        let mut commands = system_state.get_mut(&mut world);
        spawn_map_entities(&mut commands, &map, &registry, Vec2::new(1200.0, 500.0), "bram");
        system_state.apply(&mut world);

        let portals: Vec<PortalVisual> = world
            .query::<&PortalVisual>()
            .iter(&world)
            .copied()
            .collect();
        assert_eq!(portals.len(), 3);
        assert_eq!(portals.iter().filter(|portal| portal.locked).count(), 2);

        let avatar = world
            .query::<(&PlayerAvatar, &Transform)>()
            .single(&world)
            .expect("one avatar");
        assert_eq!(avatar.0.character_id, "bram");
        assert_eq!(avatar.1.translation.truncate(), Vec2::new(1200.0, 500.0));

        let npcs = world
            .query_filtered::<&Interactable, With<NpcVisual>>()
            .iter(&world)
            .count();
        assert_eq!(npcs, 3);
    }
}
