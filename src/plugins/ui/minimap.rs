//! Minimap projection, expand/collapse and its overlay nodes.

use bevy::prelude::*;
use bevy::ui::FocusPolicy;
use bevy::window::PrimaryWindow;

use crate::content::Content;
use crate::plugins::core::NavConfig;
use crate::plugins::gestures::ZoomRange;
use crate::plugins::player::{PlayerAvatar, PortalRegistry};
use crate::plugins::render2d::{camera_view, WorldZoom};
use crate::plugins::screens::MapActivated;
use crate::viewport::{flip_y, minimap_height, minimap_scale, world_to_minimap, CameraView};
use crate::world::{MapScoped, WorldView};

use super::layout::Anchored;

// =============================================================================
// Constants
// =============================================================================

const DOT_SIZE: f32 = 6.0;
const PLAYER_DOT_SIZE: f32 = 8.0;
const NPC_DOT_COLOR: Color = Color::srgb(0.95, 0.82, 0.35);
const PORTAL_OPEN_COLOR: Color = Color::srgb(0.3, 0.85, 0.4);
const PORTAL_LOCKED_COLOR: Color = Color::srgb(0.9, 0.3, 0.28);
const PLAYER_DOT_COLOR: Color = Color::srgb(0.35, 0.75, 1.0);
const BUILDING_DOT_COLOR: Color = Color::srgba(0.55, 0.45, 0.38, 0.9);

// =============================================================================
// Geometry
// =============================================================================

/// Placement of the minimap on screen. `origin` is the top-left corner in
/// screen space and `scale` maps world units to minimap pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapGeometry {
    pub origin: Vec2,
    pub size: Vec2,
    pub scale: f32,
}

impl MinimapGeometry {
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.origin, self.origin + self.size)
    }

    pub fn contains(&self, screen: Vec2) -> bool {
        self.rect().contains(screen)
    }

    /// World point to minimap-local pixels (top-left origin).
    pub fn project(&self, world: Vec2, world_height: f32) -> Vec2 {
        world_to_minimap(self.scale, flip_y(world, world_height))
    }
}

/// Expanded scale before the user's minimap zoom is applied.
pub fn expand_scale(viewport: Vec2, small_width: f32, cap: f32, fill: f32) -> f32 {
    if small_width <= 0.0 {
        return 1.0;
    }
    (viewport.min_element() * fill / small_width).min(cap)
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MinimapState {
    expanded: bool,
    zoom: f32,
    world_size: Vec2,
    viewport: Vec2,
    inline_origin: Vec2,
    small_width: f32,
    expand_cap: f32,
    expand_fill: f32,
}

impl Default for MinimapState {
    fn default() -> Self {
        Self::from_config(&NavConfig::default())
    }
}

impl MinimapState {
    pub fn from_config(config: &NavConfig) -> Self {
        Self {
            expanded: false,
            zoom: 1.0,
            world_size: Vec2::ZERO,
            viewport: Vec2::ZERO,
            inline_origin: Vec2::ZERO,
            small_width: config.minimap_small_width,
            expand_cap: config.minimap_expand_cap,
            expand_fill: config.minimap_expand_fill,
        }
    }

    /// New map: collapsed, unzoomed, scaled to the new world.
    pub fn configure_world(&mut self, world_size: Vec2) {
        self.world_size = world_size;
        self.expanded = false;
        self.zoom = 1.0;
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn set_inline_origin(&mut self, origin: Vec2) {
        if !self.expanded {
            self.inline_origin = origin;
        }
    }

    pub fn inline_origin(&self) -> Vec2 {
        self.inline_origin
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn world_size(&self) -> Vec2 {
        self.world_size
    }

    pub fn expand(&mut self) {
        self.expanded = true;
        self.zoom = 1.0;
    }

    pub fn collapse(&mut self, inline_origin: Vec2) {
        self.expanded = false;
        self.inline_origin = inline_origin;
    }

    /// Returns whether the minimap is expanded afterwards.
    pub fn toggle(&mut self, inline_origin: Vec2) -> bool {
        if self.expanded {
            self.collapse(inline_origin);
        } else {
            self.expand();
        }
        self.expanded
    }

    pub fn set_zoom(&mut self, zoom: f32, range: ZoomRange) {
        self.zoom = range.clamp(zoom);
    }

    pub fn small_scale(&self) -> f32 {
        minimap_scale(self.small_width, self.world_size.x)
    }

    pub fn expand_scale(&self) -> f32 {
        expand_scale(
            self.viewport,
            self.small_width,
            self.expand_cap,
            self.expand_fill,
        )
    }

    pub fn effective_scale(&self) -> f32 {
        if self.expanded {
            self.small_scale() * self.expand_scale() * self.zoom
        } else {
            self.small_scale()
        }
    }

    pub fn small_geometry(&self) -> MinimapGeometry {
        MinimapGeometry {
            origin: self.inline_origin,
            size: Vec2::new(
                self.small_width,
                minimap_height(self.small_width, self.world_size),
            ),
            scale: self.small_scale(),
        }
    }

    /// Expanded minimap centered in the viewport.
    pub fn expanded_geometry(&self) -> MinimapGeometry {
        let scale = self.small_scale() * self.expand_scale() * self.zoom;
        let size = self.world_size * scale;
        MinimapGeometry {
            origin: self.viewport * 0.5 - size * 0.5,
            size,
            scale,
        }
    }

    pub fn active_geometry(&self) -> MinimapGeometry {
        if self.expanded {
            self.expanded_geometry()
        } else {
            self.small_geometry()
        }
    }

    pub fn contains(&self, screen: Vec2) -> bool {
        self.active_geometry().contains(screen)
    }

    /// Camera viewport outline in minimap-local pixels.
    pub fn viewport_indicator(&self, camera: &CameraView) -> Rect {
        let geometry = self.active_geometry();
        let visible = camera.visible_world_size();
        let top_left_world = Vec2::new(
            camera.center.x - visible.x * 0.5,
            camera.center.y + visible.y * 0.5,
        );
        let origin = geometry.project(top_left_world, self.world_size.y);
        Rect::from_corners(origin, origin + visible * geometry.scale)
    }
}

pub fn minimap_zoom_range(config: &NavConfig) -> ZoomRange {
    ZoomRange::new(config.minimap_zoom_min, config.minimap_zoom_max)
}

// =============================================================================
// Components
// =============================================================================

#[derive(Component)]
pub struct MinimapRoot;

#[derive(Component)]
pub struct MinimapDim;

#[derive(Component)]
pub struct MinimapCloseButton;

#[derive(Component)]
pub struct MinimapViewportIndicator;

#[derive(Component)]
pub struct MinimapPlayerDot;

/// A minimap dot pinned to a world position.
#[derive(Component, Debug, Clone, Copy)]
pub struct MinimapMarker {
    pub world: Vec2,
    pub size: f32,
}

// =============================================================================
// Systems
// =============================================================================

pub fn setup_minimap_overlay(mut commands: Commands) {
    commands.spawn((
        MinimapDim,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.55)),
        FocusPolicy::Pass,
        ZIndex(20),
        Visibility::Hidden,
    ));

    commands.spawn((
        MinimapCloseButton,
        Anchored::CloseButton,
        Node {
            position_type: PositionType::Absolute,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::srgba(0.12, 0.14, 0.16, 0.9)),
        ZIndex(22),
        Visibility::Hidden,
        children![(
            Text::new("X"),
            TextFont {
                font_size: 20.0,
                ..default()
            },
            TextColor(Color::srgb(0.92, 0.92, 0.92)),
        )],
    ));
}

/// Rebuilds the minimap tree for a freshly activated map.
pub fn spawn_minimap(
    mut commands: Commands,
    mut activated: MessageReader<MapActivated>,
    content: Res<Content>,
    registry: Res<PortalRegistry>,
) {
    let Some(event) = activated.read().last() else {
        return;
    };
    let Some(map) = content.0.map(&event.map_id) else {
        warn!("Minimap skipped: unknown map {}", event.map_id);
        return;
    };

    let root = commands
        .spawn((
            MinimapRoot,
            MapScoped,
            Node {
                position_type: PositionType::Absolute,
                overflow: Overflow::clip(),
                border: UiRect::all(Val::Px(1.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.08, 0.12, 0.1, 0.85)),
            BorderColor::all(Color::srgba(0.8, 0.85, 0.8, 0.6)),
            ZIndex(21),
            Name::new("Minimap"),
        ))
        .id();

    let mut markers = Vec::new();
    for building in &map.buildings {
        markers.push((Vec2::new(building.x, building.y), BUILDING_DOT_COLOR));
    }
    for npc in &map.npcs {
        markers.push((Vec2::new(npc.x, npc.y), NPC_DOT_COLOR));
    }
    for record in registry.records() {
        let color = if record.locked {
            PORTAL_LOCKED_COLOR
        } else {
            PORTAL_OPEN_COLOR
        };
        markers.push((record.position, color));
    }

    commands.entity(root).with_children(|parent| {
        for (world, color) in markers {
            parent.spawn((
                MinimapMarker {
                    world,
                    size: DOT_SIZE,
                },
                Node {
                    position_type: PositionType::Absolute,
                    width: Val::Px(DOT_SIZE),
                    height: Val::Px(DOT_SIZE),
                    ..default()
                },
                BackgroundColor(color),
            ));
        }

        parent.spawn((
            MinimapPlayerDot,
            MinimapMarker {
                world: Vec2::ZERO,
                size: PLAYER_DOT_SIZE,
            },
            Node {
                position_type: PositionType::Absolute,
                width: Val::Px(PLAYER_DOT_SIZE),
                height: Val::Px(PLAYER_DOT_SIZE),
                ..default()
            },
            BackgroundColor(PLAYER_DOT_COLOR),
        ));

        parent.spawn((
            MinimapViewportIndicator,
            Node {
                position_type: PositionType::Absolute,
                border: UiRect::all(Val::Px(1.0)),
                ..default()
            },
            BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.8)),
        ));
    });
}

pub fn track_player_on_minimap(
    player: Query<&Transform, With<PlayerAvatar>>,
    mut dots: Query<&mut MinimapMarker, With<MinimapPlayerDot>>,
) {
    let Ok(transform) = player.single() else {
        return;
    };
    for mut marker in dots.iter_mut() {
        marker.world = transform.translation.truncate();
    }
}

/// Positions the minimap, its dots and the camera outline from the current state.
#[allow(clippy::type_complexity)]
pub fn sync_minimap_nodes(
    minimap: Res<MinimapState>,
    world_view: Res<WorldView>,
    zoom: Res<WorldZoom>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<&Transform, With<Camera2d>>,
    mut roots: Query<&mut Node, With<MinimapRoot>>,
    mut markers: Query<
        (&MinimapMarker, &mut Node),
        (Without<MinimapRoot>, Without<MinimapViewportIndicator>),
    >,
    mut indicators: Query<
        &mut Node,
        (
            With<MinimapViewportIndicator>,
            Without<MinimapRoot>,
            Without<MinimapMarker>,
        ),
    >,
) {
    let geometry = minimap.active_geometry();
    for mut node in roots.iter_mut() {
        node.left = Val::Px(geometry.origin.x);
        node.top = Val::Px(geometry.origin.y);
        node.width = Val::Px(geometry.size.x);
        node.height = Val::Px(geometry.size.y);
    }

    for (marker, mut node) in markers.iter_mut() {
        let local = geometry.project(marker.world, world_view.size.y);
        node.left = Val::Px(local.x - marker.size * 0.5);
        node.top = Val::Px(local.y - marker.size * 0.5);
    }

    let Ok(camera) = cameras.single() else {
        return;
    };
    let viewport = windows
        .single()
        .map(|window| window.size())
        .unwrap_or(Vec2::ZERO);
    let indicator = minimap.viewport_indicator(&camera_view(camera, &zoom, viewport));
    for mut node in indicators.iter_mut() {
        node.left = Val::Px(indicator.min.x);
        node.top = Val::Px(indicator.min.y);
        node.width = Val::Px(indicator.width());
        node.height = Val::Px(indicator.height());
    }
}

#[allow(clippy::type_complexity)]
pub fn sync_minimap_overlay(
    minimap: Res<MinimapState>,
    mut overlays: Query<
        &mut Visibility,
        Or<(With<MinimapDim>, With<MinimapCloseButton>)>,
    >,
) {
    if !minimap.is_changed() {
        return;
    }
    let visibility = if minimap.is_expanded() {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut current in overlays.iter_mut() {
        *current = visibility;
    }
}

// =============================================================================
// Tests
// =============================================================================
