//! Viewport-relative anchors for every overlay element.

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::plugins::core::NavConfig;

use super::minimap::MinimapState;

// =============================================================================
// Constants
// =============================================================================

const EDGE_PADDING: f32 = 16.0;
const AFFORDANCE_SIZE: Vec2 = Vec2::new(132.0, 44.0);
const AFFORDANCE_BOTTOM_OFFSET: f32 = 96.0;
const CLOSE_BUTTON_SIZE: f32 = 44.0;
const MODAL_MAX_WIDTH: f32 = 360.0;
const MODAL_HEIGHT: f32 = 168.0;
const HINT_INSET: f32 = 12.0;
const HINT_WIDTH: f32 = 140.0;

// =============================================================================
// Layout
// =============================================================================

/// Screen positions of the four directional hint labels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HintAnchors {
    pub north: Vec2,
    pub east: Vec2,
    pub south: Vec2,
    pub west: Vec2,
}

/// Overlay geometry for one viewport size. Screen space, top-left origin.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct HudLayout {
    pub viewport: Vec2,
    pub hud_bar: Rect,
    pub map_name: Vec2,
    pub experience: Vec2,
    pub coins: Vec2,
    pub minimap_inline_origin: Vec2,
    pub affordance: Rect,
    pub gesture_zone: Rect,
    pub close_button: Rect,
    pub modal_content: Rect,
    pub log_panel: Vec2,
    pub hints: HintAnchors,
}

impl HudLayout {
    pub fn compute(viewport: Vec2, config: &NavConfig) -> Self {
        let width = viewport.x.max(1.0);
        let height = viewport.y.max(1.0);
        let bar = config.hud_bar_height;

        let modal_width = MODAL_MAX_WIDTH.min(width - EDGE_PADDING * 2.0).max(1.0);

        Self {
            viewport: Vec2::new(width, height),
            hud_bar: Rect::new(0.0, 0.0, width, bar),
            map_name: Vec2::new(EDGE_PADDING, 16.0),
            experience: Vec2::new((width - 300.0).max(EDGE_PADDING), 18.0),
            coins: Vec2::new((width - 150.0).max(EDGE_PADDING), 18.0),
            minimap_inline_origin: Vec2::new(
                (width - config.minimap_small_width - config.minimap_margin).max(0.0),
                bar + config.minimap_margin,
            ),
            affordance: Rect::from_center_size(
                Vec2::new(width * 0.5, height - AFFORDANCE_BOTTOM_OFFSET),
                AFFORDANCE_SIZE,
            ),
            gesture_zone: Rect::new(0.0, bar, width, height.max(bar)),
            close_button: Rect::from_corners(
                Vec2::new(width - CLOSE_BUTTON_SIZE - 12.0, bar + 12.0),
                Vec2::new(width - 12.0, bar + 12.0 + CLOSE_BUTTON_SIZE),
            ),
            modal_content: Rect::from_center_size(
                Vec2::new(width * 0.5, height * 0.5),
                Vec2::new(modal_width, MODAL_HEIGHT),
            ),
            log_panel: Vec2::new(EDGE_PADDING, height - 150.0),
            hints: HintAnchors {
                north: Vec2::new(width * 0.5 - HINT_WIDTH * 0.5, bar + 8.0),
                east: Vec2::new(width - HINT_WIDTH - HINT_INSET, height * 0.5),
                south: Vec2::new(width * 0.5 - HINT_WIDTH * 0.5, height - 32.0),
                west: Vec2::new(HINT_INSET, height * 0.5),
            },
        }
    }
}

/// Which layout anchor a UI node follows.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchored {
    HudBar,
    MapName,
    Experience,
    Coins,
    Affordance,
    CloseButton,
    ModalContent,
    LogPanel,
    HintNorth,
    HintEast,
    HintSouth,
    HintWest,
}

impl Anchored {
    fn place(self, layout: &HudLayout, node: &mut Node) {
        let (position, size) = match self {
            Anchored::HudBar => (layout.hud_bar.min, Some(layout.hud_bar.size())),
            Anchored::MapName => (layout.map_name, None),
            Anchored::Experience => (layout.experience, None),
            Anchored::Coins => (layout.coins, None),
            Anchored::Affordance => (layout.affordance.min, Some(layout.affordance.size())),
            Anchored::CloseButton => (layout.close_button.min, Some(layout.close_button.size())),
            Anchored::ModalContent => {
                (layout.modal_content.min, Some(layout.modal_content.size()))
            }
            Anchored::LogPanel => (layout.log_panel, None),
            Anchored::HintNorth => (layout.hints.north, None),
            Anchored::HintEast => (layout.hints.east, None),
            Anchored::HintSouth => (layout.hints.south, None),
            Anchored::HintWest => (layout.hints.west, None),
        };
        node.left = Val::Px(position.x);
        node.top = Val::Px(position.y);
        if let Some(size) = size {
            node.width = Val::Px(size.x);
            node.height = Val::Px(size.y);
        }
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn init_layout_from_window(
    config: Res<NavConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut layout: ResMut<HudLayout>,
    mut minimap: ResMut<MinimapState>,
) {
    let viewport = windows
        .single()
        .map(|window| window.size())
        .unwrap_or(Vec2::new(1280.0, 720.0));
    apply_viewport(viewport, &config, &mut layout, &mut minimap);
}

/// Recomputes anchors on resize. The inline minimap origin only moves while
/// the minimap is collapsed; an expanded minimap re-centers itself.
pub fn handle_viewport_resize(
    config: Res<NavConfig>,
    mut resized: MessageReader<WindowResized>,
    mut layout: ResMut<HudLayout>,
    mut minimap: ResMut<MinimapState>,
) {
    let Some(last) = resized.read().last() else {
        return;
    };
    let viewport = Vec2::new(last.width, last.height);
    debug!("Viewport resized to {:.0}x{:.0}", viewport.x, viewport.y);
    apply_viewport(viewport, &config, &mut layout, &mut minimap);
}

fn apply_viewport(
    viewport: Vec2,
    config: &NavConfig,
    layout: &mut HudLayout,
    minimap: &mut MinimapState,
) {
    *layout = HudLayout::compute(viewport, config);
    minimap.set_viewport(layout.viewport);
    minimap.set_inline_origin(layout.minimap_inline_origin);
}

pub fn apply_anchors(layout: Res<HudLayout>, mut nodes: Query<(&Anchored, &mut Node)>) {
    if !layout.is_changed() {
        return;
    }
    for (anchor, mut node) in nodes.iter_mut() {
        anchor.place(&layout, &mut node);
    }
}

/// Anchors newly spawned nodes without waiting for a layout change.
pub fn place_new_anchors(
    layout: Res<HudLayout>,
    mut nodes: Query<(&Anchored, &mut Node), Added<Anchored>>,
) {
    for (anchor, mut node) in nodes.iter_mut() {
        anchor.place(&layout, &mut node);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::SystemState;

    #[test]
    fn anchors_follow_viewport_width() {
        let config = NavConfig::default();
        let layout = HudLayout::compute(Vec2::new(1280.0, 720.0), &config);
        assert_eq!(layout.hud_bar, Rect::new(0.0, 0.0, 1280.0, 56.0));
        assert_eq!(layout.minimap_inline_origin, Vec2::new(1108.0, 68.0));
        assert_eq!(layout.affordance.center(), Vec2::new(640.0, 624.0));
        assert_eq!(layout.modal_content.center(), Vec2::new(640.0, 360.0));
    }

    #[test]
    fn narrow_viewport_keeps_modal_on_screen() {
        let config = NavConfig::default();
        let layout = HudLayout::compute(Vec2::new(320.0, 568.0), &config);
        assert!(layout.modal_content.min.x >= 0.0);
        assert!(layout.modal_content.max.x <= 320.0);
        assert!(layout.experience.x >= EDGE_PADDING);
    }

    #[test]
    fn zero_viewport_does_not_produce_negative_sizes() {
        let config = NavConfig::default();
        let layout = HudLayout::compute(Vec2::ZERO, &config);
        assert!(layout.modal_content.width() > 0.0);
        assert!(layout.minimap_inline_origin.x >= 0.0);
    }

    #[test]
    fn resize_moves_collapsed_minimap_origin() {
        let mut world = World::default();
        world.insert_resource(NavConfig::default());
        world.insert_resource(HudLayout::default());
        world.insert_resource(MinimapState::default());
        world.init_resource::<Messages<WindowResized>>();
        world
            .resource_mut::<Messages<WindowResized>>()
            .write(WindowResized {
                window: Entity::PLACEHOLDER,
                width: 800.0,
                height: 600.0,
            });

        let mut system_state: SystemState<(
            Res<NavConfig>,
            MessageReader<WindowResized>,
            ResMut<HudLayout>,
            ResMut<MinimapState>,
        )> = SystemState::new(&mut world);
        let (config, resized, layout, minimap) = system_state.get_mut(&mut world);
        handle_viewport_resize(config, resized, layout, minimap);
        system_state.apply(&mut world);

        let layout = world.resource::<HudLayout>();
        assert_eq!(layout.viewport, Vec2::new(800.0, 600.0));
        let minimap = world.resource::<MinimapState>();
        assert_eq!(minimap.inline_origin(), Vec2::new(628.0, 68.0));
    }

    #[test]
    fn anchored_node_takes_layout_position() {
        let mut world = World::default();
        let config = NavConfig::default();
        world.insert_resource(HudLayout::compute(Vec2::new(1000.0, 800.0), &config));
        let entity = world.spawn((Anchored::Affordance, Node::default())).id();

        let mut system_state: SystemState<(
            Res<HudLayout>,
            Query<(&Anchored, &mut Node), Added<Anchored>>,
        )> = SystemState::new(&mut world);
        let (layout, nodes) = system_state.get_mut(&mut world);
        place_new_anchors(layout, nodes);
        system_state.apply(&mut world);

        let node = world.get::<Node>(entity).expect("node");
        assert_eq!(node.left, Val::Px(434.0));
        assert_eq!(node.width, Val::Px(132.0));
    }
}
