use bevy::prelude::*;

mod content;
mod error;
mod plugins;
mod progression;
mod viewport;
mod world;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.09, 0.12, 0.1)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Wayfarer".to_string(),
                resolution: (1280, 720).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            plugins::core::CorePlugin,
            plugins::screens::ScreensPlugin,
            plugins::gestures::GesturePlugin,
            plugins::player::PlayerPlugin,
            plugins::render2d::Render2DPlugin,
            plugins::ui::UIPlugin,
        ))
        .run();
}
