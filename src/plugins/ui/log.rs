//! Log panel update system.

use bevy::prelude::*;

use crate::plugins::core::EventLog;

use super::components::LogContentText;

// =============================================================================
// Systems
// =============================================================================

pub fn update_log_panel(log: Res<EventLog>, mut log_text: Query<&mut Text, With<LogContentText>>) {
    if !log.is_changed() {
        return;
    }
    if let Some(mut text) = log_text.iter_mut().next() {
        let mut body = String::new();
        for entry in log.entries() {
            body.push_str("> ");
            body.push_str(entry);
            body.push('\n');
        }
        text.0 = body.trim_end().to_string();
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
    fn log_panel_mirrors_entries() {
        let mut world = World::default();
        let mut log = EventLog::default();
        log.push("Entered Harbor".to_string());
        log.push("Saved".to_string());
        world.insert_resource(log);
        let entity = world.spawn((LogContentText, Text::new(""))).id();

        let mut system_state: SystemState<(
            Res<EventLog>,
            Query<&mut Text, With<LogContentText>>,
        )> = SystemState::new(&mut world);
        let (log, texts) = system_state.get_mut(&mut world);
        update_log_panel(log, texts);

        let text = world.get::<Text>(entity).expect("text");
        assert_eq!(text.0, "> Entered Harbor\n> Saved");
    }
}
