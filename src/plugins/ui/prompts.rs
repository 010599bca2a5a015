//! Transient prompts: interaction affordance, locked toast, greeting modal,
//! sub-screen panel and the fade/flash overlays.

use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::plugins::player::{GreetingModal, InteractionAffordance, LockedMessages};
use crate::plugins::screens::{ScreenFade, ScreenFlash, ScreenMode, SubScreen};

use super::components::{
    AffordanceButton, AffordanceLabel, FadeOverlay, FlashOverlay, GreetingPanel, GreetingText,
    LockedToast, SubScreenPanel, SubScreenText,
};
use super::layout::Anchored;

// =============================================================================
// Constants
// =============================================================================

const AFFORDANCE_FADE_SECONDS: f64 = 0.2;
const AFFORDANCE_PULSE_HZ: f64 = 1.2;
const AFFORDANCE_COLOR: Color = Color::srgb(0.98, 0.78, 0.3);

// =============================================================================
// Helpers
// =============================================================================

/// Fade-in multiplied by a gentle pulse once fully shown.
pub fn affordance_opacity(fade_in: f32, since_shown: f64) -> f32 {
    if fade_in < 1.0 {
        return fade_in;
    }
    let pulse = (since_shown * AFFORDANCE_PULSE_HZ * std::f64::consts::TAU).cos() as f32;
    0.85 + 0.15 * pulse
}

pub fn sub_screen_body(screen: &SubScreen) -> String {
    match screen {
        SubScreen::Mission {
            chapter,
            lesson,
            chapter_name,
            missions,
            ..
        } => {
            let mut body = match chapter_name {
                Some(name) => format!("Chapter {}: {}\nLesson {}", chapter, name, lesson),
                None => format!("Chapter {}\nLesson {}", chapter, lesson),
            };
            for mission in missions {
                body.push_str("\n- ");
                body.push_str(&mission.title);
            }
            body
        }
        SubScreen::Dialogue { script, .. } => script
            .lines
            .iter()
            .map(|line| format!("{}: {}", script.speaker, line))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// =============================================================================
// Setup Systems
// =============================================================================

pub fn setup_prompts(mut commands: Commands) {
    commands.spawn((
        AffordanceButton,
        Anchored::Affordance,
        Node {
            position_type: PositionType::Absolute,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            border: UiRect::all(Val::Px(2.0)),
            ..default()
        },
        BackgroundColor(Color::srgba(0.1, 0.1, 0.1, 0.0)),
        BorderColor::all(AFFORDANCE_COLOR.with_alpha(0.0)),
        ZIndex(15),
        Visibility::Hidden,
        children![(
            AffordanceLabel,
            Text::new("Talk"),
            TextFont {
                font_size: 16.0,
                ..default()
            },
            TextColor(AFFORDANCE_COLOR),
        )],
    ));

    commands.spawn((
        LockedToast,
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgb(1.0, 0.55, 0.5)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(80.0),
            width: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        ZIndex(16),
        Visibility::Hidden,
    ));

    commands.spawn((
        GreetingPanel,
        Anchored::ModalContent,
        Node {
            position_type: PositionType::Absolute,
            padding: UiRect::all(Val::Px(14.0)),
            border: UiRect::all(Val::Px(1.0)),
            ..default()
        },
        BackgroundColor(Color::srgba(0.1, 0.12, 0.11, 0.95)),
        BorderColor::all(Color::srgba(0.9, 0.9, 0.85, 0.5)),
        ZIndex(30),
        Visibility::Hidden,
        children![(
            GreetingText,
            Text::new(""),
            TextFont {
                font_size: 16.0,
                ..default()
            },
            TextColor(Color::srgb(0.95, 0.95, 0.92)),
        )],
    ));

    commands.spawn((
        SubScreenPanel,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::srgb(0.07, 0.08, 0.1)),
        ZIndex(40),
        Visibility::Hidden,
        children![(
            SubScreenText,
            Text::new(""),
            TextFont {
                font_size: 18.0,
                ..default()
            },
            TextColor(Color::srgb(0.9, 0.92, 0.95)),
        )],
    ));

    commands.spawn((
        FadeOverlay,
        full_screen_node(),
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
        FocusPolicy::Pass,
        ZIndex(50),
    ));
    commands.spawn((
        FlashOverlay,
        full_screen_node(),
        BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.0)),
        FocusPolicy::Pass,
        ZIndex(51),
    ));
}

fn full_screen_node() -> Node {
    Node {
        position_type: PositionType::Absolute,
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        ..default()
    }
}

// =============================================================================
// Update Systems
// =============================================================================

pub fn sync_affordance(
    time: Res<Time>,
    affordance: Res<InteractionAffordance>,
    mut buttons: Query<
        (&mut Visibility, &mut BackgroundColor, &mut BorderColor),
        With<AffordanceButton>,
    >,
    mut labels: Query<(&mut Text, &mut TextColor), With<AffordanceLabel>>,
) {
    let now = time.elapsed_secs_f64();
    let fade_in = affordance.alpha(now, AFFORDANCE_FADE_SECONDS);
    let since_shown = now - affordance.shown_at();
    let opacity = if affordance.is_visible() {
        affordance_opacity(fade_in, since_shown)
    } else {
        0.0
    };

    for (mut visibility, mut background, mut border) in buttons.iter_mut() {
        *visibility = if affordance.is_visible() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        background.0 = Color::srgba(0.1, 0.1, 0.1, 0.75 * opacity);
        *border = BorderColor::all(AFFORDANCE_COLOR.with_alpha(opacity));
    }

    for (mut text, mut color) in labels.iter_mut() {
        if affordance.is_changed() && text.0 != affordance.label() {
            text.0 = affordance.label().to_string();
        }
        color.0 = AFFORDANCE_COLOR.with_alpha(opacity);
    }
}

pub fn sync_locked_toast(
    locked: Res<LockedMessages>,
    mut toasts: Query<(&mut Text, &mut Visibility), With<LockedToast>>,
) {
    if !locked.is_changed() {
        return;
    }
    for (mut text, mut visibility) in toasts.iter_mut() {
        match locked.latest() {
            Some(notice) => {
                text.0 = notice.text.clone();
                *visibility = Visibility::Visible;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

pub fn sync_greeting_panel(
    modal: Res<GreetingModal>,
    mut panels: Query<&mut Visibility, With<GreetingPanel>>,
    mut texts: Query<&mut Text, With<GreetingText>>,
) {
    if !modal.is_changed() {
        return;
    }
    let visibility = if modal.is_open() {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut current in panels.iter_mut() {
        *current = visibility;
    }
    if let Some(greeting) = modal.greeting() {
        for mut text in texts.iter_mut() {
            text.0 = format!("{}\n\n{}", greeting.npc_name, greeting.text);
        }
    }
}

pub fn sync_sub_screen_panel(
    mode: Res<ScreenMode>,
    mut panels: Query<&mut Visibility, With<SubScreenPanel>>,
    mut texts: Query<&mut Text, With<SubScreenText>>,
) {
    if !mode.is_changed() {
        return;
    }
    let body = match &*mode {
        ScreenMode::Map => None,
        ScreenMode::SubScreen(launch) => Some(format!(
            "{}\n\n{}\n\nTap or press Esc to return",
            launch.screen.title(),
            sub_screen_body(&launch.screen)
        )),
    };
    for mut visibility in panels.iter_mut() {
        *visibility = if body.is_some() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
    if let Some(body) = body {
        for mut text in texts.iter_mut() {
            text.0 = body.clone();
        }
    }
}

pub fn sync_screen_overlays(
    time: Res<Time>,
    fade: Res<ScreenFade>,
    flash: Res<ScreenFlash>,
    mut fades: Query<&mut BackgroundColor, (With<FadeOverlay>, Without<FlashOverlay>)>,
    mut flashes: Query<&mut BackgroundColor, (With<FlashOverlay>, Without<FadeOverlay>)>,
) {
    let now = time.elapsed_secs_f64();
    for mut background in fades.iter_mut() {
        background.0 = Color::srgba(0.0, 0.0, 0.0, fade.alpha(now));
    }
    for mut background in flashes.iter_mut() {
        background.0 = Color::srgba(1.0, 1.0, 1.0, flash.alpha(now));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DialogueScript, Mission};

    #[test]
    fn affordance_fades_in_then_pulses() {
        assert_eq!(affordance_opacity(0.4, 0.08), 0.4);
        let pulsing = affordance_opacity(1.0, 0.0);
        assert!((pulsing - 1.0).abs() < 1e-4);
        let trough = affordance_opacity(1.0, 0.5 / AFFORDANCE_PULSE_HZ);
        assert!((trough - 0.7).abs() < 1e-4);
    }

    #[test]
    fn mission_body_lists_titles() {
        let screen = SubScreen::Mission {
            npc_id: "guide".to_string(),
            chapter: 1,
            lesson: 2,
            chapter_name: Some("Arrivals".to_string()),
            missions: vec![Mission {
                id: "find-fountain".to_string(),
                chapter: 1,
                lesson: 2,
                title: "Find the fountain".to_string(),
                reward_experience: 20,
            }],
        };
        assert_eq!(
            sub_screen_body(&screen),
            "Chapter 1: Arrivals\nLesson 2\n- Find the fountain"
        );
    }

    #[test]
    fn dialogue_body_prefixes_speaker() {
        let screen = SubScreen::Dialogue {
            npc_id: "florist".to_string(),
            script: DialogueScript {
                chapter: 1,
                lesson: 1,
                speaker: "Florist".to_string(),
                lines: vec!["Hello!".to_string(), "Tulips?".to_string()],
            },
        };
        assert_eq!(sub_screen_body(&screen), "Florist: Hello!\nFlorist: Tulips?");
    }
}
