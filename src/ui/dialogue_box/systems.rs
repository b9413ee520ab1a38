// src/ui/dialogue_box/systems.rs
//
// Systems spawning the dialogue box, mirroring the dialogue view into it,
// and turning input into dialogue messages.

use bevy::prelude::*;

use crate::dialogue::{
    events::{AdvanceDialogue, MoveToArea, PlayDialogue, SequenceCompleted},
    manager::DialogueManager,
    player::DialoguePlayer,
    types::{BranchOutcome, SequenceKind},
    view::DialogueView,
};

use super::components::{
    annotation_text, kind_color, progress_text, DialogueAnnotationText, DialogueBodyText,
    DialogueBoxRoot, DialogueBoxSettings, DialoguePortraitLabel, DialogueProgressText,
    DialogueSpeakerText, ANNOTATION_COLOR, BACKGROUND_COLOR, BORDER_COLOR, NARRATION_COLOR,
};

const SPEAKER_COLOR: Color = Color::srgb(1.0, 0.9, 0.4);
const AREA_KEYS: [KeyCode; 5] = [
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
];

pub fn spawn_ui_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Spawns the (hidden) dialogue box hierarchy at the bottom of the screen.
pub fn spawn_dialogue_box(mut commands: Commands, settings: Res<DialogueBoxSettings>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(settings.margin),
                left: Val::Px(settings.margin),
                right: Val::Px(settings.margin),
                height: Val::Px(settings.height),
                padding: UiRect::all(Val::Px(settings.padding)),
                border: UiRect::all(Val::Px(settings.border_width)),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(BACKGROUND_COLOR),
            BorderColor::from(BORDER_COLOR),
            Visibility::Hidden,
            DialogueBoxRoot,
        ))
        .with_children(|parent| {
            parent
                .spawn(Node {
                    flex_direction: FlexDirection::Row,
                    column_gap: Val::Px(12.0),
                    margin: UiRect::bottom(Val::Px(8.0)),
                    ..default()
                })
                .with_children(|header| {
                    header.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: settings.speaker_font_size,
                            ..default()
                        },
                        TextColor(SPEAKER_COLOR),
                        DialogueSpeakerText,
                    ));
                    header.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: settings.annotation_font_size,
                            ..default()
                        },
                        TextColor(ANNOTATION_COLOR),
                        DialogueAnnotationText,
                    ));
                    header.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: settings.annotation_font_size,
                            ..default()
                        },
                        TextColor(ANNOTATION_COLOR),
                        DialoguePortraitLabel,
                    ));
                    header.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: settings.annotation_font_size,
                            ..default()
                        },
                        TextColor(ANNOTATION_COLOR),
                        DialogueProgressText,
                    ));
                });

            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: settings.body_font_size,
                    ..default()
                },
                TextColor(Color::WHITE),
                DialogueBodyText,
            ));
        });
}

/// Copies the dialogue view into the box whenever it changes.
#[allow(clippy::type_complexity)]
pub fn update_dialogue_box(
    view: Res<DialogueView>,
    mut roots: Query<&mut Visibility, With<DialogueBoxRoot>>,
    mut speakers: Query<
        (&mut Text, &mut TextColor),
        (
            With<DialogueSpeakerText>,
            Without<DialogueBodyText>,
            Without<DialogueAnnotationText>,
            Without<DialoguePortraitLabel>,
        ),
    >,
    mut bodies: Query<
        (&mut Text, &mut TextColor),
        (
            With<DialogueBodyText>,
            Without<DialogueAnnotationText>,
            Without<DialoguePortraitLabel>,
        ),
    >,
    mut annotations: Query<&mut Text, (With<DialogueAnnotationText>, Without<DialoguePortraitLabel>)>,
    mut portraits: Query<&mut Text, With<DialoguePortraitLabel>>,
) {
    if !view.is_changed() {
        return;
    }

    for mut visibility in roots.iter_mut() {
        *visibility = if view.visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }

    for (mut text, mut color) in speakers.iter_mut() {
        text.0.clone_from(&view.speaker);
        color.0 = if view.is_narration() {
            NARRATION_COLOR
        } else {
            SPEAKER_COLOR
        };
    }

    for (mut text, mut color) in bodies.iter_mut() {
        text.0.clone_from(&view.body);
        color.0 = if view.is_narration() {
            NARRATION_COLOR
        } else {
            kind_color(view.kind)
        };
    }

    for mut text in annotations.iter_mut() {
        text.0 = annotation_text(view.annotation.as_deref());
    }

    for mut text in portraits.iter_mut() {
        text.0 = view
            .portrait
            .as_ref()
            .map(|portrait| format!("[{}]", portrait.asset_key()))
            .unwrap_or_default();
    }
}

/// Line counter for the sequence the player is showing.
pub fn update_dialogue_progress(
    manager: Res<DialogueManager>,
    mut texts: Query<&mut Text, With<DialogueProgressText>>,
) {
    let line_count = manager
        .player()
        .and_then(DialoguePlayer::current_sequence)
        .map_or(0, |sequence| sequence.line_count());
    let progress = progress_text(manager.player_state(), line_count);

    for mut text in texts.iter_mut() {
        if text.0 != progress {
            text.0.clone_from(&progress);
        }
    }
}

/// Space, Enter, or a left click advances the dialogue.
pub fn advance_on_input(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut advances: MessageWriter<AdvanceDialogue>,
) {
    if keys.just_pressed(KeyCode::Space)
        || keys.just_pressed(KeyCode::Enter)
        || mouse.just_pressed(MouseButton::Left)
    {
        advances.write(AdvanceDialogue);
    }
}

/// F1 to F5 jump through the area progression.
pub fn area_hotkeys(keys: Res<ButtonInput<KeyCode>>, mut moves: MessageWriter<MoveToArea>) {
    for (index, key) in AREA_KEYS.iter().enumerate() {
        if keys.just_pressed(*key) {
            moves.write(MoveToArea { index });
        }
    }
}

/// After a branching sequence ends, W plays its win follow-up and L its lose
/// follow-up.
pub fn branch_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    manager: Res<DialogueManager>,
    mut completed: MessageReader<SequenceCompleted>,
    mut awaiting: Local<Option<String>>,
    mut plays: MessageWriter<PlayDialogue>,
) {
    for message in completed.read() {
        let branching = manager
            .store()
            .find_by_name(&message.sequence)
            .is_some_and(|sequence| sequence.kind == SequenceKind::Branching);
        if branching {
            info!(target: "dialogue", "{} awaits a result (W win, L lose)", message.sequence);
            *awaiting = Some(message.sequence.clone());
        }
    }

    let outcome = if keys.just_pressed(KeyCode::KeyW) {
        BranchOutcome::Win
    } else if keys.just_pressed(KeyCode::KeyL) {
        BranchOutcome::Lose
    } else {
        return;
    };
    if let Some(sequence) = awaiting.take() {
        plays.write(PlayDialogue::branch(sequence, outcome));
    }
}
