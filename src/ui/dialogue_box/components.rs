// src/ui/dialogue_box/components.rs
//
// Marker components and layout settings for the dialogue box.

use bevy::prelude::*;

use crate::dialogue::{player::PlayerState, types::LineKind};

/// Root node of the dialogue box; hidden while no dialogue plays.
#[derive(Component, Debug)]
pub struct DialogueBoxRoot;

#[derive(Component, Debug)]
pub struct DialogueSpeakerText;

#[derive(Component, Debug)]
pub struct DialogueBodyText;

#[derive(Component, Debug)]
pub struct DialogueAnnotationText;

/// Shows which portrait asset the current line asks for.
#[derive(Component, Debug)]
pub struct DialoguePortraitLabel;

/// Line counter in the corner of the box.
#[derive(Component, Debug)]
pub struct DialogueProgressText;

/// Layout of the dialogue box.
#[derive(Resource, Debug)]
pub struct DialogueBoxSettings {
    /// Box height (pixels).
    pub height: f32,

    /// Gap to the screen edges (pixels).
    pub margin: f32,

    pub padding: f32,

    pub border_width: f32,

    pub speaker_font_size: f32,

    pub body_font_size: f32,

    pub annotation_font_size: f32,
}

impl Default for DialogueBoxSettings {
    fn default() -> Self {
        Self {
            height: 180.0,
            margin: 24.0,
            padding: 16.0,
            border_width: 2.0,
            speaker_font_size: 22.0,
            body_font_size: 20.0,
            annotation_font_size: 16.0,
        }
    }
}

pub const BACKGROUND_COLOR: Color = Color::srgba(0.08, 0.08, 0.1, 0.92);
pub const BORDER_COLOR: Color = Color::srgb(0.35, 0.35, 0.4);
pub const NARRATION_COLOR: Color = Color::srgb(0.75, 0.75, 0.8);
pub const ANNOTATION_COLOR: Color = Color::srgb(0.6, 0.6, 0.65);

/// Body colour for each line kind.
pub fn kind_color(kind: LineKind) -> Color {
    match kind {
        LineKind::Normal => Color::WHITE,
        LineKind::Objective => Color::srgb(1.0, 0.85, 0.3),
        LineKind::WinResult => Color::srgb(0.45, 0.9, 0.45),
        LineKind::LoseResult => Color::srgb(0.95, 0.4, 0.4),
        LineKind::NpcRandom => Color::srgb(0.6, 0.8, 1.0),
    }
}

/// Action text is shown between asterisks.
pub fn annotation_text(annotation: Option<&str>) -> String {
    annotation
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| format!("*{}*", text))
        .unwrap_or_default()
}

/// `2/5`, with a `>` once the line is fully revealed and can be advanced.
pub fn progress_text(state: PlayerState, line_count: usize) -> String {
    match state {
        PlayerState::Idle => String::new(),
        PlayerState::DisplayingLine { index, revealing } => {
            let prompt = if revealing { "" } else { " >" };
            format!("{}/{}{}", index + 1, line_count, prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_is_wrapped_in_asterisks() {
        assert_eq!(annotation_text(Some(" sighs ")), "*sighs*");
        assert_eq!(annotation_text(Some("  ")), "");
        assert_eq!(annotation_text(None), "");
    }

    #[test]
    fn result_lines_stand_out() {
        assert_ne!(kind_color(LineKind::WinResult), kind_color(LineKind::Normal));
        assert_ne!(kind_color(LineKind::LoseResult), kind_color(LineKind::WinResult));
    }

    #[test]
    fn progress_counts_from_one_and_prompts_when_revealed() {
        assert_eq!(progress_text(PlayerState::Idle, 3), "");
        assert_eq!(
            progress_text(
                PlayerState::DisplayingLine {
                    index: 0,
                    revealing: true
                },
                3
            ),
            "1/3"
        );
        assert_eq!(
            progress_text(
                PlayerState::DisplayingLine {
                    index: 2,
                    revealing: false
                },
                3
            ),
            "3/3 >"
        );
    }
}
