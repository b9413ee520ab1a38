// src/ui/dialogue_box/plugin.rs
//
// UiPlugin coordinates the dialogue box and its input handling.

use bevy::prelude::*;

use crate::dialogue::systems::{
    advance_dialogue, handle_area_moves, handle_play_requests, publish_dialogue_events,
};

use super::components::DialogueBoxSettings;
use super::systems::{
    advance_on_input, area_hotkeys, branch_hotkeys, spawn_dialogue_box, spawn_ui_camera,
    update_dialogue_box, update_dialogue_progress,
};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        info!("UiPlugin registered");

        app.init_resource::<DialogueBoxSettings>()
            .add_systems(Startup, (spawn_ui_camera, spawn_dialogue_box))
            .add_systems(
                Update,
                (
                    advance_on_input.before(advance_dialogue),
                    area_hotkeys.before(handle_area_moves),
                    branch_hotkeys.before(handle_play_requests),
                    (update_dialogue_box, update_dialogue_progress).after(publish_dialogue_events),
                ),
            );
    }
}
