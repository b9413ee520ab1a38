//! NPC plugin wiring line pools, demo NPCs, and dialogue triggers.
use bevy::prelude::*;

use crate::{
    dialogue::systems::handle_play_requests,
    npc::{
        events::{ActivateTrigger, ResetSmallTalk},
        systems::{
            activate_dialogue_triggers, load_npc_line_pools, reset_small_talk, run_auto_dialogue,
            spawn_demo_npcs, trigger_hotkeys,
        },
    },
};

pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ActivateTrigger>()
            .add_message::<ResetSmallTalk>()
            .add_systems(Startup, (load_npc_line_pools, spawn_demo_npcs))
            .add_systems(
                Update,
                (
                    (trigger_hotkeys, activate_dialogue_triggers, reset_small_talk).chain(),
                    run_auto_dialogue,
                )
                    .before(handle_play_requests),
            );
    }
}
