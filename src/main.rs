use std::path::Path;

use bevy::prelude::*;

mod characters;
mod dialogue;
mod npc;
mod objectives;
mod ui;

use crate::{
    characters::CharacterPlugin, dialogue::DialoguePlugin, npc::NpcPlugin,
    objectives::ObjectivesPlugin, ui::UiPlugin,
};

fn main() {
    load_dialogue_env();

    App::new()
        .add_plugins((
            DefaultPlugins,
            DialoguePlugin, // Inserts DialogueSettings read by the plugins below
            CharacterPlugin,
            ObjectivesPlugin,
            NpcPlugin,
            UiPlugin,
        ))
        .run();
}

/// Loads `DIALOGUE_*` overrides from `dialogue.env` when present.
fn load_dialogue_env() {
    const ENV_FILE: &str = "dialogue.env";

    let path = Path::new(ENV_FILE);
    if !path.exists() {
        return;
    }

    if let Err(err) = dotenvy::from_filename(path) {
        eprintln!("Failed to load {}: {}", ENV_FILE, err);
    }
}
