//! Character plugin restoring the saved selection and handling new picks.
use bevy::prelude::*;

use super::{
    prefs::PrefsStore,
    selection::{CharacterSelection, SelectedCharacter},
};
use crate::dialogue::config::DialogueSettings;

/// Menu order: the first key picks Raline, the second Gavi.
const CHARACTER_KEYS: [KeyCode; 2] = [KeyCode::KeyR, KeyCode::KeyG];
const RESET_CHARACTER_KEY: KeyCode = KeyCode::Backspace;

/// Picks a main character by menu index.
#[derive(Message, Debug, Clone, Copy)]
pub struct SelectCharacter {
    pub index: usize,
}

/// Forgets the saved main character.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ResetCharacter;

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SelectCharacter>()
            .add_message::<ResetCharacter>()
            .add_systems(Startup, restore_character_selection)
            .add_systems(
                Update,
                (character_hotkeys, apply_character_selection).chain(),
            );
    }
}

fn restore_character_selection(mut commands: Commands, settings: Option<Res<DialogueSettings>>) {
    let prefs = match settings {
        Some(settings) => PrefsStore::load_or_default(settings.prefs_path.clone()),
        None => PrefsStore::in_memory(),
    };
    let selection = CharacterSelection::from_prefs(&prefs);
    info!(
        target: "dialogue",
        "Restored character selection: {}",
        selection.selected()
    );
    commands.insert_resource(selection);
    commands.insert_resource(prefs);
}

pub fn character_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    mut picks: MessageWriter<SelectCharacter>,
    mut resets: MessageWriter<ResetCharacter>,
) {
    for (index, key) in CHARACTER_KEYS.iter().enumerate() {
        if keys.just_pressed(*key) {
            picks.write(SelectCharacter { index });
        }
    }
    if keys.just_pressed(RESET_CHARACTER_KEY) {
        resets.write(ResetCharacter);
    }
}

pub fn apply_character_selection(
    mut requests: MessageReader<SelectCharacter>,
    mut resets: MessageReader<ResetCharacter>,
    selection: Option<ResMut<CharacterSelection>>,
    prefs: Option<ResMut<PrefsStore>>,
) {
    let (Some(mut selection), Some(mut prefs)) = (selection, prefs) else {
        requests.clear();
        resets.clear();
        return;
    };

    for _ in resets.read() {
        info!(target: "dialogue", "Character selection reset");
        selection.reset(&mut prefs);
    }
    for request in requests.read() {
        selection.select(SelectedCharacter::from_menu_index(request.index), &mut prefs);
    }
}
