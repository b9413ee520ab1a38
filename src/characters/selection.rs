//! Main character selection and the identity it exposes to dialogue.
use std::fmt;

use bevy::prelude::*;

use super::prefs::PrefsStore;
use crate::dialogue::providers::IdentityProvider;

pub const SELECTED_CHARACTER_KEY: &str = "SelectedCharacter";

/// Playable main character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectedCharacter {
    #[default]
    None,
    Raline,
    Gavi,
}

impl SelectedCharacter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Raline => "Raline",
            Self::Gavi => "Gavi",
        }
    }

    /// The other main character. Anything but Raline pairs with Raline.
    pub const fn supporting(self) -> Self {
        match self {
            Self::Raline => Self::Gavi,
            _ => Self::Raline,
        }
    }

    /// Menu index: 0 picks Raline, anything else Gavi.
    pub const fn from_menu_index(index: usize) -> Self {
        if index == 0 {
            Self::Raline
        } else {
            Self::Gavi
        }
    }

    const fn to_pref(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Raline => 1,
            Self::Gavi => 2,
        }
    }

    const fn from_pref(value: i64) -> Self {
        match value {
            1 => Self::Raline,
            2 => Self::Gavi,
            _ => Self::None,
        }
    }
}

impl fmt::Display for SelectedCharacter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current selection; the dialogue identity provider.
#[derive(Resource, Debug, Clone, Default)]
pub struct CharacterSelection {
    selected: SelectedCharacter,
}

impl CharacterSelection {
    pub fn new(selected: SelectedCharacter) -> Self {
        Self { selected }
    }

    pub fn from_prefs(prefs: &PrefsStore) -> Self {
        if !prefs.has_key(SELECTED_CHARACTER_KEY) {
            return Self::default();
        }
        let selected = prefs
            .get_i64(SELECTED_CHARACTER_KEY)
            .map(SelectedCharacter::from_pref)
            .unwrap_or_default();
        Self { selected }
    }

    pub fn has_selected_character(&self) -> bool {
        self.selected != SelectedCharacter::None
    }

    pub fn selected(&self) -> SelectedCharacter {
        self.selected
    }

    pub fn select(&mut self, selected: SelectedCharacter, prefs: &mut PrefsStore) {
        self.selected = selected;
        prefs.set_i64(SELECTED_CHARACTER_KEY, selected.to_pref());
        if let Err(err) = prefs.save() {
            warn!(
                target: "dialogue",
                "Failed to persist character selection to {:?}: {}",
                prefs.path(),
                err
            );
        }
        info!(target: "dialogue", "Character selected: {}", selected);
    }

    /// Forgets the selection, both in memory and on disk.
    pub fn reset(&mut self, prefs: &mut PrefsStore) {
        self.selected = SelectedCharacter::None;
        if prefs.delete_key(SELECTED_CHARACTER_KEY) {
            if let Err(err) = prefs.save() {
                warn!(target: "dialogue", "Failed to persist prefs: {}", err);
            }
        }
    }
}

impl IdentityProvider for CharacterSelection {
    fn player_name(&self) -> String {
        self.selected.as_str().to_string()
    }

    fn supporting_name(&self) -> String {
        self.selected.supporting().as_str().to_string()
    }

    fn is_narrator_token(&self, raw_speaker: &str) -> bool {
        let speaker = raw_speaker.trim().to_lowercase();
        speaker.is_empty() || speaker == "narrator" || speaker == "[narrator]" || speaker == "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::placeholders;

    #[test]
    fn supporting_character_is_the_other_one() {
        let raline = CharacterSelection::new(SelectedCharacter::Raline);
        assert_eq!(raline.player_name(), "Raline");
        assert_eq!(raline.supporting_name(), "Gavi");

        let gavi = CharacterSelection::new(SelectedCharacter::Gavi);
        assert_eq!(gavi.supporting_name(), "Raline");

        let nobody = CharacterSelection::default();
        assert_eq!(nobody.player_name(), "None");
        assert_eq!(nobody.supporting_name(), "Raline");
    }

    #[test]
    fn narrator_tokens_are_recognised() {
        let selection = CharacterSelection::default();
        assert!(selection.is_narrator_token(""));
        assert!(selection.is_narrator_token(" [NARRATOR] "));
        assert!(selection.is_narrator_token("System"));
        assert!(!selection.is_narrator_token("Gavi"));
    }

    #[test]
    fn selection_persists_through_prefs() {
        let mut prefs = PrefsStore::in_memory();
        let mut selection = CharacterSelection::default();
        selection.select(SelectedCharacter::from_menu_index(1), &mut prefs);

        let restored = CharacterSelection::from_prefs(&prefs);
        assert_eq!(restored.selected(), SelectedCharacter::Gavi);
        assert!(restored.has_selected_character());
        assert_eq!(
            placeholders::resolve("[Player] and [Supporting Character]", Some(&restored as &dyn IdentityProvider)),
            "Gavi and Raline"
        );

        selection.reset(&mut prefs);
        assert_eq!(
            CharacterSelection::from_prefs(&prefs).selected(),
            SelectedCharacter::None
        );
        assert!(!selection.has_selected_character());
        assert!(!CharacterSelection::from_prefs(&PrefsStore::in_memory()).has_selected_character());
    }
}
