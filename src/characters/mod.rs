//! Main character selection, the dialogue identity provider, and persisted prefs.
pub mod plugin;
pub mod prefs;
pub mod selection;

pub use plugin::CharacterPlugin;
