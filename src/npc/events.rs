//! NPC interaction messages.
use bevy::prelude::{Entity, Message};

/// The player interacted with `entity` (click, tap, or hotkey).
#[derive(Message, Debug, Clone, Copy)]
pub struct ActivateTrigger {
    pub entity: Entity,
}

/// Restart sequential small talk for `speaker`, or for every pool when `None`.
#[derive(Message, Debug, Clone, Default)]
pub struct ResetSmallTalk {
    pub speaker: Option<String>,
}
