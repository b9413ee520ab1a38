//! Components that let world entities start dialogue.
use std::time::Duration;

use bevy::prelude::*;

use crate::dialogue::types::GeneratedMode;

/// What a trigger plays when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerTarget {
    Name(String),
    /// First sequence tagged with the area.
    Area(String),
}

/// Starts a scripted sequence when activated, optionally only once.
#[derive(Component, Debug, Clone)]
pub struct DialogueTrigger {
    pub target: TriggerTarget,
    pub trigger_once: bool,
    has_triggered: bool,
}

impl DialogueTrigger {
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(TriggerTarget::Name(name.into()))
    }

    pub fn area(area: impl Into<String>) -> Self {
        Self::new(TriggerTarget::Area(area.into()))
    }

    fn new(target: TriggerTarget) -> Self {
        Self {
            target,
            trigger_once: false,
            has_triggered: false,
        }
    }

    pub fn once(mut self) -> Self {
        self.trigger_once = true;
        self
    }

    /// Whether the trigger may fire now; marks it used when it does.
    pub fn try_fire(&mut self) -> bool {
        if self.trigger_once && self.has_triggered {
            return false;
        }
        self.has_triggered = true;
        true
    }
}

/// Plays a scripted sequence once, `delay` after the entity appears.
///
/// With `require_character` set it keeps waiting until a main character has
/// been picked.
#[derive(Component, Debug, Clone)]
pub struct AutoDialogue {
    pub sequence: String,
    pub delay: Timer,
    pub require_character: bool,
    fired: bool,
}

impl AutoDialogue {
    pub fn new(sequence: impl Into<String>, delay: Duration) -> Self {
        Self {
            sequence: sequence.into(),
            delay: Timer::new(delay, TimerMode::Once),
            require_character: true,
            fired: false,
        }
    }

    #[allow(dead_code)]
    pub fn without_character(mut self) -> Self {
        self.require_character = false;
        self
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Advances the delay. Returns true exactly once, when the sequence
    /// should start.
    pub fn tick(&mut self, delta: Duration, character_selected: bool) -> bool {
        if self.fired {
            return false;
        }
        self.delay.tick(delta);
        if !self.delay.is_finished() || (self.require_character && !character_selected) {
            return false;
        }
        self.fired = true;
        true
    }
}

/// NPC that answers with a line from its generated pool.
#[derive(Component, Debug, Clone)]
pub struct SmallTalk {
    pub speaker: String,
    pub mode: GeneratedMode,
}

impl SmallTalk {
    pub fn new(speaker: impl Into<String>, mode: GeneratedMode) -> Self {
        Self {
            speaker: speaker.into(),
            mode,
        }
    }
}

/// Keyboard shortcut that activates the entity's trigger.
#[derive(Component, Debug, Clone, Copy)]
pub struct TriggerHotkey(pub KeyCode);
