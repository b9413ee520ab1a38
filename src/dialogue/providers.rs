//! Collaborator contracts the dialogue core consumes.
//!
//! Everything here is implemented outside the core: character selection backs
//! [`IdentityProvider`], NPC line pools back [`GeneratedLineProvider`], the
//! objective lock backs [`ObjectiveGate`], and the dialogue view backs
//! [`PresentationSink`]. They are handed to the player and manager per call
//! through [`DialogueServices`].
use bevy::log::debug;

use super::{
    classifier::SpeakerClass,
    types::{GeneratedMode, LineKind},
};

/// Fallback returned when no provider can supply a generated line.
pub const FALLBACK_LINE: &str = "...";

/// Read-only view of the selected player identity.
pub trait IdentityProvider: Send + Sync {
    fn player_name(&self) -> String;

    fn supporting_name(&self) -> String;

    fn is_narrator_token(&self, raw_speaker: &str) -> bool;
}

/// Per-NPC pools of small-talk lines.
///
/// `random_line` and `sequential_line` must never return an empty string;
/// unknown keys yield a fallback line.
pub trait GeneratedLineProvider: Send + Sync {
    fn random_line(&mut self, key: &str) -> String;

    fn sequential_line(&mut self, key: &str) -> String;

    fn has_lines_for(&self, key: &str) -> bool;

    fn reset_sequence_cursor(&mut self, key: &str);
}

/// Quest-side policy deciding whether scripted dialogue may run.
pub trait ObjectiveGate: Send + Sync {
    fn can_progress_story(&self) -> bool;
}

/// Presentation layer the player writes into. Calls are synchronous.
pub trait PresentationSink {
    fn show_speaker(&mut self, name: &str);

    /// Visible prefix of the body; grows while the typewriter runs.
    fn show_body(&mut self, visible: &str);

    fn show_annotation(&mut self, annotation: Option<&str>);

    fn show_role(&mut self, kind: LineKind, class: SpeakerClass);

    /// Portrait request for character lines, `None` for narration.
    fn show_portrait(&mut self, portrait: Option<(&str, &str)>);

    /// Hides everything once playback ends.
    fn clear(&mut self);
}

/// Borrowed bundle of collaborators for a single call into the core.
pub struct DialogueServices<'a> {
    pub identity: Option<&'a dyn IdentityProvider>,
    pub lines: Option<&'a mut dyn GeneratedLineProvider>,
    pub gate: Option<&'a dyn ObjectiveGate>,
    pub sink: &'a mut dyn PresentationSink,
}

/// Fetches a generated line in the requested mode, never returning blank text.
pub fn generated_line(
    provider: Option<&mut (dyn GeneratedLineProvider + '_)>,
    key: &str,
    mode: GeneratedMode,
) -> String {
    let Some(provider) = provider else {
        return FALLBACK_LINE.to_string();
    };
    if !provider.has_lines_for(key) {
        debug!(target: "dialogue", "No generated lines for '{}'", key);
    }

    let line = match mode {
        GeneratedMode::Random => provider.random_line(key),
        GeneratedMode::Sequential => provider.sequential_line(key),
    };

    if line.trim().is_empty() {
        FALLBACK_LINE.to_string()
    } else {
        line
    }
}
