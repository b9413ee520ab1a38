//! Per-line playback state machine with a typewriter reveal.
//!
//! The player walks one sequence at a time: `play_sequence` shows line 0,
//! `advance` either finishes the running reveal or moves to the next line, and
//! moving past the last line returns a [`SequenceComplete`] to the caller.
use std::{sync::Arc, time::Duration};

use bevy::log::{debug, error, info};

use super::{
    classifier::{self, NarrationPolicy, SpeakerClass},
    errors::DialogueError,
    placeholders,
    providers::{self, DialogueServices, PresentationSink},
    typewriter::Typewriter,
    types::{DialogueSequence, LineKind},
};

const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(20);
const DEFAULT_NARRATION_DISPLAY_NAME: &str = "Narrator";

/// Tunables for line presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Delay between revealed characters.
    pub reveal_interval: Duration,
    /// Whether advancing during a reveal completes it instead of moving on.
    pub skip_on_advance: bool,
    pub narration: NarrationPolicy,
    /// Shown as the speaker for narration lines with a blank speaker.
    pub narration_display_name: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            skip_on_advance: true,
            narration: NarrationPolicy::default(),
            narration_display_name: DEFAULT_NARRATION_DISPLAY_NAME.to_string(),
        }
    }
}

/// Playback bookkeeping, reset on every `play_sequence`.
#[derive(Debug, Clone, Default)]
struct PlaybackState {
    sequence: Option<Arc<DialogueSequence>>,
    line_index: usize,
    is_active: bool,
    is_revealing: bool,
    /// Every line shows as narration, whatever its speaker.
    narrated: bool,
}

/// Coarse state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    DisplayingLine { index: usize, revealing: bool },
}

/// Returned once the last line of a sequence has been advanced past.
#[derive(Debug, Clone)]
pub struct SequenceComplete {
    pub sequence: Arc<DialogueSequence>,
}

/// Fully resolved line as handed to the presentation sink.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedLine {
    pub sequence: String,
    pub index: usize,
    pub speaker: String,
    pub class: SpeakerClass,
    pub kind: LineKind,
    pub body: String,
    pub annotation: Option<String>,
    pub expression: String,
}

#[derive(Debug, Default)]
pub struct DialoguePlayer {
    settings: PlayerSettings,
    state: PlaybackState,
    reveal: Option<Typewriter>,
    shown: Vec<DisplayedLine>,
}

impl DialoguePlayer {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Starts `sequence` from its first line.
    ///
    /// A sequence without lines is rejected and leaves the player idle.
    pub fn play_sequence(
        &mut self,
        sequence: Arc<DialogueSequence>,
        services: &mut DialogueServices<'_>,
    ) -> Result<(), DialogueError> {
        self.reveal = None;

        if sequence.lines.is_empty() {
            let err = DialogueError::empty_sequence(sequence.name.trim());
            error!(target: "dialogue", "{}", err);
            self.state = PlaybackState::default();
            services.sink.clear();
            return Err(err);
        }

        debug!(
            target: "dialogue",
            "Playing sequence '{}' ({} lines)",
            sequence.name,
            sequence.line_count()
        );
        let narrated = classifier::is_pure_narration(&sequence, &self.settings.narration);
        self.state = PlaybackState {
            sequence: Some(sequence),
            line_index: 0,
            is_active: true,
            is_revealing: false,
            narrated,
        };

        // Non-empty, so line 0 always exists.
        let _ = self.display_line(0, services);
        Ok(())
    }

    /// Shows line `index`, or ends the sequence when it is past the last line.
    pub fn display_line(
        &mut self,
        index: usize,
        services: &mut DialogueServices<'_>,
    ) -> Option<SequenceComplete> {
        self.reveal = None;
        self.state.is_revealing = false;

        let sequence = Arc::clone(self.state.sequence.as_ref()?);
        self.state.line_index = index;
        let Some(line) = sequence.line(index) else {
            return self.end_sequence(Arc::clone(&sequence), services.sink);
        };

        let identity = services.identity;
        let class = if self.state.narrated {
            SpeakerClass::Narration
        } else {
            classifier::classify_line(line, &self.settings.narration, identity)
        };

        let mut speaker = placeholders::resolve(line.speaker.trim(), identity);
        if class.is_narration() && speaker.trim().is_empty() {
            speaker = self.settings.narration_display_name.clone();
        }

        let body = if line.use_generated_text {
            let generated = providers::generated_line(
                services.lines.as_deref_mut(),
                line.generated_key(),
                line.generated_mode,
            );
            placeholders::resolve(&generated, identity)
        } else {
            placeholders::resolve(&line.text, identity)
        };

        let annotation = line
            .annotation
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| placeholders::resolve(text, identity));

        let sink = &mut *services.sink;
        sink.show_speaker(&speaker);
        sink.show_role(line.kind, class);
        if class.is_narration() {
            sink.show_portrait(None);
        } else {
            sink.show_portrait(Some((speaker.as_str(), line.expression.as_str())));
        }
        sink.show_annotation(annotation.as_deref());

        let reveal = Typewriter::start(body.clone(), self.settings.reveal_interval);
        sink.show_body(reveal.visible());
        self.state.is_revealing = !reveal.is_finished();
        if self.state.is_revealing {
            self.reveal = Some(reveal);
        }

        let displayed = DisplayedLine {
            sequence: sequence.name.clone(),
            index,
            speaker,
            class,
            kind: line.kind,
            body,
            annotation,
            expression: line.expression.clone(),
        };
        self.shown.push(displayed);
        None
    }

    /// Finishes the running reveal, or moves to the next line.
    pub fn advance(&mut self, services: &mut DialogueServices<'_>) -> Option<SequenceComplete> {
        if !self.state.is_active {
            return None;
        }

        if self.state.is_revealing && self.settings.skip_on_advance {
            self.finish_reveal(services.sink);
            return None;
        }

        let next = self.state.line_index + 1;
        self.display_line(next, services)
    }

    /// Frame hook driving the typewriter.
    pub fn tick(&mut self, delta: Duration, sink: &mut dyn PresentationSink) {
        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };

        if reveal.tick(delta) {
            sink.show_body(reveal.visible());
        }
        if reveal.is_finished() {
            self.reveal = None;
            self.state.is_revealing = false;
        }
    }

    /// Cancels playback without reporting completion.
    pub fn stop(&mut self, sink: &mut dyn PresentationSink) {
        if self.state.is_active {
            info!(target: "dialogue", "Dialogue playback stopped");
        }
        self.reveal = None;
        self.state.is_active = false;
        self.state.is_revealing = false;
        sink.clear();
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn is_revealing(&self) -> bool {
        self.state.is_revealing
    }

    pub fn current_sequence(&self) -> Option<&Arc<DialogueSequence>> {
        self.state.sequence.as_ref()
    }

    pub fn state(&self) -> PlayerState {
        if self.state.is_active {
            PlayerState::DisplayingLine {
                index: self.state.line_index,
                revealing: self.state.is_revealing,
            }
        } else {
            PlayerState::Idle
        }
    }

    /// Lines displayed since the last drain, oldest first.
    pub fn drain_shown(&mut self) -> Vec<DisplayedLine> {
        std::mem::take(&mut self.shown)
    }

    fn finish_reveal(&mut self, sink: &mut dyn PresentationSink) {
        if let Some(mut reveal) = self.reveal.take() {
            reveal.finish();
            sink.show_body(reveal.full_text());
        }
        self.state.is_revealing = false;
    }

    fn end_sequence(
        &mut self,
        sequence: Arc<DialogueSequence>,
        sink: &mut dyn PresentationSink,
    ) -> Option<SequenceComplete> {
        self.state.is_active = false;
        self.state.is_revealing = false;
        sink.clear();
        info!(target: "dialogue", "Dialogue sequence '{}' completed", sequence.name);
        Some(SequenceComplete { sequence })
    }
}
