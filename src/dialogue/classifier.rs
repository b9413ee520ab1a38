//! Speaker classification: character lines versus narration.
use std::fmt;

use super::{
    placeholders,
    providers::IdentityProvider,
    types::{DialogueLine, DialogueSequence, SequenceCast},
};

pub const DEFAULT_NARRATION_TOKENS: [&str; 3] = ["Narrator", "[Narrator]", "System"];

/// Whether a line is spoken by a character or by the narrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeakerClass {
    Character,
    Narration,
}

impl SpeakerClass {
    pub fn is_narration(self) -> bool {
        matches!(self, Self::Narration)
    }
}

impl fmt::Display for SpeakerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Character => "character",
            Self::Narration => "narration",
        };
        write!(f, "{}", label)
    }
}

/// Rules for recognising narration speakers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationPolicy {
    pub empty_is_narration: bool,
    /// Compared case-insensitively against the trimmed speaker.
    pub narration_tokens: Vec<String>,
}

impl NarrationPolicy {
    fn matches_token(&self, speaker: &str) -> bool {
        self.narration_tokens
            .iter()
            .any(|token| token.trim().eq_ignore_ascii_case(speaker))
    }
}

impl Default for NarrationPolicy {
    fn default() -> Self {
        Self {
            empty_is_narration: true,
            narration_tokens: DEFAULT_NARRATION_TOKENS
                .iter()
                .map(|token| token.to_string())
                .collect(),
        }
    }
}

/// Classifies a raw speaker token, short-circuiting on the first rule that
/// yields narration:
///
/// 1. the identity provider recognises the placeholder-resolved speaker,
/// 2. the speaker is blank and the policy treats blank as narration,
/// 3. the trimmed speaker matches a narration token,
/// 4. the placeholder-resolved speaker matches a narration token.
pub fn classify(
    raw_speaker: &str,
    policy: &NarrationPolicy,
    identity: Option<&dyn IdentityProvider>,
) -> SpeakerClass {
    let trimmed = raw_speaker.trim();

    if let Some(provider) = identity {
        let resolved = placeholders::resolve(raw_speaker, identity);
        if provider.is_narrator_token(&resolved) {
            return SpeakerClass::Narration;
        }
    }

    if policy.empty_is_narration && trimmed.is_empty() {
        return SpeakerClass::Narration;
    }

    if policy.matches_token(trimmed) {
        return SpeakerClass::Narration;
    }

    let resolved = placeholders::resolve(trimmed, identity);
    if policy.matches_token(resolved.trim()) {
        return SpeakerClass::Narration;
    }

    SpeakerClass::Character
}

/// Classifies an authored line. An explicit `role` wins over the speaker.
pub fn classify_line(
    line: &DialogueLine,
    policy: &NarrationPolicy,
    identity: Option<&dyn IdentityProvider>,
) -> SpeakerClass {
    match line.role {
        Some(role) if role.is_narration() => SpeakerClass::Narration,
        Some(_) => SpeakerClass::Character,
        None => classify(&line.speaker, policy, identity),
    }
}

/// Whether a whole sequence is narration, honouring the authored cast first.
pub fn is_pure_narration(sequence: &DialogueSequence, policy: &NarrationPolicy) -> bool {
    match sequence.cast {
        SequenceCast::Narrator => true,
        SequenceCast::Character => false,
        SequenceCast::Mixed => {
            !sequence.lines.is_empty()
                && sequence
                    .lines
                    .iter()
                    .all(|line| classify_line(line, policy, None).is_narration())
        }
    }
}
