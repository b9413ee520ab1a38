//! Error types surfaced by the dialogue player and manager.
use std::fmt;

/// Failures that abort a play request. None of them are fatal: the manager
/// logs them, returns to idle, and satisfies the caller's continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueError {
    /// The request carried no sequence at all.
    MissingSequence,
    /// No sequence is registered under the requested name.
    SequenceNotFound { name: String },
    /// No sequence is registered under the requested area tag.
    AreaNotFound { area: String },
    /// The manager was built without a player.
    PlayerUnavailable,
    /// The sequence has no lines to display.
    EmptySequence { sequence: String },
    /// A branching request named an outcome the sequence does not define.
    BranchMissing { sequence: String },
}

impl DialogueError {
    pub fn sequence_not_found(name: impl Into<String>) -> Self {
        Self::SequenceNotFound { name: name.into() }
    }

    pub fn area_not_found(area: impl Into<String>) -> Self {
        Self::AreaNotFound { area: area.into() }
    }

    pub fn empty_sequence(sequence: impl Into<String>) -> Self {
        Self::EmptySequence {
            sequence: sequence.into(),
        }
    }

    /// Lookup failures, as opposed to configuration or data problems.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::MissingSequence
                | Self::SequenceNotFound { .. }
                | Self::AreaNotFound { .. }
                | Self::BranchMissing { .. }
        )
    }
}

impl fmt::Display for DialogueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSequence => write!(f, "no dialogue sequence supplied"),
            Self::SequenceNotFound { name } => write!(f, "sequence not found: {}", name),
            Self::AreaNotFound { area } => write!(f, "no sequence found for area: {}", area),
            Self::PlayerUnavailable => write!(f, "dialogue player unavailable"),
            Self::EmptySequence { sequence } => {
                write!(f, "invalid dialogue sequence {}: no lines", sequence)
            }
            Self::BranchMissing { sequence } => {
                write!(f, "sequence {} has no branch for that outcome", sequence)
            }
        }
    }
}

impl std::error::Error for DialogueError {}
