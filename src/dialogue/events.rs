//! Messages into and out of the dialogue manager.
use std::sync::Arc;

use bevy::prelude::Message;

use super::{
    manager::DialogueTicket,
    player::DisplayedLine,
    types::{BranchOutcome, DialogueSequence},
};

/// How a play request names its sequence.
#[derive(Debug, Clone)]
pub enum DialogueTarget {
    Sequence(Arc<DialogueSequence>),
    Name(String),
    Area(String),
    /// Win or lose follow-up of the named branching sequence.
    Branch {
        sequence: String,
        outcome: BranchOutcome,
    },
}

/// Request to start dialogue. `ticket` comes back in [`DialogueFinished`].
#[derive(Message, Debug, Clone)]
pub struct PlayDialogue {
    pub target: DialogueTarget,
    /// Bypass objective gating.
    pub casual: bool,
    pub ticket: Option<DialogueTicket>,
}

impl PlayDialogue {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            target: DialogueTarget::Name(name.into()),
            casual: false,
            ticket: None,
        }
    }

    /// Win or lose follow-up of the branching sequence `sequence`.
    pub fn branch(sequence: impl Into<String>, outcome: BranchOutcome) -> Self {
        Self {
            target: DialogueTarget::Branch {
                sequence: sequence.into(),
                outcome,
            },
            casual: false,
            ticket: None,
        }
    }

    pub fn casual(sequence: Arc<DialogueSequence>) -> Self {
        Self {
            target: DialogueTarget::Sequence(sequence),
            casual: true,
            ticket: None,
        }
    }
}

/// Player input: finish the reveal or move to the next line.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct AdvanceDialogue;

/// Jump to an entry of the area progression.
#[derive(Message, Debug, Clone, Copy)]
pub struct MoveToArea {
    pub index: usize,
}

#[derive(Message, Debug, Clone)]
pub struct DialogueLineShown {
    pub line: DisplayedLine,
}

#[derive(Message, Debug, Clone)]
pub struct SequenceCompleted {
    pub sequence: String,
}

/// The last sequence of a chain finished.
#[derive(Message, Debug, Clone)]
pub struct AreaCompleted {
    pub area: String,
}

#[derive(Message, Debug, Clone)]
pub struct DialogueFinished {
    pub ticket: DialogueTicket,
}

/// A scripted sequence was blocked by the objective gate.
#[derive(Message, Debug, Clone)]
pub struct DialogueDenied {
    pub sequence: String,
}
