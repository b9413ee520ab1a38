//! In-memory catalog of dialogue sequences keyed by name and area tag.
use std::{collections::HashMap, sync::Arc};

use bevy::log::warn;

use super::types::{BranchOutcome, DialogueSequence};

/// Registered sequences in authoring order plus a case-folded name index.
#[derive(Debug, Default, Clone)]
pub struct SequenceStore {
    sequences: Vec<Arc<DialogueSequence>>,
    by_name: HashMap<String, usize>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sequence and returns the shared handle stored in the catalog.
    ///
    /// On a name collision the first registration keeps the name; the later
    /// sequence stays reachable by area only.
    pub fn register(&mut self, sequence: impl Into<Arc<DialogueSequence>>) -> Arc<DialogueSequence> {
        let sequence = sequence.into();
        let key = fold(&sequence.name);
        let index = self.sequences.len();
        self.sequences.push(Arc::clone(&sequence));

        if key.is_empty() {
            warn!(
                target: "dialogue",
                "Registered a sequence without a name (area '{}'); it can only be found by area",
                sequence.area
            );
        } else if self.by_name.contains_key(&key) {
            warn!(
                target: "dialogue",
                "Duplicate sequence name '{}'; keeping the first registration",
                sequence.name.trim()
            );
        } else {
            self.by_name.insert(key, index);
        }

        sequence
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<DialogueSequence>> {
        let key = fold(name);
        if key.is_empty() {
            return None;
        }
        self.by_name
            .get(&key)
            .map(|index| Arc::clone(&self.sequences[*index]))
    }

    /// First sequence in registration order whose area tag matches.
    pub fn find_by_area(&self, area: &str) -> Option<Arc<DialogueSequence>> {
        let area = area.trim();
        if area.is_empty() {
            return None;
        }
        self.sequences
            .iter()
            .find(|sequence| sequence.area.trim().eq_ignore_ascii_case(area))
            .cloned()
    }

    /// Whether this exact sequence instance came from the catalog.
    pub fn contains(&self, sequence: &Arc<DialogueSequence>) -> bool {
        self.sequences
            .iter()
            .any(|registered| Arc::ptr_eq(registered, sequence))
    }

    pub fn resolve_next(&self, sequence: &DialogueSequence) -> Option<Arc<DialogueSequence>> {
        sequence
            .next_name()
            .and_then(|next| self.find_by_name(next))
    }

    pub fn resolve_branch(
        &self,
        sequence: &DialogueSequence,
        outcome: BranchOutcome,
    ) -> Option<Arc<DialogueSequence>> {
        sequence
            .branch_name(outcome)
            .and_then(|branch| self.find_by_name(branch))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DialogueSequence>> {
        self.sequences.iter()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}
