//! Single active objective that can hold back scripted dialogue.
use bevy::{
    log::{info, warn},
    prelude::Resource,
};

use crate::dialogue::providers::ObjectiveGate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveObjective {
    pub id: String,
    pub required: u32,
    pub progress: u32,
}

/// What happened to an objective after a lock operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectiveUpdate {
    Started(String),
    Progressed { id: String, progress: u32, required: u32 },
    Completed(String),
    Rejected(String),
}

/// Objective gate for dialogue: strict mode blocks story dialogue while an
/// objective is running.
#[derive(Resource, Debug, Clone)]
pub struct ObjectiveLock {
    strict_mode: bool,
    active: Option<ActiveObjective>,
}

impl ObjectiveLock {
    pub fn new(strict_mode: bool) -> Self {
        Self {
            strict_mode,
            active: None,
        }
    }

    pub fn set_strict_mode(&mut self, strict_mode: bool) {
        self.strict_mode = strict_mode;
    }

    pub fn active(&self) -> Option<&ActiveObjective> {
        self.active.as_ref()
    }

    pub fn is_objective_active(&self) -> bool {
        self.active.is_some()
    }

    /// Starts `id`. In strict mode a running objective must finish first.
    pub fn start(&mut self, id: &str, required: u32) -> ObjectiveUpdate {
        let id = id.trim().to_string();
        if let Some(current) = self.active.as_ref().filter(|_| self.strict_mode) {
            warn!(
                target: "dialogue",
                "Objective {} rejected; finish {} first",
                id,
                current.id
            );
            return ObjectiveUpdate::Rejected(id);
        }

        info!(target: "dialogue", "Objective started: {}", id);
        self.active = Some(ActiveObjective {
            id: id.clone(),
            required: required.max(1),
            progress: 0,
        });
        ObjectiveUpdate::Started(id)
    }

    /// Adds progress to the running objective, completing it at the target.
    pub fn progress(&mut self, id: &str, amount: u32) -> ObjectiveUpdate {
        let id = id.trim();
        let Some(active) = self.active.as_mut().filter(|active| active.id == id) else {
            warn!(target: "dialogue", "Cannot update objective {} (not active)", id);
            return ObjectiveUpdate::Rejected(id.to_string());
        };

        active.progress = active.progress.saturating_add(amount);
        if active.progress >= active.required {
            return self.complete(id);
        }
        ObjectiveUpdate::Progressed {
            id: active.id.clone(),
            progress: active.progress,
            required: active.required,
        }
    }

    pub fn complete(&mut self, id: &str) -> ObjectiveUpdate {
        let id = id.trim();
        match self.active.take() {
            Some(active) if active.id == id => {
                info!(target: "dialogue", "Objective completed: {}", id);
                ObjectiveUpdate::Completed(active.id)
            }
            other => {
                self.active = other;
                ObjectiveUpdate::Rejected(id.to_string())
            }
        }
    }
}

impl Default for ObjectiveLock {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ObjectiveGate for ObjectiveLock {
    fn can_progress_story(&self) -> bool {
        !(self.strict_mode && self.is_objective_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_blocks_story_while_active() {
        let mut lock = ObjectiveLock::default();
        assert!(lock.can_progress_story());

        assert_eq!(
            lock.start("GoToWarehouse", 1),
            ObjectiveUpdate::Started("GoToWarehouse".into())
        );
        assert!(!lock.can_progress_story());
        assert_eq!(
            lock.start("TalkToOmar", 1),
            ObjectiveUpdate::Rejected("TalkToOmar".into())
        );

        lock.set_strict_mode(false);
        assert!(lock.can_progress_story());
    }

    #[test]
    fn progress_completes_at_target() {
        let mut lock = ObjectiveLock::default();
        lock.start("CollectBooks", 2);

        assert_eq!(
            lock.progress("CollectBooks", 1),
            ObjectiveUpdate::Progressed {
                id: "CollectBooks".into(),
                progress: 1,
                required: 2
            }
        );
        assert!(matches!(
            lock.progress("Other", 1),
            ObjectiveUpdate::Rejected(_)
        ));
        assert_eq!(
            lock.progress("CollectBooks", 1),
            ObjectiveUpdate::Completed("CollectBooks".into())
        );
        assert!(!lock.is_objective_active());
        assert!(lock.can_progress_story());
    }

    #[test]
    fn completing_the_wrong_objective_keeps_the_active_one() {
        let mut lock = ObjectiveLock::default();
        lock.start("GoToTownHall", 1);
        assert!(matches!(lock.complete("Nope"), ObjectiveUpdate::Rejected(_)));
        assert_eq!(lock.active().map(|a| a.id.as_str()), Some("GoToTownHall"));
    }
}
