//! Objective plugin: lock resource plus message handlers.
use bevy::prelude::*;

use super::lock::{ObjectiveLock, ObjectiveUpdate};
use crate::dialogue::config::DialogueSettings;

/// Objective started from the keyboard while trying out gating.
const HOTKEY_OBJECTIVE: &str = "GoToWarehouse";
const HOTKEY_OBJECTIVE_STEPS: u32 = 2;
const START_OBJECTIVE_KEY: KeyCode = KeyCode::KeyO;
const PROGRESS_OBJECTIVE_KEY: KeyCode = KeyCode::KeyP;
const COMPLETE_OBJECTIVE_KEY: KeyCode = KeyCode::KeyC;

#[derive(Message, Debug, Clone)]
pub struct StartObjective {
    pub id: String,
    pub required: u32,
}

#[derive(Message, Debug, Clone)]
pub struct ObjectiveProgress {
    pub id: String,
    pub amount: u32,
}

#[derive(Message, Debug, Clone)]
pub struct CompleteObjective {
    pub id: String,
}

/// Fired once an objective finishes and story dialogue may resume.
#[derive(Message, Debug, Clone)]
pub struct ObjectiveCompleted {
    pub id: String,
}

pub struct ObjectivesPlugin;

impl Plugin for ObjectivesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ObjectiveLock>()
            .add_message::<StartObjective>()
            .add_message::<ObjectiveProgress>()
            .add_message::<CompleteObjective>()
            .add_message::<ObjectiveCompleted>()
            .add_systems(Startup, apply_objective_settings)
            .add_systems(
                Update,
                (objective_hotkeys, handle_objective_messages).chain(),
            );
    }
}

fn apply_objective_settings(settings: Option<Res<DialogueSettings>>, mut lock: ResMut<ObjectiveLock>) {
    if let Some(settings) = settings {
        lock.set_strict_mode(settings.strict_mode);
    }
}

/// Start, step, and finish the hotkey objective. Progress and completion
/// apply to whichever objective is active.
pub fn objective_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    lock: Res<ObjectiveLock>,
    mut starts: MessageWriter<StartObjective>,
    mut progress: MessageWriter<ObjectiveProgress>,
    mut completions: MessageWriter<CompleteObjective>,
) {
    if keys.just_pressed(START_OBJECTIVE_KEY) {
        if lock.is_objective_active() {
            debug!(target: "dialogue", "An objective is already running");
        } else {
            starts.write(StartObjective {
                id: HOTKEY_OBJECTIVE.to_string(),
                required: HOTKEY_OBJECTIVE_STEPS,
            });
        }
    }

    let Some(active) = lock.active() else {
        return;
    };
    if keys.just_pressed(PROGRESS_OBJECTIVE_KEY) {
        progress.write(ObjectiveProgress {
            id: active.id.clone(),
            amount: 1,
        });
    }
    if keys.just_pressed(COMPLETE_OBJECTIVE_KEY) {
        completions.write(CompleteObjective {
            id: active.id.clone(),
        });
    }
}

pub fn handle_objective_messages(
    mut lock: ResMut<ObjectiveLock>,
    mut starts: MessageReader<StartObjective>,
    mut progress: MessageReader<ObjectiveProgress>,
    mut completions: MessageReader<CompleteObjective>,
    mut completed: MessageWriter<ObjectiveCompleted>,
) {
    let mut updates = Vec::new();
    for message in starts.read() {
        updates.push(lock.start(&message.id, message.required));
    }
    for message in progress.read() {
        updates.push(lock.progress(&message.id, message.amount));
    }
    for message in completions.read() {
        updates.push(lock.complete(&message.id));
    }

    for update in updates {
        if let ObjectiveUpdate::Completed(id) = update {
            completed.write(ObjectiveCompleted { id });
        }
    }
}
