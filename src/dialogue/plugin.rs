//! Dialogue plugin wiring settings, the manager, and its systems.
use bevy::prelude::*;

use super::{
    catalog,
    config::DialogueSettings,
    events::{
        AdvanceDialogue, AreaCompleted, DialogueDenied, DialogueFinished, DialogueLineShown,
        MoveToArea, PlayDialogue, SequenceCompleted,
    },
    history::{
        flush_dialogue_history_log, record_dialogue_history, DialogueHistory, DialogueHistoryLog,
    },
    manager::DialogueManager,
    player::DialoguePlayer,
    store::SequenceStore,
    systems::{
        advance_dialogue, handle_area_moves, handle_play_requests, log_dialogue_catalog,
        publish_dialogue_events, tick_dialogue_reveal,
    },
    view::DialogueView,
};

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        let settings = DialogueSettings::load_or_default();
        info!(
            target: "dialogue",
            "Dialogue configured: reveal every {} ms, skip on advance {}, {} areas",
            settings.player.reveal_interval.as_millis(),
            settings.player.skip_on_advance,
            settings.manager.areas.len()
        );

        let mut store = SequenceStore::new();
        catalog::load_into(&mut store, &settings.catalog_files);
        let manager = DialogueManager::new(
            store,
            Some(DialoguePlayer::new(settings.player.clone())),
            settings.manager.clone(),
        );

        let history_log = match settings.history.log_path.clone() {
            Some(path) => DialogueHistoryLog::new(path),
            None => DialogueHistoryLog::disabled(),
        };

        app.insert_resource(DialogueHistory::new(settings.history.capacity))
            .insert_resource(history_log)
            .insert_resource(manager)
            .insert_resource(settings)
            .init_resource::<DialogueView>()
            .add_message::<PlayDialogue>()
            .add_message::<AdvanceDialogue>()
            .add_message::<MoveToArea>()
            .add_message::<DialogueLineShown>()
            .add_message::<SequenceCompleted>()
            .add_message::<AreaCompleted>()
            .add_message::<DialogueFinished>()
            .add_message::<DialogueDenied>()
            .add_systems(Startup, log_dialogue_catalog)
            .add_systems(
                Update,
                (
                    handle_play_requests,
                    handle_area_moves,
                    advance_dialogue,
                    tick_dialogue_reveal,
                    publish_dialogue_events,
                    record_dialogue_history,
                    flush_dialogue_history_log,
                )
                    .chain(),
            );
    }
}
