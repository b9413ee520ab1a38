//! Systems feeding messages and frame time into the dialogue manager.
use bevy::{ecs::system::SystemParam, prelude::*};

use super::{
    events::{
        AdvanceDialogue, AreaCompleted, DialogueDenied, DialogueFinished, DialogueLineShown,
        DialogueTarget, MoveToArea, PlayDialogue, SequenceCompleted,
    },
    manager::{DialogueEvent, DialogueManager, OnDone, PlayOutcome},
    providers::{DialogueServices, GeneratedLineProvider, IdentityProvider, ObjectiveGate},
    view::DialogueView,
};
use crate::{characters::selection::CharacterSelection, npc::lines::NpcLinePools, objectives::lock::ObjectiveLock};

/// Resources the manager needs per call. Every collaborator but the view is optional.
#[derive(SystemParam)]
pub struct DialogueCollaborators<'w> {
    identity: Option<Res<'w, CharacterSelection>>,
    lines: Option<ResMut<'w, NpcLinePools>>,
    gate: Option<Res<'w, ObjectiveLock>>,
    view: ResMut<'w, DialogueView>,
}

impl DialogueCollaborators<'_> {
    pub fn services(&mut self) -> DialogueServices<'_> {
        DialogueServices {
            identity: self
                .identity
                .as_deref()
                .map(|identity| identity as &dyn IdentityProvider),
            lines: self
                .lines
                .as_deref_mut()
                .map(|lines| lines as &mut dyn GeneratedLineProvider),
            gate: self.gate.as_deref().map(|gate| gate as &dyn ObjectiveGate),
            sink: &mut *self.view,
        }
    }
}

pub fn handle_play_requests(
    mut manager: ResMut<DialogueManager>,
    mut collaborators: DialogueCollaborators,
    mut requests: MessageReader<PlayDialogue>,
) {
    for request in requests.read() {
        let on_done = request.ticket.map(OnDone::Notify);
        let casual = request.casual;
        let mut services = collaborators.services();

        let outcome = match &request.target {
            DialogueTarget::Sequence(sequence) if casual => {
                manager.play_casual_dialogue(Some(sequence.clone()), on_done, &mut services)
            }
            DialogueTarget::Sequence(sequence) => {
                manager.play_sequence(Some(sequence.clone()), on_done, false, &mut services)
            }
            DialogueTarget::Name(name) if !casual => {
                manager.play_sequence_by_name(name, on_done, &mut services)
            }
            DialogueTarget::Name(name) => manager.play_named(name, on_done, true, &mut services),
            DialogueTarget::Area(area) => manager.play_area(area, on_done, casual, &mut services),
            DialogueTarget::Branch { sequence, outcome } => {
                manager.play_branch_named(sequence, *outcome, on_done, &mut services)
            }
        };

        if outcome != PlayOutcome::Started {
            debug!(target: "dialogue", "Play request {:?} ended with {:?}", request.target, outcome);
        }
    }
}

pub fn handle_area_moves(
    mut manager: ResMut<DialogueManager>,
    mut collaborators: DialogueCollaborators,
    mut moves: MessageReader<MoveToArea>,
) {
    for request in moves.read() {
        let mut services = collaborators.services();
        manager.move_to_area(request.index, &mut services);
    }
}

pub fn advance_dialogue(
    mut manager: ResMut<DialogueManager>,
    mut collaborators: DialogueCollaborators,
    mut inputs: MessageReader<AdvanceDialogue>,
) {
    for _ in inputs.read() {
        let mut services = collaborators.services();
        manager.advance(&mut services);
    }
}

pub fn tick_dialogue_reveal(
    time: Res<Time>,
    mut manager: ResMut<DialogueManager>,
    mut view: ResMut<DialogueView>,
) {
    if !manager.is_dialogue_active() {
        return;
    }
    manager.tick(time.delta(), &mut *view);
}

#[derive(SystemParam)]
pub struct DialogueOutputs<'w> {
    lines: MessageWriter<'w, DialogueLineShown>,
    completed: MessageWriter<'w, SequenceCompleted>,
    areas: MessageWriter<'w, AreaCompleted>,
    finished: MessageWriter<'w, DialogueFinished>,
    denied: MessageWriter<'w, DialogueDenied>,
}

/// Turns the manager's outbox into messages.
pub fn publish_dialogue_events(mut manager: ResMut<DialogueManager>, mut outputs: DialogueOutputs) {
    for event in manager.drain_events() {
        match event {
            DialogueEvent::LineShown(line) => {
                outputs.lines.write(DialogueLineShown { line });
            }
            DialogueEvent::SequenceCompleted { sequence } => {
                outputs.completed.write(SequenceCompleted { sequence });
            }
            DialogueEvent::AreaCompleted { area } => {
                outputs.areas.write(AreaCompleted { area });
            }
            DialogueEvent::Finished { ticket } => {
                outputs.finished.write(DialogueFinished { ticket });
            }
            DialogueEvent::Denied { sequence } => {
                outputs.denied.write(DialogueDenied { sequence });
            }
        }
    }
}

pub fn log_dialogue_catalog(manager: Res<DialogueManager>) {
    info!(
        target: "dialogue",
        "DialoguePlugin initialised with {} sequences; objective validation {}",
        manager.store().len(),
        if manager.settings().validate_objectives {
            "on"
        } else {
            "off"
        }
    );
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use bevy::ecs::message::Messages;

    use super::*;
    use crate::{
        characters::selection::SelectedCharacter,
        dialogue::{
            manager::{DialogueTicket, ManagerSettings},
            player::{DialoguePlayer, PlayerSettings},
            store::SequenceStore,
            types::{BranchOutcome, DialogueLine, DialogueSequence},
        },
    };

    fn collect<M: Message + Clone>(app: &App) -> Vec<M> {
        let messages = app.world().resource::<Messages<M>>();
        let mut cursor = messages.get_cursor();
        cursor.read(messages).cloned().collect()
    }

    fn app_with(sequences: Vec<DialogueSequence>, reveal: Duration) -> App {
        let mut store = SequenceStore::new();
        for sequence in sequences {
            store.register(sequence);
        }
        let player = DialoguePlayer::new(PlayerSettings {
            reveal_interval: reveal,
            ..PlayerSettings::default()
        });

        let mut app = App::new();
        app.insert_resource(DialogueManager::new(
            store,
            Some(player),
            ManagerSettings::default(),
        ))
        .insert_resource(DialogueView::default())
        .insert_resource(CharacterSelection::new(SelectedCharacter::Raline))
        .insert_resource(ObjectiveLock::default())
        .init_resource::<Time>()
        .add_message::<PlayDialogue>()
        .add_message::<AdvanceDialogue>()
        .add_message::<MoveToArea>()
        .add_message::<DialogueLineShown>()
        .add_message::<SequenceCompleted>()
        .add_message::<AreaCompleted>()
        .add_message::<DialogueFinished>()
        .add_message::<DialogueDenied>()
        .add_systems(
            Update,
            (
                handle_play_requests,
                handle_area_moves,
                advance_dialogue,
                tick_dialogue_reveal,
                publish_dialogue_events,
            )
                .chain(),
        );
        app
    }

    fn story() -> Vec<DialogueSequence> {
        vec![
            DialogueSequence::new(
                "Opening_Intro",
                "Opening",
                vec![
                    DialogueLine::new("", "Rain again."),
                    DialogueLine::new("[Player]", "Morning, [Supporting]."),
                ],
            )
            .with_next("Opening_Walk"),
            DialogueSequence::new(
                "Opening_Walk",
                "Opening_Walk",
                vec![DialogueLine::new("Gavi", "Let's go.")],
            ),
        ]
    }

    #[test]
    fn messages_drive_a_chain_to_completion() {
        let mut app = app_with(story(), Duration::ZERO);
        let ticket = DialogueTicket::new(1);

        app.world_mut()
            .write_message(PlayDialogue {
                ticket: Some(ticket),
                ..PlayDialogue::named("opening_intro")
            });
        app.update();

        let view = app.world().resource::<DialogueView>();
        assert!(view.visible);
        assert_eq!(view.speaker, "Narrator");
        assert_eq!(view.body, "Rain again.");

        app.world_mut().write_message(AdvanceDialogue);
        app.update();
        assert_eq!(app.world().resource::<DialogueView>().body, "Morning, Gavi.");

        app.world_mut().write_message(AdvanceDialogue);
        app.update();
        assert_eq!(app.world().resource::<DialogueView>().body, "Let's go.");
        assert!(collect::<AreaCompleted>(&app).is_empty());

        app.world_mut().write_message(AdvanceDialogue);
        app.update();

        let areas: Vec<_> = collect::<AreaCompleted>(&app)
            .into_iter()
            .map(|m| m.area)
            .collect();
        assert_eq!(areas, vec!["Opening".to_string()]);
        let finished: Vec<_> = collect::<DialogueFinished>(&app)
            .into_iter()
            .map(|m| m.ticket)
            .collect();
        assert_eq!(finished, vec![ticket]);
        assert!(!app.world().resource::<DialogueView>().visible);
        assert!(!app.world().resource::<DialogueManager>().is_dialogue_active());
    }

    #[test]
    fn locked_objective_denies_scripted_requests() {
        let mut app = app_with(story(), Duration::ZERO);
        app.world_mut()
            .resource_mut::<ObjectiveLock>()
            .start("GoToWarehouse", 1);

        app.world_mut()
            .write_message(PlayDialogue {
                target: DialogueTarget::Area("Opening".into()),
                casual: false,
                ticket: Some(DialogueTicket::new(3)),
            });
        app.update();

        assert!(!app.world().resource::<DialogueView>().visible);
        assert_eq!(collect::<DialogueDenied>(&app).len(), 1);
        assert_eq!(collect::<DialogueFinished>(&app).len(), 1);

        let chatter = Arc::new(DialogueSequence::new(
            "Chatter",
            "Opening",
            vec![DialogueLine::new("Jack", "Halo, apa kabar?")],
        ));
        app.world_mut().write_message(PlayDialogue::casual(chatter));
        app.update();
        assert_eq!(
            app.world().resource::<DialogueView>().body,
            "Halo, apa kabar?"
        );
    }

    #[test]
    fn unknown_names_still_finish_their_ticket() {
        let mut app = app_with(story(), Duration::ZERO);
        app.world_mut()
            .write_message(PlayDialogue {
                ticket: Some(DialogueTicket::new(9)),
                ..PlayDialogue::named("nonexistent")
            });
        app.update();

        let finished = collect::<DialogueFinished>(&app);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].ticket, DialogueTicket::new(9));
        assert!(!app.world().resource::<DialogueManager>().is_dialogue_active());
    }

    #[test]
    fn move_to_area_plays_the_area_sequence() {
        let mut app = app_with(story(), Duration::ZERO);
        app.world_mut().write_message(MoveToArea { index: 0 });
        app.update();

        let manager = app.world().resource::<DialogueManager>();
        assert!(manager.is_dialogue_active());
        assert_eq!(manager.current_area_index(), 0);
        let shown = collect::<DialogueLineShown>(&app);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].line.sequence, "Opening_Intro");
    }

    #[test]
    fn reveal_advances_with_frame_time() {
        let mut app = app_with(story(), Duration::from_millis(20));
        app.world_mut()
            .write_message(PlayDialogue::named("Opening_Walk"));
        app.update();
        assert_eq!(app.world().resource::<DialogueView>().body, "L");

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(40));
        app.update();
        assert_eq!(app.world().resource::<DialogueView>().body, "Let");

        app.world_mut().write_message(AdvanceDialogue);
        app.update();
        assert_eq!(app.world().resource::<DialogueView>().body, "Let's go.");
    }

    #[test]
    fn branch_results_play_past_a_locked_objective() {
        let mut sequences = story();
        sequences.push(
            DialogueSequence::new(
                "StudyRoom_Quiz",
                "StudyRoom",
                vec![DialogueLine::new("Pak Satya", "Ready?")],
            )
            .with_branches("StudyRoom_Win", "StudyRoom_Lose"),
        );
        sequences.push(DialogueSequence::new(
            "StudyRoom_Lose",
            "StudyRoom_Lose",
            vec![DialogueLine::new("Pak Satya", "Try again tomorrow.")],
        ));
        let mut app = app_with(sequences, Duration::ZERO);
        app.world_mut()
            .resource_mut::<ObjectiveLock>()
            .start("GoToWarehouse", 1);

        app.world_mut()
            .write_message(PlayDialogue::branch("StudyRoom_Quiz", BranchOutcome::Lose));
        app.update();

        assert!(collect::<DialogueDenied>(&app).is_empty());
        assert_eq!(
            app.world().resource::<DialogueView>().body,
            "Try again tomorrow."
        );
    }
}
