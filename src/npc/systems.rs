//! Systems turning NPC interactions into dialogue requests.
use std::{sync::Arc, time::Duration};

use bevy::prelude::*;

use crate::{
    characters::{
        plugin::{ResetCharacter, SelectCharacter},
        selection::CharacterSelection,
    },
    dialogue::{
        config::DialogueSettings,
        events::{DialogueTarget, PlayDialogue},
        manager::DialogueManager,
        providers::GeneratedLineProvider,
        types::{DialogueLine, DialogueSequence, GeneratedMode},
    },
    npc::{
        components::{AutoDialogue, DialogueTrigger, SmallTalk, TriggerHotkey, TriggerTarget},
        events::{ActivateTrigger, ResetSmallTalk},
        lines::NpcLinePools,
    },
};

const SMALL_TALK_PREFIX: &str = "Generated_";

pub fn load_npc_line_pools(mut commands: Commands, settings: Option<Res<DialogueSettings>>) {
    let pools = match settings {
        Some(settings) => NpcLinePools::load(&settings.generated),
        None => NpcLinePools::load(&Default::default()),
    };
    for name in pools.loaded_keys() {
        debug!(
            target: "dialogue",
            "  {}: {} lines{}",
            name,
            pools.line_count(&name),
            if pools.is_hybrid(&name) { " [hybrid]" } else { "" }
        );
    }
    commands.insert_resource(pools);
}

/// Spawns the demo cast: two chatty NPCs, two scripted triggers, and the
/// opening scene that starts by itself.
pub fn spawn_demo_npcs(mut commands: Commands) {
    commands.spawn((
        Name::new("Opening scene"),
        AutoDialogue::new("Opening_Intro", Duration::from_secs(1)),
    ));
    commands.spawn((
        Name::new("Jack"),
        SmallTalk::new("Jack", GeneratedMode::Random),
        TriggerHotkey(KeyCode::Digit1),
    ));
    commands.spawn((
        Name::new("Kanaya"),
        SmallTalk::new("Kanaya", GeneratedMode::Sequential),
        TriggerHotkey(KeyCode::Digit2),
    ));
    commands.spawn((
        Name::new("Front door"),
        DialogueTrigger::named("Home_Door").once(),
        TriggerHotkey(KeyCode::Digit3),
    ));
    commands.spawn((
        Name::new("Pak Satya"),
        DialogueTrigger::area("TownHall"),
        TriggerHotkey(KeyCode::Digit4),
    ));
}

/// A hotkey activates its entity; with Shift held it restarts the entity's
/// sequential small talk instead.
pub fn trigger_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    hotkeys: Query<(Entity, &TriggerHotkey, Option<&SmallTalk>)>,
    mut activations: MessageWriter<ActivateTrigger>,
    mut resets: MessageWriter<ResetSmallTalk>,
) {
    let shift = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    for (entity, hotkey, small_talk) in hotkeys.iter() {
        if !keys.just_pressed(hotkey.0) {
            continue;
        }
        match small_talk {
            Some(small_talk) if shift => {
                resets.write(ResetSmallTalk {
                    speaker: Some(small_talk.speaker.clone()),
                });
            }
            _ => {
                activations.write(ActivateTrigger { entity });
            }
        }
    }
}

/// Restarts sequential small talk, for one speaker or for everyone once the
/// main character changes.
pub fn reset_small_talk(
    mut resets: MessageReader<ResetSmallTalk>,
    mut picks: MessageReader<SelectCharacter>,
    mut forgets: MessageReader<ResetCharacter>,
    pools: Option<ResMut<NpcLinePools>>,
) {
    let Some(mut pools) = pools else {
        resets.clear();
        picks.clear();
        forgets.clear();
        return;
    };

    let character_changed = picks.read().count() + forgets.read().count() > 0;
    if character_changed {
        pools.reset_all_cursors();
    }
    for reset in resets.read() {
        match reset.speaker.as_deref() {
            Some(speaker) => {
                info!(target: "dialogue", "Small talk for {} restarts from the top", speaker);
                pools.reset_sequence_cursor(speaker);
            }
            None => pools.reset_all_cursors(),
        }
    }
}

/// Starts [`AutoDialogue`] sequences once their delay has run out.
pub fn run_auto_dialogue(
    time: Res<Time>,
    selection: Option<Res<CharacterSelection>>,
    mut autos: Query<(&mut AutoDialogue, Option<&Name>)>,
    mut plays: MessageWriter<PlayDialogue>,
) {
    let character_selected = selection
        .as_deref()
        .is_some_and(CharacterSelection::has_selected_character);

    for (mut auto, name) in autos.iter_mut() {
        if auto.has_fired() {
            continue;
        }
        if auto.tick(time.delta(), character_selected) {
            info!(
                target: "dialogue",
                "{} starts {}",
                name.map_or("Auto dialogue", Name::as_str),
                auto.sequence
            );
            plays.write(PlayDialogue::named(auto.sequence.clone()));
        }
    }
}

/// Converts activations into play requests, ignoring them while dialogue runs.
pub fn activate_dialogue_triggers(
    manager: Res<DialogueManager>,
    mut activations: MessageReader<ActivateTrigger>,
    mut triggers: Query<(Option<&mut DialogueTrigger>, Option<&SmallTalk>, Option<&Name>)>,
    mut plays: MessageWriter<PlayDialogue>,
) {
    for activation in activations.read() {
        let Ok((trigger, small_talk, name)) = triggers.get_mut(activation.entity) else {
            warn!(target: "dialogue", "Activated entity {:?} has no dialogue", activation.entity);
            continue;
        };
        let label = name.map_or_else(|| format!("{:?}", activation.entity), |name| name.to_string());

        if manager.is_dialogue_active() {
            debug!(target: "dialogue", "Another dialogue is active; ignoring {}", label);
            continue;
        }

        if let Some(mut trigger) = trigger {
            if !trigger.try_fire() {
                debug!(target: "dialogue", "{} dialogue already triggered", label);
                continue;
            }
            let target = match &trigger.target {
                TriggerTarget::Name(name) => DialogueTarget::Name(name.clone()),
                TriggerTarget::Area(area) => DialogueTarget::Area(area.clone()),
            };
            plays.write(PlayDialogue {
                target,
                casual: false,
                ticket: None,
            });
        } else if let Some(small_talk) = small_talk {
            plays.write(PlayDialogue::casual(small_talk_sequence(small_talk)));
        }
    }
}

/// One-line throwaway sequence pulling from the speaker's pool.
pub fn small_talk_sequence(small_talk: &SmallTalk) -> Arc<DialogueSequence> {
    let area = format!("{}{}", SMALL_TALK_PREFIX, small_talk.speaker.trim());
    Arc::new(DialogueSequence::new(
        area.clone(),
        area,
        vec![DialogueLine::generated(small_talk.speaker.clone(), small_talk.mode)],
    ))
}
