//! Sequence selection, objective gating, chaining, and continuations.
use std::{fmt, sync::Arc, time::Duration};

use bevy::{
    log::{debug, error, info, warn},
    prelude::Resource,
};

use super::{
    errors::DialogueError,
    player::{DialoguePlayer, DisplayedLine, PlayerState, SequenceComplete},
    providers::{DialogueServices, ObjectiveGate, PresentationSink},
    store::SequenceStore,
    types::{BranchOutcome, DialogueSequence},
};

const DEFAULT_CASUAL_PREFIXES: [&str; 2] = ["Generated_", "Casual_"];
const DEFAULT_AREAS: [&str; 5] = ["Opening", "Home", "TownHall", "StudyRoom", "Warehouse"];

/// Caller-supplied callback fired once a play request is over.
pub type Continuation = Box<dyn FnOnce() + Send + Sync>;

/// Identifier handed back through [`DialogueEvent::Finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogueTicket(u64);

impl DialogueTicket {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogueTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DLG-{:04}", self.0)
    }
}

/// What to do when a play request finishes, fails, or is denied.
pub enum OnDone {
    Callback(Continuation),
    /// Report through the event outbox instead of calling back.
    Notify(DialogueTicket),
}

impl OnDone {
    pub fn callback(callback: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self::Callback(Box::new(callback))
    }
}

impl fmt::Debug for OnDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => write!(f, "OnDone::Callback(..)"),
            Self::Notify(ticket) => write!(f, "OnDone::Notify({})", ticket),
        }
    }
}

/// Result of a play request as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    Denied,
    Failed(DialogueError),
}

/// Things that happened inside the manager, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    LineShown(DisplayedLine),
    /// A sequence played to the end; emitted before any chaining.
    SequenceCompleted { sequence: String },
    /// The last sequence of a chain finished.
    AreaCompleted { area: String },
    Finished { ticket: DialogueTicket },
    Denied { sequence: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    AwaitingGate,
    Playing,
    Chaining,
}

/// Policy knobs for the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerSettings {
    pub validate_objectives: bool,
    /// Area prefixes marking generated or casual sequences, matched ignoring case.
    pub casual_prefixes: Vec<String>,
    /// Area progression addressed by `move_to_area`.
    pub areas: Vec<String>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            validate_objectives: true,
            casual_prefixes: DEFAULT_CASUAL_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            areas: DEFAULT_AREAS.iter().map(|area| area.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct ChainState {
    head_area: String,
    bypass: bool,
}

/// Orchestrates dialogue playback on top of a [`DialoguePlayer`].
#[derive(Resource, Debug)]
pub struct DialogueManager {
    store: SequenceStore,
    player: Option<DialoguePlayer>,
    settings: ManagerSettings,
    pending: Option<OnDone>,
    chain: Option<ChainState>,
    state: ManagerState,
    current_area_index: usize,
    events: Vec<DialogueEvent>,
}

impl DialogueManager {
    pub fn new(store: SequenceStore, player: Option<DialoguePlayer>, settings: ManagerSettings) -> Self {
        if player.is_none() {
            error!(
                target: "dialogue",
                "DialogueManager built without a player; dialogue requests will complete immediately"
            );
        }

        Self {
            store,
            player,
            settings,
            pending: None,
            chain: None,
            state: ManagerState::Idle,
            current_area_index: 0,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    pub fn player(&self) -> Option<&DialoguePlayer> {
        self.player.as_ref()
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn current_area_index(&self) -> usize {
        self.current_area_index
    }

    pub fn is_dialogue_active(&self) -> bool {
        self.player.as_ref().is_some_and(DialoguePlayer::is_active)
    }

    pub fn player_state(&self) -> PlayerState {
        self.player
            .as_ref()
            .map_or(PlayerState::Idle, DialoguePlayer::state)
    }

    /// Plays `sequence`, gated by objectives unless `bypass_validation` is set.
    ///
    /// `on_done` always fires exactly once unless a later request replaces it
    /// while this one is still playing.
    pub fn play_sequence(
        &mut self,
        sequence: Option<Arc<DialogueSequence>>,
        on_done: Option<OnDone>,
        bypass_validation: bool,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        let Some(sequence) = sequence else {
            return self.fail(DialogueError::MissingSequence, on_done);
        };

        let head_area = sequence.area_or_name().to_string();
        self.begin(
            sequence,
            on_done,
            ChainState {
                head_area,
                bypass: bypass_validation,
            },
            services,
        )
    }

    pub fn play_sequence_by_name(
        &mut self,
        name: &str,
        on_done: Option<OnDone>,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        self.play_named(name, on_done, false, services)
    }

    pub fn play_sequence_by_area(
        &mut self,
        area: &str,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        self.play_area(area, None, false, services)
    }

    /// Name lookup with an explicit gating choice.
    pub fn play_named(
        &mut self,
        name: &str,
        on_done: Option<OnDone>,
        bypass_validation: bool,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        match self.store.find_by_name(name) {
            Some(sequence) => self.play_sequence(Some(sequence), on_done, bypass_validation, services),
            None => self.fail(DialogueError::sequence_not_found(name.trim()), on_done),
        }
    }

    /// Area lookup with a continuation and an explicit gating choice.
    pub fn play_area(
        &mut self,
        area: &str,
        on_done: Option<OnDone>,
        bypass_validation: bool,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        match self.store.find_by_area(area) {
            Some(sequence) => self.play_sequence(Some(sequence), on_done, bypass_validation, services),
            None => self.fail(DialogueError::area_not_found(area.trim()), on_done),
        }
    }

    /// Small talk that must never be blocked by story gating.
    pub fn play_casual_dialogue(
        &mut self,
        sequence: Option<Arc<DialogueSequence>>,
        on_done: Option<OnDone>,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        self.play_sequence(sequence, on_done, true, services)
    }

    /// Plays the win or lose follow-up of a branching sequence.
    pub fn play_branch(
        &mut self,
        sequence: &DialogueSequence,
        outcome: BranchOutcome,
        on_done: Option<OnDone>,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        match self.store.resolve_branch(sequence, outcome) {
            Some(branch) => self.play_sequence(Some(branch), on_done, true, services),
            None => self.fail(
                DialogueError::BranchMissing {
                    sequence: sequence.name.clone(),
                },
                on_done,
            ),
        }
    }

    /// Branch lookup through the name of the branching sequence.
    pub fn play_branch_named(
        &mut self,
        name: &str,
        outcome: BranchOutcome,
        on_done: Option<OnDone>,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        match self.store.find_by_name(name) {
            Some(sequence) => self.play_branch(&sequence, outcome, on_done, services),
            None => self.fail(DialogueError::sequence_not_found(name.trim()), on_done),
        }
    }

    /// Jumps to an entry of the configured area progression.
    pub fn move_to_area(&mut self, index: usize, services: &mut DialogueServices<'_>) -> PlayOutcome {
        let Some(area) = self.settings.areas.get(index).cloned() else {
            warn!(target: "dialogue", "No area configured at index {}", index);
            return PlayOutcome::Failed(DialogueError::area_not_found(index.to_string()));
        };
        self.current_area_index = index;
        self.play_sequence_by_area(&area, services)
    }

    /// Whether scripted `sequence` may start given the objective gate.
    pub fn can_play_scripted(
        &self,
        sequence: &Arc<DialogueSequence>,
        gate: Option<&dyn ObjectiveGate>,
    ) -> bool {
        let Some(gate) = gate else {
            return true;
        };
        if self.is_casual(sequence) {
            return true;
        }
        gate.can_progress_story()
    }

    /// Runtime-built sequences, reserved area prefixes, and single generated
    /// lines count as casual.
    pub fn is_casual(&self, sequence: &Arc<DialogueSequence>) -> bool {
        if !self.store.contains(sequence) {
            return true;
        }

        let area = sequence.area.trim().to_lowercase();
        if self
            .settings
            .casual_prefixes
            .iter()
            .map(|prefix| prefix.trim().to_lowercase())
            .any(|prefix| !prefix.is_empty() && area.starts_with(&prefix))
        {
            return true;
        }

        matches!(sequence.lines.as_slice(), [line] if line.use_generated_text)
    }

    /// Forwards an advance request to the player and handles completion.
    pub fn advance(&mut self, services: &mut DialogueServices<'_>) {
        let completed = match self.player.as_mut() {
            Some(player) => player.advance(services),
            None => return,
        };
        self.collect_shown();

        if let Some(completed) = completed {
            self.handle_completion(completed, services);
        }
    }

    pub fn tick(&mut self, delta: Duration, sink: &mut dyn PresentationSink) {
        if let Some(player) = self.player.as_mut() {
            player.tick(delta, sink);
        }
    }

    /// Cancels playback. The pending continuation fires so callers never hang.
    pub fn stop(&mut self, sink: &mut dyn PresentationSink) {
        if let Some(player) = self.player.as_mut() {
            player.stop(sink);
        }
        self.chain = None;
        self.state = ManagerState::Idle;
        let pending = self.pending.take();
        self.fire(pending);
    }

    pub fn drain_events(&mut self) -> Vec<DialogueEvent> {
        std::mem::take(&mut self.events)
    }

    fn begin(
        &mut self,
        sequence: Arc<DialogueSequence>,
        on_done: Option<OnDone>,
        chain: ChainState,
        services: &mut DialogueServices<'_>,
    ) -> PlayOutcome {
        if self.player.is_none() {
            return self.fail(DialogueError::PlayerUnavailable, on_done);
        }

        if !chain.bypass && self.settings.validate_objectives {
            let previous = self.state;
            self.state = ManagerState::AwaitingGate;
            if !self.can_play_scripted(&sequence, services.gate) {
                warn!(
                    target: "dialogue",
                    "Scripted sequence '{}' blocked until the current objective is done",
                    sequence.name
                );
                self.events.push(DialogueEvent::Denied {
                    sequence: sequence.name.clone(),
                });
                // A denial leaves the running sequence and its chain untouched.
                if self.is_dialogue_active() {
                    self.state = previous;
                } else {
                    self.state = ManagerState::Idle;
                    self.chain = None;
                }
                self.fire(on_done);
                return PlayOutcome::Denied;
            }
        }

        if self.pending.is_some() && on_done.is_some() {
            debug!(
                target: "dialogue",
                "Replacing pending continuation with the one for '{}'",
                sequence.name
            );
        }
        self.pending = on_done;
        self.chain = Some(chain);

        let result = match self.player.as_mut() {
            Some(player) => player.play_sequence(Arc::clone(&sequence), services),
            None => Err(DialogueError::PlayerUnavailable),
        };
        self.collect_shown();

        match result {
            Ok(()) => {
                self.state = ManagerState::Playing;
                PlayOutcome::Started
            }
            // The player has already logged the data error.
            Err(err) => {
                self.chain = None;
                self.state = ManagerState::Idle;
                let pending = self.pending.take();
                self.fire(pending);
                PlayOutcome::Failed(err)
            }
        }
    }

    fn handle_completion(&mut self, completed: SequenceComplete, services: &mut DialogueServices<'_>) {
        let sequence = completed.sequence;
        self.events.push(DialogueEvent::SequenceCompleted {
            sequence: sequence.name.clone(),
        });

        let chain = self.chain.take().unwrap_or_else(|| ChainState {
            head_area: sequence.area_or_name().to_string(),
            bypass: false,
        });

        if let Some(next) = self.store.resolve_next(&sequence) {
            info!(target: "dialogue", "Auto-playing next sequence: {}", next.name);
            self.state = ManagerState::Chaining;
            let pending = self.pending.take();
            self.begin(next, pending, chain, services);
            return;
        }

        if let Some(missing) = sequence.next_name() {
            warn!(
                target: "dialogue",
                "Next sequence '{}' of '{}' is not registered; ending the chain",
                missing,
                sequence.name
            );
        }

        info!(target: "dialogue", "Area {} completed", chain.head_area);
        self.events.push(DialogueEvent::AreaCompleted {
            area: chain.head_area,
        });
        self.state = ManagerState::Idle;
        let pending = self.pending.take();
        self.fire(pending);
    }

    fn fail(&mut self, err: DialogueError, on_done: Option<OnDone>) -> PlayOutcome {
        if err.is_resolution() {
            warn!(target: "dialogue", "{}", err);
        } else {
            error!(target: "dialogue", "{}", err);
        }
        if !self.is_dialogue_active() {
            self.state = ManagerState::Idle;
        }
        self.fire(on_done);
        PlayOutcome::Failed(err)
    }

    fn fire(&mut self, on_done: Option<OnDone>) {
        match on_done {
            Some(OnDone::Callback(callback)) => callback(),
            Some(OnDone::Notify(ticket)) => self.events.push(DialogueEvent::Finished { ticket }),
            None => {}
        }
    }

    fn collect_shown(&mut self) {
        if let Some(player) = self.player.as_mut() {
            self.events
                .extend(player.drain_shown().into_iter().map(DialogueEvent::LineShown));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dialogue::{
        player::PlayerSettings,
        providers::IdentityProvider,
        types::{DialogueLine, GeneratedMode},
        view::DialogueView,
    };

    struct Gate {
        open: bool,
    }

    impl ObjectiveGate for Gate {
        fn can_progress_story(&self) -> bool {
            self.open
        }
    }

    struct Selected;

    impl IdentityProvider for Selected {
        fn player_name(&self) -> String {
            "Raline".into()
        }

        fn supporting_name(&self) -> String {
            "Gavi".into()
        }

        fn is_narrator_token(&self, _raw_speaker: &str) -> bool {
            false
        }
    }

    struct Harness {
        view: DialogueView,
        gate: Option<Gate>,
    }

    impl Harness {
        fn open() -> Self {
            Self {
                view: DialogueView::default(),
                gate: None,
            }
        }

        fn gated(open: bool) -> Self {
            Self {
                view: DialogueView::default(),
                gate: Some(Gate { open }),
            }
        }

        fn services(&mut self) -> DialogueServices<'_> {
            DialogueServices {
                identity: Some(&Selected as &dyn IdentityProvider),
                lines: None,
                gate: self.gate.as_ref().map(|gate| gate as &dyn ObjectiveGate),
                sink: &mut self.view,
            }
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> OnDone) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        let make = move || {
            let count = Arc::clone(&handle);
            OnDone::callback(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    fn line(text: &str) -> DialogueLine {
        DialogueLine::new("Gavi", text)
    }

    fn manager_with(sequences: Vec<DialogueSequence>) -> DialogueManager {
        let mut store = SequenceStore::new();
        for sequence in sequences {
            store.register(sequence);
        }
        let player = DialoguePlayer::new(PlayerSettings {
            reveal_interval: Duration::ZERO,
            ..PlayerSettings::default()
        });
        DialogueManager::new(store, Some(player), ManagerSettings::default())
    }

    fn play_to_end(manager: &mut DialogueManager, harness: &mut Harness) {
        for _ in 0..64 {
            if !manager.is_dialogue_active() {
                return;
            }
            manager.advance(&mut harness.services());
        }
        panic!("dialogue never finished");
    }

    fn area_events(events: &[DialogueEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                DialogueEvent::AreaCompleted { area } => Some(area.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn missing_sequence_fires_continuation_once() {
        let mut manager = manager_with(Vec::new());
        let mut harness = Harness::open();
        let (count, on_done) = counter();

        let outcome = manager.play_sequence(None, Some(on_done()), false, &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Failed(DialogueError::MissingSequence));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let outcome = manager.play_sequence_by_name("nonexistent", Some(on_done()), &mut harness.services());
        assert!(matches!(
            outcome,
            PlayOutcome::Failed(DialogueError::SequenceNotFound { .. })
        ));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!manager.is_dialogue_active());
        assert_eq!(manager.player_state(), PlayerState::Idle);
    }

    #[test]
    fn missing_player_degrades_to_immediate_continuation() {
        let mut store = SequenceStore::new();
        store.register(DialogueSequence::new("Intro", "Opening", vec![line("Hi")]));
        let mut manager = DialogueManager::new(store, None, ManagerSettings::default());
        let mut harness = Harness::open();
        let (count, on_done) = counter();

        let outcome = manager.play_sequence_by_name("Intro", Some(on_done()), &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Failed(DialogueError::PlayerUnavailable));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!manager.is_dialogue_active());
    }

    #[test]
    fn denied_scripted_sequence_never_reaches_the_player() {
        let mut manager = manager_with(vec![DialogueSequence::new(
            "TownHall_Mayor",
            "TownHall",
            vec![line("Welcome."), line("Sit down.")],
        )]);
        let mut harness = Harness::gated(false);
        let (count, on_done) = counter();
        let scripted = manager.store().find_by_name("TownHall_Mayor");

        let outcome = manager.play_sequence(scripted, Some(on_done()), false, &mut harness.services());

        assert_eq!(outcome, PlayOutcome::Denied);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.player_state(), PlayerState::Idle);
        assert!(manager.player().and_then(|p| p.current_sequence()).is_none());
        assert!(!harness.view.visible);
        assert_eq!(
            manager.drain_events(),
            vec![DialogueEvent::Denied {
                sequence: "TownHall_Mayor".into()
            }]
        );
    }

    #[test]
    fn casual_dialogue_bypasses_denial() {
        let mut manager = manager_with(vec![DialogueSequence::new(
            "TownHall_Mayor",
            "TownHall",
            vec![line("Welcome.")],
        )]);
        let mut harness = Harness::gated(false);
        let (count, on_done) = counter();
        let scripted = manager.store().find_by_name("TownHall_Mayor");

        let outcome = manager.play_casual_dialogue(scripted, Some(on_done()), &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Started);
        assert!(manager.is_dialogue_active());
        assert_eq!(harness.view.body, "Welcome.");
        assert_eq!(count.load(Ordering::SeqCst), 0);

        play_to_end(&mut manager, &mut harness);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validation_can_be_disabled() {
        let mut manager = manager_with(vec![DialogueSequence::new(
            "Home_Door",
            "Home",
            vec![line("Knock.")],
        )]);
        manager.settings.validate_objectives = false;
        let mut harness = Harness::gated(false);

        let outcome = manager.play_sequence_by_name("home_door", None, &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Started);
    }

    #[test]
    fn casual_heuristics() {
        let manager = manager_with(vec![
            DialogueSequence::new("Scripted", "Warehouse", vec![line("a"), line("b")]),
            DialogueSequence::new("Chatter", "casual_market", vec![line("a")]),
            DialogueSequence::new("Gen", "Generated_Park", vec![line("a")]),
            DialogueSequence::new(
                "OneLiner",
                "Home",
                vec![DialogueLine::generated("Jack", GeneratedMode::Random)],
            ),
        ]);
        let store = manager.store();
        let find = |name: &str| store.find_by_name(name).expect("registered");

        assert!(!manager.is_casual(&find("Scripted")));
        assert!(manager.is_casual(&find("Chatter")));
        assert!(manager.is_casual(&find("Gen")));
        assert!(manager.is_casual(&find("OneLiner")));

        let temporary = Arc::new(DialogueSequence::new("Temp", "Warehouse", vec![line("x")]));
        assert!(manager.is_casual(&temporary));

        let closed = Gate { open: false };
        assert!(!manager.can_play_scripted(&find("Scripted"), Some(&closed)));
        assert!(manager.can_play_scripted(&find("Scripted"), None));
        assert!(manager.can_play_scripted(&temporary, Some(&closed)));
    }

    #[test]
    fn chains_to_next_and_reports_area_once() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("A", "Opening", vec![line("first"), line("second")]).with_next("B"),
            DialogueSequence::new("B", "Opening_Part2", vec![line("third")]),
        ]);
        let mut harness = Harness::open();
        let (count, on_done) = counter();

        manager.play_sequence_by_name("A", Some(on_done()), &mut harness.services());
        manager.advance(&mut harness.services());
        manager.advance(&mut harness.services());

        let events = manager.drain_events();
        assert!(events.contains(&DialogueEvent::SequenceCompleted {
            sequence: "A".into()
        }));
        assert!(area_events(&events).is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(
            manager
                .player()
                .and_then(|p| p.current_sequence())
                .map(|s| s.name.clone()),
            Some("B".into())
        );
        assert_eq!(harness.view.body, "third");

        manager.advance(&mut harness.services());
        let events = manager.drain_events();
        assert_eq!(area_events(&events), vec!["Opening".to_string()]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), ManagerState::Idle);
    }

    #[test]
    fn chain_into_denied_sequence_still_fires_continuation() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("Chat", "Casual_Home", vec![line("hey")]).with_next("Plot"),
            DialogueSequence::new("Plot", "Warehouse", vec![line("the plot")]),
        ]);
        let mut harness = Harness::gated(false);
        let (count, on_done) = counter();

        let outcome = manager.play_sequence_by_name("Chat", Some(on_done()), &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Started);
        manager.advance(&mut harness.services());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!manager.is_dialogue_active());
        let events = manager.drain_events();
        assert!(events.contains(&DialogueEvent::Denied {
            sequence: "Plot".into()
        }));
        assert!(area_events(&events).is_empty());
    }

    #[test]
    fn denial_during_a_chain_keeps_the_running_chain() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("A", "Opening", vec![line("first")]).with_next("B"),
            DialogueSequence::new("B", "Opening_Part2", vec![line("second")]),
            DialogueSequence::new("Plot", "Warehouse", vec![line("the plot")]),
        ]);
        let mut harness = Harness::gated(false);
        let (count, on_done) = counter();
        let head = manager.store().find_by_name("A");

        let outcome = manager.play_casual_dialogue(head, Some(on_done()), &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Started);
        manager.advance(&mut harness.services());
        assert_eq!(harness.view.body, "second");

        let (denied, denied_done) = counter();
        let outcome = manager.play_sequence_by_name("Plot", Some(denied_done()), &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Denied);
        assert_eq!(denied.load(Ordering::SeqCst), 1);
        assert!(manager.is_dialogue_active());
        assert_eq!(manager.state(), ManagerState::Playing);
        assert_eq!(harness.view.body, "second");
        assert_eq!(count.load(Ordering::SeqCst), 0);

        manager.advance(&mut harness.services());
        let events = manager.drain_events();
        assert_eq!(area_events(&events), vec!["Opening".to_string()]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), ManagerState::Idle);
    }

    #[test]
    fn denial_during_casual_playback_keeps_its_bypass() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("Chat", "Home", vec![line("hey")]).with_next("Story"),
            DialogueSequence::new("Story", "Warehouse", vec![line("the story")]),
            DialogueSequence::new("Plot", "TownHall", vec![line("the plot")]),
        ]);
        let mut harness = Harness::gated(false);
        let chat = manager.store().find_by_name("Chat");

        manager.play_casual_dialogue(chat, None, &mut harness.services());
        let outcome = manager.play_sequence_by_name("Plot", None, &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Denied);

        manager.advance(&mut harness.services());
        assert!(manager.is_dialogue_active());
        assert_eq!(harness.view.body, "the story");

        let events = manager.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, DialogueEvent::Denied { .. }))
                .collect::<Vec<_>>(),
            vec![&DialogueEvent::Denied {
                sequence: "Plot".into()
            }]
        );
    }

    #[test]
    fn new_request_overwrites_pending_continuation() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("First", "Home", vec![line("one")]),
            DialogueSequence::new("Second", "Home_2", vec![line("two")]),
        ]);
        let mut harness = Harness::open();
        let (first, first_done) = counter();
        let (second, second_done) = counter();

        manager.play_sequence_by_name("First", Some(first_done()), &mut harness.services());
        manager.play_sequence_by_name("Second", Some(second_done()), &mut harness.services());
        play_to_end(&mut manager, &mut harness);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_sequence_fires_continuation_without_playing() {
        let mut manager = manager_with(vec![DialogueSequence::new("Empty", "Home", Vec::new())]);
        let mut harness = Harness::open();
        let (count, on_done) = counter();

        let outcome = manager.play_sequence_by_name("Empty", Some(on_done()), &mut harness.services());
        assert_eq!(
            outcome,
            PlayOutcome::Failed(DialogueError::empty_sequence("Empty"))
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), ManagerState::Idle);
    }

    #[test]
    fn area_lookup_and_progression() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("Home_Intro", "Home", vec![line("home")]),
            DialogueSequence::new("Home_Again", "Home", vec![line("again")]),
        ]);
        let mut harness = Harness::open();

        assert!(matches!(
            manager.play_sequence_by_area("Rooftop", &mut harness.services()),
            PlayOutcome::Failed(DialogueError::AreaNotFound { .. })
        ));

        assert_eq!(
            manager.move_to_area(1, &mut harness.services()),
            PlayOutcome::Started
        );
        assert_eq!(manager.current_area_index(), 1);
        assert_eq!(harness.view.body, "home");

        assert!(matches!(
            manager.move_to_area(42, &mut harness.services()),
            PlayOutcome::Failed(_)
        ));
    }

    #[test]
    fn branch_results_play_win_or_lose() {
        let mut manager = manager_with(vec![
            DialogueSequence::new("Quiz", "StudyRoom", vec![line("Ready?")])
                .with_branches("Quiz_Win", "Quiz_Lose"),
            DialogueSequence::new("Quiz_Win", "StudyRoom_Result", vec![line("Well done.")]),
            DialogueSequence::new("Quiz_Lose", "StudyRoom_Result", vec![line("Try again.")]),
        ]);
        let mut harness = Harness::gated(false);
        let quiz = manager.store().find_by_name("Quiz").expect("registered");

        let outcome = manager.play_branch(&quiz, BranchOutcome::Lose, None, &mut harness.services());
        assert_eq!(outcome, PlayOutcome::Started);
        assert_eq!(harness.view.body, "Try again.");

        let plain = DialogueSequence::new("Plain", "Home", vec![line("x")]);
        let (count, on_done) = counter();
        let outcome = manager.play_branch(&plain, BranchOutcome::Win, Some(on_done()), &mut harness.services());
        assert!(matches!(
            outcome,
            PlayOutcome::Failed(DialogueError::BranchMissing { .. })
        ));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ticket_continuations_surface_as_events() {
        let mut manager = manager_with(vec![DialogueSequence::new(
            "Intro",
            "Opening",
            vec![line("Hello [Player].")],
        )]);
        let mut harness = Harness::open();
        let ticket = DialogueTicket::new(7);

        manager.play_sequence_by_name("Intro", Some(OnDone::Notify(ticket)), &mut harness.services());
        play_to_end(&mut manager, &mut harness);

        let events = manager.drain_events();
        let shown: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                DialogueEvent::LineShown(line) => Some(line.body.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec!["Hello Raline.".to_string()]);
        assert_eq!(
            events.last(),
            Some(&DialogueEvent::Finished { ticket })
        );
    }

    #[test]
    fn stop_fires_pending_continuation() {
        let mut manager = manager_with(vec![DialogueSequence::new(
            "Long",
            "Home",
            vec![line("one"), line("two")],
        )]);
        let mut harness = Harness::open();
        let (count, on_done) = counter();

        manager.play_sequence_by_name("Long", Some(on_done()), &mut harness.services());
        manager.stop(&mut harness.view);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!manager.is_dialogue_active());
        assert!(!harness.view.visible);
    }
}
