//! Backlog of displayed dialogue and outcomes, optionally mirrored to disk.
use std::{
    collections::VecDeque,
    fs::{create_dir_all, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use bevy::{log::warn, prelude::*};
use serde::Serialize;

use super::{
    classifier::SpeakerClass,
    events::{AreaCompleted, DialogueDenied, DialogueLineShown, SequenceCompleted},
    types::LineKind,
};

const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Rolling backlog the UI can page through.
#[derive(Resource, Debug)]
pub struct DialogueHistory {
    capacity: usize,
    records: VecDeque<DialogueHistoryRecord>,
}

impl DialogueHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: VecDeque::new(),
        }
    }

    pub fn push(&mut self, record: DialogueHistoryRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &DialogueHistoryRecord> {
        self.records.iter()
    }

    /// Displayed lines only, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &HistoryLine> {
        self.records.iter().filter_map(|record| match &record.entry {
            DialogueHistoryEntry::Line(line) => Some(line),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for DialogueHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogueHistoryRecord {
    pub occurred_at_seconds: f64,
    pub entry: DialogueHistoryEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLine {
    pub sequence: String,
    pub speaker: String,
    pub body: String,
    pub class: SpeakerClass,
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogueHistoryEntry {
    Line(HistoryLine),
    SequenceCompleted { sequence: String },
    AreaCompleted { area: String },
    Denied { sequence: String },
}

/// Records dialogue messages emitted this frame.
pub fn record_dialogue_history(
    time: Res<Time>,
    mut history: ResMut<DialogueHistory>,
    mut log: ResMut<DialogueHistoryLog>,
    mut lines: MessageReader<DialogueLineShown>,
    mut completed: MessageReader<SequenceCompleted>,
    mut areas: MessageReader<AreaCompleted>,
    mut denied: MessageReader<DialogueDenied>,
) {
    let now = time.elapsed_secs_f64();
    let mut record = |entry: DialogueHistoryEntry| {
        let record = DialogueHistoryRecord {
            occurred_at_seconds: now,
            entry,
        };
        log.push(&record);
        history.push(record);
    };

    for message in lines.read() {
        let line = &message.line;
        record(DialogueHistoryEntry::Line(HistoryLine {
            sequence: line.sequence.clone(),
            speaker: line.speaker.clone(),
            body: line.body.clone(),
            class: line.class,
            kind: line.kind,
        }));
    }

    for message in completed.read() {
        record(DialogueHistoryEntry::SequenceCompleted {
            sequence: message.sequence.clone(),
        });
    }

    for message in areas.read() {
        record(DialogueHistoryEntry::AreaCompleted {
            area: message.area.clone(),
        });
    }

    for message in denied.read() {
        record(DialogueHistoryEntry::Denied {
            sequence: message.sequence.clone(),
        });
    }
}

/// JSON-lines mirror of the history. A log without a path only discards.
#[derive(Resource, Debug, Default)]
pub struct DialogueHistoryLog {
    output_path: Option<PathBuf>,
    pending: Vec<DialogueHistoryRecord>,
}

impl DialogueHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: Some(path.into()),
            pending: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &DialogueHistoryRecord) {
        if self.output_path.is_some() {
            self.pending.push(record.clone());
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        let Some(path) = self.output_path.as_deref() else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        for record in std::mem::take(&mut self.pending) {
            let serialisable: SerializableHistoryRecord = record.into();
            serde_json::to_writer(&mut file, &serialisable)?;
            file.write_all(b"\n")?;
        }

        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Flushes pending history entries, warning when the write fails.
pub fn flush_dialogue_history_log(mut log: ResMut<DialogueHistoryLog>) {
    if let Err(err) = log.flush() {
        warn!(
            target: "dialogue",
            "Failed to persist dialogue history to {:?}: {}",
            log.path(),
            err
        );
    }
}

#[derive(Serialize)]
struct SerializableHistoryRecord {
    occurred_at_seconds: f64,
    event: SerializableHistoryEntry,
}

impl From<DialogueHistoryRecord> for SerializableHistoryRecord {
    fn from(value: DialogueHistoryRecord) -> Self {
        Self {
            occurred_at_seconds: value.occurred_at_seconds,
            event: value.entry.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
enum SerializableHistoryEntry {
    Line {
        sequence: String,
        speaker: String,
        body: String,
        class: String,
        kind: String,
    },
    SequenceCompleted {
        sequence: String,
    },
    AreaCompleted {
        area: String,
    },
    Denied {
        sequence: String,
    },
}

impl From<DialogueHistoryEntry> for SerializableHistoryEntry {
    fn from(value: DialogueHistoryEntry) -> Self {
        match value {
            DialogueHistoryEntry::Line(line) => Self::Line {
                sequence: line.sequence,
                speaker: line.speaker,
                body: line.body,
                class: line.class.to_string(),
                kind: line.kind.to_string(),
            },
            DialogueHistoryEntry::SequenceCompleted { sequence } => {
                Self::SequenceCompleted { sequence }
            }
            DialogueHistoryEntry::AreaCompleted { area } => Self::AreaCompleted { area },
            DialogueHistoryEntry::Denied { sequence } => Self::Denied { sequence },
        }
    }
}
